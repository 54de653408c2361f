// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WebSocket transport.
//!
//! Each accepted socket gets a [`ConnectionId`], a reader loop that applies
//! inbound events one at a time in arrival order, and a writer task that
//! drains the connection's bounded outbound queue. When the reader loop ends
//! the connection is unregistered and the writer gets a short grace period to
//! flush what is already queued.
//!
//! CORS does not apply to WebSocket upgrades, so when `CLIENT_URL` is set the
//! `Origin` header is checked here. Requests without an `Origin` header
//! (non-browser clients) are accepted.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap},
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::RelayConfig,
    error::ApiError,
    models::ConnectionId,
    relay::{ClientEvent, ConnectionHandle, ServerEvent},
    state::{AppState, ConnectionSlot},
};

/// Upgrade to the relay event protocol.
///
/// See the `relay::protocol` module for the frame format.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "Relay",
    responses(
        (status = 101, description = "Switching to the WebSocket event protocol"),
        (status = 403, description = "Origin not allowed"),
        (status = 503, description = "Connection limit reached")
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if !origin_allowed(&state.config, &headers) {
        warn!(origin = ?headers.get(ORIGIN), "Rejecting connection: origin not allowed");
        return Err(ApiError::forbidden("origin not allowed"));
    }

    if state.shutdown.is_cancelled() {
        return Err(ApiError::service_unavailable("relay is shutting down"));
    }

    let Some(slot) = state.connections.try_acquire() else {
        warn!(
            max_connections = state.connections.max(),
            "Rejecting connection: limit reached"
        );
        return Err(ApiError::service_unavailable("connection limit reached"));
    };

    Ok(ws.on_upgrade(move |socket| serve_connection(socket, state, slot)))
}

/// How long a closing connection's writer may keep flushing queued events.
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

fn origin_allowed(config: &RelayConfig, headers: &HeaderMap) -> bool {
    match (&config.allowed_origin, headers.get(ORIGIN)) {
        (Some(allowed), Some(origin)) => origin == allowed,
        _ => true,
    }
}

async fn serve_connection(socket: WebSocket, state: AppState, _slot: ConnectionSlot) {
    let connection_id = ConnectionId::new();
    let (sink, mut stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<ServerEvent>(state.config.outbound_queue);
    let handle = ConnectionHandle::new(connection_id, outbound_tx);

    info!(connection_id = %connection_id, "User connected");

    let mut writer = tokio::spawn(write_events(connection_id, outbound_rx, sink));

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = state.shutdown.cancelled() => break,
        };

        match frame {
            Some(Ok(Message::Text(text))) => match ClientEvent::parse(text.as_str()) {
                Ok(event) => state.relay.handle_event(&handle, event).await,
                Err(err) => warn!(
                    connection_id = %connection_id,
                    error = %err,
                    "Dropping malformed event"
                ),
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!(connection_id = %connection_id, error = %err, "Socket error");
                break;
            }
        }
    }

    // Once the registry entry and this handle are gone the queue closes and
    // the writer ends after draining it.
    state.relay.unregister(connection_id).await;
    drop(handle);
    if tokio::time::timeout(WRITER_FLUSH_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        debug!(connection_id = %connection_id, "Writer did not flush in time");
        writer.abort();
    }

    info!(connection_id = %connection_id, "User disconnected");
}

/// Encode queued events as text frames until the queue closes or the sink
/// fails, then close the sink.
async fn write_events<S>(
    connection_id: ConnectionId,
    mut outbound: mpsc::Receiver<ServerEvent>,
    mut sink: S,
) where
    S: Sink<Message> + Unpin,
{
    while let Some(event) = outbound.recv().await {
        let frame = match serde_json::to_string(&event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(connection_id = %connection_id, error = %err, "Failed to encode event");
                continue;
            }
        };
        if sink.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = sink.close().await;
}
