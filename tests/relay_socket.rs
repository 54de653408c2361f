// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end tests over a real listener and WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use friendgate_relay::{api::router, config::RelayConfig, models::Identity, state::AppState};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::ORIGIN, HeaderValue},
        Error as WsError, Message,
    },
    MaybeTlsStream, WebSocketStream,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_relay(config: RelayConfig) -> (SocketAddr, AppState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(config);
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

async fn emit(client: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    client.send(Message::Text(frame.into())).await.unwrap();
}

async fn next_event(client: &mut Client) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out waiting for event")
        .expect("socket closed")
        .unwrap();
    serde_json::from_str(frame.to_text().unwrap()).unwrap()
}

async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

/// Poll until the relay has applied the expected registrations and pushes.
async fn wait_for(state: &AppState, registered: usize, mirrors: usize) {
    for _ in 0..100 {
        if state.relay.registered_count().await == registered
            && state.relay.mirror_count().await == mirrors
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("relay never reached {registered} registrations / {mirrors} mirrors");
}

async fn wait_for_live(state: &AppState, live: usize) {
    for _ in 0..100 {
        if state.connections.live() == live {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("relay never reached {live} live connections");
}

async fn join(client: &mut Client, me: &str, friends: &[&str]) {
    emit(client, "registerUser", json!(me)).await;
    emit(
        client,
        "updateFriendsList",
        json!({ "userAddress": me, "friends": friends }),
    )
    .await;
}

#[tokio::test]
async fn mutual_friends_exchange_messages() {
    let (addr, state) = spawn_relay(RelayConfig::default()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    join(&mut alice, "0xAAA", &["0xBBB"]).await;
    join(&mut bob, "0xbbb", &["0xaaa"]).await;
    wait_for(&state, 2, 2).await;

    let payload = json!({ "sender": "0xAAA", "receiver": "0xBBB", "content": "gm" });
    emit(&mut alice, "sendMessage", payload.clone()).await;

    let expected = json!({ "event": "privateMessage", "data": payload });
    assert_eq!(next_event(&mut bob).await, expected);
    assert_eq!(next_event(&mut alice).await, expected);

    let reply = json!({ "sender": "0xbbb", "receiver": "0xaaa", "content": "gm back" });
    emit(&mut bob, "sendMessage", reply.clone()).await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({ "event": "privateMessage", "data": reply })
    );
}

#[tokio::test]
async fn one_sided_friendship_delivers_nothing() {
    let (addr, state) = spawn_relay(RelayConfig::default()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    join(&mut alice, "0xaaa", &["0xbbb"]).await;
    join(&mut bob, "0xbbb", &[]).await;
    wait_for(&state, 2, 2).await;

    emit(
        &mut alice,
        "sendMessage",
        json!({ "sender": "0xaaa", "receiver": "0xbbb", "content": "hi" }),
    )
    .await;

    assert_silent(&mut bob).await;
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn blocked_sender_gets_notice_when_enabled() {
    let (addr, state) = spawn_relay(RelayConfig {
        notify_blocked: true,
        ..RelayConfig::default()
    })
    .await;
    let mut alice = connect(addr).await;
    emit(&mut alice, "registerUser", json!("0xaaa")).await;
    wait_for(&state, 1, 0).await;

    emit(
        &mut alice,
        "sendMessage",
        json!({ "sender": "0xaaa", "receiver": "0xBBB", "content": "hi" }),
    )
    .await;

    assert_eq!(
        next_event(&mut alice).await,
        json!({
            "event": "messageBlocked",
            "data": { "receiver": "0xbbb", "reason": "unknown_friend_state" }
        })
    );
}

#[tokio::test]
async fn malformed_frames_keep_connection_open() {
    let (addr, state) = spawn_relay(RelayConfig::default()).await;
    let mut alice = connect(addr).await;

    alice
        .send(Message::Text("this is not json".to_string().into()))
        .await
        .unwrap();
    emit(&mut alice, "sendMessage", json!({ "sender": "0xaaa" })).await;
    emit(&mut alice, "joinRoom", json!({})).await;

    join(&mut alice, "0xaaa", &["0xaaa"]).await;
    wait_for(&state, 1, 1).await;

    let payload = json!({ "sender": "0xaaa", "receiver": "0xaaa", "content": "echo" });
    emit(&mut alice, "sendMessage", payload.clone()).await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({ "event": "privateMessage", "data": payload })
    );
}

#[tokio::test]
async fn stale_disconnect_keeps_newer_connection() {
    let (addr, state) = spawn_relay(RelayConfig::default()).await;
    let mut first = connect(addr).await;
    emit(&mut first, "registerUser", json!("0xaaa")).await;
    wait_for(&state, 1, 0).await;

    let mut second = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut second, "0xaaa", &["0xbbb"]).await;
    join(&mut bob, "0xbbb", &["0xaaa"]).await;
    wait_for(&state, 2, 2).await;
    wait_for_live(&state, 3).await;

    first.close(None).await.unwrap();
    wait_for_live(&state, 2).await;

    let alice = Identity::parse("0xaaa").unwrap();
    assert!(state.relay.lookup(&alice).await.is_some());

    let payload = json!({ "sender": "0xbbb", "receiver": "0xaaa", "content": "still there?" });
    emit(&mut bob, "sendMessage", payload.clone()).await;
    assert_eq!(
        next_event(&mut second).await,
        json!({ "event": "privateMessage", "data": payload })
    );
}

#[tokio::test]
async fn disconnect_unregisters_identity() {
    let (addr, state) = spawn_relay(RelayConfig::default()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "0xaaa", &["0xbbb"]).await;
    join(&mut bob, "0xbbb", &["0xaaa"]).await;
    wait_for(&state, 2, 2).await;

    bob.close(None).await.unwrap();
    wait_for(&state, 1, 2).await;

    let bob_id = Identity::parse("0xbbb").unwrap();
    assert!(state.relay.lookup(&bob_id).await.is_none());
    let alice_id = Identity::parse("0xaaa").unwrap();
    assert!(state.relay.lookup(&alice_id).await.is_some());
}

#[tokio::test]
async fn connections_beyond_cap_are_refused() {
    let (addr, state) = spawn_relay(RelayConfig {
        max_connections: 1,
        ..RelayConfig::default()
    })
    .await;
    let _first = connect(addr).await;
    wait_for_live(&state, 1).await;

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 503),
        Err(other) => panic!("expected HTTP 503, got {other}"),
        Ok(_) => panic!("expected HTTP 503, connection was accepted"),
    }
}

#[tokio::test]
async fn upgrade_from_foreign_origin_is_refused() {
    let (addr, state) = spawn_relay(RelayConfig {
        allowed_origin: Some(axum::http::HeaderValue::from_static("http://localhost:5173")),
        ..RelayConfig::default()
    })
    .await;

    let mut foreign = format!("ws://{addr}/ws").into_client_request().unwrap();
    foreign
        .headers_mut()
        .insert(ORIGIN, HeaderValue::from_static("http://evil.example"));
    match connect_async(foreign).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        Err(other) => panic!("expected HTTP 403, got {other}"),
        Ok(_) => panic!("expected HTTP 403, connection was accepted"),
    }

    let mut client = format!("ws://{addr}/ws").into_client_request().unwrap();
    client
        .headers_mut()
        .insert(ORIGIN, HeaderValue::from_static("http://localhost:5173"));
    let (mut alice, _) = connect_async(client).await.unwrap();
    join(&mut alice, "0xaaa", &[]).await;
    wait_for(&state, 1, 1).await;
}
