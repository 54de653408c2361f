// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay occupancy endpoint.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{models::RelayStats, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/relay/stats",
    tag = "Relay",
    responses((status = 200, body = RelayStats))
)]
pub async fn relay_stats(State(state): State<AppState>) -> Json<RelayStats> {
    Json(RelayStats {
        registered_identities: state.relay.registered_count().await,
        friend_mirrors: state.relay.mirror_count().await,
        live_connections: state.connections.live(),
        max_connections: state.connections.max(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}
