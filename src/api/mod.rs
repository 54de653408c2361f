// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::RelayConfig, models::RelayStats, state::AppState};

pub mod health;
pub mod socket;
pub mod stats;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let routes = Router::new()
        .route("/ws", get(socket::connect))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/v1/relay/stats", get(stats::relay_stats))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// CORS for the web client: only `CLIENT_URL` when configured, otherwise
/// permissive.
fn cors_layer(config: &RelayConfig) -> CorsLayer {
    match &config.allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods([Method::GET, Method::POST]),
        None => CorsLayer::permissive(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        socket::connect,
        health::health,
        health::liveness,
        health::readiness,
        stats::relay_stats
    ),
    components(
        schemas(
            RelayStats,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Relay", description = "Friendship-gated message relay"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
