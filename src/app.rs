//! HTTP application assembly: routes, CORS and request tracing.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::{header::AUTHORIZATION, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{tracking_router, RealtimeHub, TrackingState};
use crate::config::{ServerConfig, ValidationError};

/// CORS policy for the upgrade and health endpoints.
pub fn cors_layer(server: &ServerConfig) -> Result<CorsLayer, ValidationError> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    match server.allowed_origin() {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|_| ValidationError::InvalidCorsOrigin(origin.to_string()))?;
            Ok(cors.allow_origin(origin))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

/// Builds the full router around a hub.
pub fn build_app(hub: Arc<RealtimeHub>, server: &ServerConfig) -> Result<Router, ValidationError> {
    Ok(tracking_router()
        .layer(cors_layer(server)?)
        .layer(TraceLayer::new_for_http())
        .with_state(TrackingState::new(hub)))
}
