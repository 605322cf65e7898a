//! WebSocket upgrade handler for the tracking namespaces.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Resolve the namespace from the path (unknown → 404, no upgrade)
//! 2. Upgrade, then authenticate the handshake token
//! 3. On failure send `auth_error` and close
//! 4. Register with the hub and pump frames until either side stops
//! 5. Disconnect from the hub

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use crate::domain::foundation::ConnectionId;
use crate::domain::tracking::{ErrorPayload, Namespace, OutboundEvent};

use super::hub::RealtimeHub;
use super::messages::{encode_event, OutboundFrame};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct TrackingState {
    pub hub: Arc<RealtimeHub>,
}

impl TrackingState {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// Picks the handshake credential: `?token=` wins over `Authorization: Bearer`.
pub fn extract_token(params: &ConnectParams, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = params.token.as_deref().filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws/:namespace`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(namespace): Path<String>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<TrackingState>,
) -> Response {
    let namespace: Namespace = match namespace.parse() {
        Ok(ns) => ns,
        Err(_) => return (StatusCode::NOT_FOUND, "Unknown namespace").into_response(),
    };
    let token = extract_token(&params, &headers);

    ws.on_upgrade(move |socket| handle_socket(socket, namespace, token, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(
    socket: WebSocket,
    namespace: Namespace,
    token: Option<String>,
    state: TrackingState,
) {
    let (mut sender, mut receiver) = socket.split();
    let hub = state.hub;
    let connection_id = ConnectionId::new();

    let actor = match hub.authenticate(connection_id, namespace, token.as_deref()).await {
        Ok(actor) => actor,
        Err(err) => {
            let event = OutboundEvent::auth_error(&ErrorPayload::from(&err));
            if let Err(e) = send_event(&mut sender, &event).await {
                tracing::debug!(connection_id = %connection_id, "Failed to send auth_error: {}", e);
            }
            let _ = send_close(&mut sender, close_code::POLICY, "authentication failed").await;
            return;
        }
    };

    let mut handle = hub.connect(connection_id, namespace, actor).await;

    // Forward queued frames to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = handle.next_frame().await {
            let result = match frame {
                OutboundFrame::Event(event) => send_event(&mut sender, &event).await,
                OutboundFrame::Close { code, reason } => {
                    let _ = send_close(&mut sender, code, reason).await;
                    break;
                }
            };
            if let Err(e) = result {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Handle incoming frames from the client
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    // Errors are already reported to the client by the hub.
                    let _ = recv_hub.handle_text(connection_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                    recv_hub.reject_binary(connection_id).await;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level keepalive, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(connection_id).await;
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &OutboundEvent,
) -> Result<(), axum::Error> {
    let text = encode_event(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(text)).await
}

async fn send_close(
    sender: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &'static str,
) -> Result<(), axum::Error> {
    sender
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        })))
        .await
}

/// Liveness check with current presence counts.
///
/// Route: `GET /health`
pub async fn health_handler(State(state): State<TrackingState>) -> Json<serde_json::Value> {
    let stats = state.hub.stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "connections": stats,
    }))
}

/// Create axum router for the tracking endpoints.
///
/// # Example
///
/// ```ignore
/// let app = tracking_router()
///     .layer(cors)
///     .with_state(TrackingState::new(hub));
/// ```
pub fn tracking_router() -> axum::Router<TrackingState> {
    use axum::routing::get;

    axum::Router::new()
        .route("/ws/:namespace", get(ws_handler))
        .route("/health", get(health_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use axum::http::HeaderValue;

    #[test]
    fn tracking_state_shares_hub() {
        let hub = Arc::new(RealtimeHub::new(Arc::new(MockSessionValidator::new()), 8));
        let state = TrackingState::new(hub.clone());

        assert!(Arc::ptr_eq(&state.hub, &hub));
    }

    #[test]
    fn tracking_router_creates_routes() {
        let _router = tracking_router();
    }

    #[test]
    fn token_from_query_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        let params = ConnectParams {
            token: Some("query-token".to_string()),
        };

        assert_eq!(extract_token(&params, &headers).as_deref(), Some("query-token"));
    }

    #[test]
    fn token_falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));

        assert_eq!(
            extract_token(&ConnectParams::default(), &headers).as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn missing_or_non_bearer_credentials_yield_none() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&ConnectParams::default(), &headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_token(&ConnectParams::default(), &headers).is_none());
    }

    #[tokio::test]
    async fn health_reports_presence_counts() {
        let hub = Arc::new(RealtimeHub::new(Arc::new(MockSessionValidator::new()), 8));
        let Json(body) = health_handler(State(TrackingState::new(hub))).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"]["total"], 0);
    }
}
