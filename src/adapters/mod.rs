//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Handshake token validation (JWT, mock)
//! - `websocket` - WebSocket transport, hub and emission facade

pub mod auth;
pub mod websocket;

pub use auth::{JwtSessionValidator, MockSessionValidator};
pub use websocket::{RealtimeHub, TrackingState};
