//! WebSocket adapters for real-time order tracking.
//!
//! This module binds the tracking domain to a WebSocket transport: one
//! endpoint per namespace, a hub owning connection state, and the facade the
//! HTTP layer uses to push server-initiated events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  GET /ws/customer   /ws/restaurant   /ws/delivery   /ws/admin     │
//! │  handler: upgrade → authenticate → connect → pump frames          │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RealtimeHub                                │
//! │   connections   rooms[customer|restaurant|delivery|admin]         │
//! │   presence      RoomRouter (fan-out rules)                        │
//! └──────────────────────────────────────────────────────────────────┘
//!           ▲                                        ▲
//!           │ RealtimeEmitter                        │ heartbeat / stats
//!   HTTP handlers (elsewhere)                 background tasks
//! ```
//!
//! # Components
//!
//! - [`messages`] - Wire frames
//! - [`hub`] - Connection, room and presence state
//! - [`emitter`] - `RealtimeEmitter` facade
//! - [`handler`] - Axum upgrade handler and health endpoint
//! - [`heartbeat`] - Periodic ping and stats tasks

pub mod emitter;
pub mod handler;
pub mod heartbeat;
pub mod hub;
pub mod messages;

pub use handler::{extract_token, health_handler, tracking_router, ws_handler, ConnectParams, TrackingState};
pub use heartbeat::{spawn_heartbeat, spawn_stats_logger};
pub use hub::{ConnectionHandle, RealtimeHub};
pub use messages::{InboundFrame, OutboundFrame};
