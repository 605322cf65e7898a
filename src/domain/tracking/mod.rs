//! Real-time order tracking.
//!
//! Namespaces, rooms, presence and the fan-out rules that connect them.
//! Everything here is synchronous and transport-agnostic; the WebSocket hub
//! in `adapters::websocket` owns the state and applies what the router
//! decides.

mod connection;
mod errors;
pub mod events;
mod gate;
mod namespace;
mod presence;
mod room;
mod router;

pub use connection::ConnectionContext;
pub use errors::TrackingError;
pub use events::{ClientEvent, ErrorPayload, OutboundEvent};
pub use gate::RoleGate;
pub use namespace::Namespace;
pub use presence::{PresenceRegistry, PresenceStats};
pub use room::{DeliveryStatus, RoomId, RoomRegistry};
pub use router::{Emission, RoomRouter, RouteAction, Target};
