//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SessionValidator` - Verifies handshake credentials
//! - `RealtimeEmitter` - Server-initiated pushes used by the HTTP layer

mod realtime_emitter;
mod session_validator;

pub use realtime_emitter::{BroadcastError, RealtimeEmitter};
pub use session_validator::SessionValidator;
