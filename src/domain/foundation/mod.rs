//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, roles, and error types
//! that form the vocabulary of the order tracking domain.

mod auth;
mod errors;
mod ids;
mod role;
mod timestamp;

pub use auth::{AuthError, AuthenticatedActor};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{ActorId, ConnectionId, OrderId, RestaurantId};
pub use role::Role;
pub use timestamp::Timestamp;
