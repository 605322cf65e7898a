//! Authentication types for the domain layer.
//!
//! These types represent an actor extracted from a verified access token.
//! They have **no external dependencies** - any token verifier can populate
//! them via the `SessionValidator` port.

use super::{ActorId, ErrorCode, Role};
use thiserror::Error;

/// Actor identity attached to a connection after a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The actor id from the token subject.
    pub id: ActorId,

    /// The role claim; decides which namespaces admit the actor.
    pub role: Role,

    /// Email claim, when the issuer includes one.
    pub email: Option<String>,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    pub fn new(id: ActorId, role: Role, email: Option<String>) -> Self {
        Self { id, role, email }
    }
}

/// Authentication errors that can occur during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("Authentication token required")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// The actor's role is not admitted here.
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl AuthError {
    /// Wire code for the `auth_error` event.
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => ErrorCode::Unauthorized,
            AuthError::TokenExpired => ErrorCode::TokenExpired,
            AuthError::InsufficientPermissions => ErrorCode::Forbidden,
        }
    }
}
