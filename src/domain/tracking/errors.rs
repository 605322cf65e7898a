//! Errors raised while handling an inbound event.
//!
//! None of these close the connection; they are reported back to the sender
//! as an `error` event.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, Role, ValidationError};

use super::Namespace;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// The sender's role may not perform this action.
    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden { role: Role, action: &'static str },

    /// The payload is missing fields or carries out-of-range values.
    #[error("Invalid payload: {0}")]
    Validation(#[from] ValidationError),

    /// The event name is not handled by the sender's namespace.
    #[error("Event '{event}' is not supported on the {namespace} namespace")]
    UnknownEvent { namespace: Namespace, event: String },

    /// An outbound payload could not be encoded.
    #[error("Failed to encode event: {0}")]
    Encoding(String),
}

impl TrackingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TrackingError::Forbidden { .. } => ErrorCode::Forbidden,
            TrackingError::Validation(_) => ErrorCode::ValidationFailed,
            TrackingError::UnknownEvent { .. } => ErrorCode::UnknownEvent,
            TrackingError::Encoding(_) => ErrorCode::InternalError,
        }
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(err: serde_json::Error) -> Self {
        TrackingError::Encoding(err.to_string())
    }
}
