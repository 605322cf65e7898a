//! Mock session validator for testing.
//!
//! Implements the `SessionValidator` port without signing real tokens.
//!
//! # Example
//!
//! ```ignore
//! use order_tracking::adapters::auth::MockSessionValidator;
//! use order_tracking::domain::foundation::Role;
//!
//! let validator = MockSessionValidator::new()
//!     .with_test_actor("cust-token", "alice", Role::Customer)
//!     .with_test_actor("rest-token", "r-1", Role::Restaurant);
//!
//! let actor = validator.validate("cust-token").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{ActorId, AuthError, AuthenticatedActor, Role};
use crate::ports::SessionValidator;

/// Mock session validator for testing.
///
/// Stores a map of tokens to actors. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    /// Map of valid tokens to their associated actors
    tokens: HashMap<String, AuthenticatedActor>,
    /// Optional error to return for all validations (for error testing)
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to an actor.
    pub fn with_actor(mut self, token: impl Into<String>, actor: AuthenticatedActor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }

    /// Adds a valid token for an actor with the given id and role.
    ///
    /// Blank ids are ignored; the token stays invalid.
    pub fn with_test_actor(
        self,
        token: impl Into<String>,
        actor_id: impl Into<String>,
        role: Role,
    ) -> Self {
        let actor_id = actor_id.into();
        let Ok(id) = ActorId::new(actor_id.clone()) else {
            return self;
        };
        let actor = AuthenticatedActor::new(id, role, Some(format!("{}@test.example.com", actor_id)));
        self.with_actor(token, actor)
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedActor, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_actor() -> AuthenticatedActor {
        AuthenticatedActor::new(
            ActorId::new("user-123").unwrap(),
            Role::Customer,
            Some("test@example.com".to_string()),
        )
    }

    #[tokio::test]
    async fn mock_validator_returns_actor_for_registered_token() {
        let validator = MockSessionValidator::new().with_actor("valid-token", test_actor());

        let actor = validator.validate("valid-token").await.unwrap();

        assert_eq!(actor.id.as_str(), "user-123");
        assert_eq!(actor.role, Role::Customer);
    }

    #[tokio::test]
    async fn mock_validator_returns_invalid_token_for_unknown() {
        let validator = MockSessionValidator::new();

        let result = validator.validate("unknown-token").await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn mock_validator_empty_token_is_missing() {
        let validator = MockSessionValidator::new();
        assert!(matches!(
            validator.validate("").await,
            Err(AuthError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn mock_validator_with_test_actor_sets_role() {
        let validator =
            MockSessionValidator::new().with_test_actor("my-token", "courier-9", Role::Delivery);

        let actor = validator.validate("my-token").await.unwrap();

        assert_eq!(actor.id.as_str(), "courier-9");
        assert_eq!(actor.role, Role::Delivery);
        assert!(actor.email.unwrap().contains("courier-9"));
    }

    #[tokio::test]
    async fn mock_validator_with_error_forces_error() {
        let validator = MockSessionValidator::new()
            .with_actor("valid-token", test_actor())
            .with_error(AuthError::TokenExpired);

        let result = validator.validate("valid-token").await;

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }
}
