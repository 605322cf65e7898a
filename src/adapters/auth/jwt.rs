//! Shared-secret JWT adapter for handshake validation.
//!
//! This adapter implements the `SessionValidator` port for tokens issued by
//! the marketplace's own login endpoint. It validates JWTs by:
//!
//! 1. Verifying the HS256 signature against the configured secret
//! 2. Rejecting expired tokens (`exp` is required)
//! 3. Mapping `id`/`sub`, `role` and `email` claims to `AuthenticatedActor`
//!
//! # Example
//!
//! ```ignore
//! use order_tracking::adapters::auth::JwtSessionValidator;
//! use order_tracking::ports::SessionValidator;
//!
//! let validator = JwtSessionValidator::new(config.auth.jwt_secret.clone());
//! let actor = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ActorId, AuthError, AuthenticatedActor, Role};
use crate::ports::SessionValidator;

/// Claims carried by marketplace access tokens.
///
/// The login endpoint writes the user id as `id`; tokens minted by other
/// tooling use the standard `sub`. Either is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl AccessClaims {
    fn subject(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }
}

/// HS256 session validator backed by a shared secret.
pub struct JwtSessionValidator {
    secret: SecretString,
    leeway_secs: u64,
}

impl JwtSessionValidator {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            leeway_secs: 0,
        }
    }

    /// Tolerated clock skew when checking `exp`.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    fn decode_claims(&self, token: &str) -> Result<TokenData<AccessClaims>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());

        decode::<AccessClaims>(token, &key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidSignature => {
                    tracing::warn!("Token signature mismatch");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedActor, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.decode_claims(token)?.claims;

        let subject = claims.subject().ok_or_else(|| {
            tracing::warn!("Token missing id/sub claim");
            AuthError::InvalidToken
        })?;

        let actor_id = ActorId::new(subject).map_err(|_| {
            tracing::warn!("Invalid actor ID in token: {:?}", subject);
            AuthError::InvalidToken
        })?;

        let role: Role = claims.role.parse().map_err(|_| {
            tracing::warn!("Unknown role in token: {}", claims.role);
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedActor::new(actor_id, role, claims.email))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}
