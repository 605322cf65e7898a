//! Role gate: admits connections to namespaces and authorizes actions.
//!
//! Two independent checks exist. `admit` runs once at handshake against the
//! namespace allow-list. `authorize` runs per action; the admin namespace
//! calls it again for privileged events even though `admit` already passed.

use crate::domain::foundation::{AuthError, AuthenticatedActor, Role};

use super::{Namespace, TrackingError};

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGate;

impl RoleGate {
    pub fn new() -> Self {
        Self
    }

    /// Handshake check: the actor's role must be in the namespace allow-list.
    pub fn admit(&self, namespace: Namespace, actor: &AuthenticatedActor) -> Result<(), AuthError> {
        if namespace.admits(actor.role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    /// Per-action check against an explicit allow-list.
    pub fn authorize(
        &self,
        role: Role,
        allowed: &[Role],
        action: &'static str,
    ) -> Result<(), TrackingError> {
        if allowed.contains(&role) {
            Ok(())
        } else {
            Err(TrackingError::Forbidden { role, action })
        }
    }
}
