//! Live registry of which actors hold an open, authenticated connection.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::foundation::{ActorId, ConnectionId, Role};

/// Connected-actor counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceStats {
    pub customers: usize,
    pub restaurants: usize,
    pub delivery: usize,
    pub admins: usize,
    pub total: usize,
}

/// role → actor → connection.
///
/// Holds at most one connection per (role, actor). Registering a second
/// connection for the same pair replaces the first and hands the displaced
/// connection id back so the caller can close it.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    buckets: HashMap<Role, HashMap<ActorId, ConnectionId>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `connection` as the live connection for (`role`, `actor`).
    ///
    /// Returns the connection it displaced, if any.
    pub fn register(
        &mut self,
        role: Role,
        actor: ActorId,
        connection: ConnectionId,
    ) -> Option<ConnectionId> {
        self.buckets
            .entry(role)
            .or_default()
            .insert(actor, connection)
            .filter(|previous| *previous != connection)
    }

    /// Removes the entry only if it still points at `connection`.
    ///
    /// A superseded connection disconnecting late must not evict its
    /// replacement.
    pub fn unregister(&mut self, role: Role, actor: &ActorId, connection: &ConnectionId) -> bool {
        let Some(bucket) = self.buckets.get_mut(&role) else {
            return false;
        };
        if bucket.get(actor) != Some(connection) {
            return false;
        }
        bucket.remove(actor);
        if bucket.is_empty() {
            self.buckets.remove(&role);
        }
        true
    }

    pub fn count(&self, role: Role) -> usize {
        self.buckets.get(&role).map(HashMap::len).unwrap_or(0)
    }

    pub fn stats(&self) -> PresenceStats {
        let customers = self.count(Role::Customer);
        let restaurants = self.count(Role::Restaurant);
        let delivery = self.count(Role::Delivery);
        let admins = self.count(Role::Admin);
        PresenceStats {
            customers,
            restaurants,
            delivery,
            admins,
            total: customers + restaurants + delivery + admins,
        }
    }
}
