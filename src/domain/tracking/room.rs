//! Room identifiers and per-namespace membership.
//!
//! Rooms are implicit multicast groups: a room exists while it has at least
//! one member, is created on first join, and is dropped when the last member
//! leaves.
//!
//! ```text
//! customer namespace            restaurant namespace
//! order:O1                      order:O1
//! ├── conn-a                    └── conn-r
//! └── conn-b                    restaurant:R9
//! customer:alice                └── conn-r
//! └── conn-a
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ActorId, ConnectionId, OrderId, RestaurantId, Role, ValidationError};

/// Courier availability label, e.g. `available` or `busy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryStatus(String);

impl DeliveryStatus {
    /// Status whose room receives "new order ready" targeting.
    pub const AVAILABLE: &'static str = "available";

    pub fn new(status: impl Into<String>) -> Result<Self, ValidationError> {
        let status = status.into();
        let status = status.trim();
        if status.is_empty() {
            return Err(ValidationError::empty_field("status"));
        }
        if status.contains(':') {
            return Err(ValidationError::invalid_format("status", "must not contain ':'"));
        }
        Ok(Self(status.to_string()))
    }

    pub fn available() -> Self {
        Self(Self::AVAILABLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        status.0
    }
}

/// Name of a room. Displays as its wire key, e.g. `order:O1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomId {
    Order(OrderId),
    Restaurant(RestaurantId),
    Customer(ActorId),
    Delivery(DeliveryStatus),
    AdminDashboard,
}

impl RoomId {
    /// The `<role>:<actorId>` room a connection auto-joins, if its role has one.
    pub fn personal(role: Role, actor: &ActorId) -> Option<Self> {
        match role {
            Role::Customer => Some(RoomId::Customer(actor.clone())),
            Role::Restaurant => Some(RoomId::Restaurant(RestaurantId::from_actor(actor))),
            Role::Delivery | Role::Admin => None,
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Order(id) => write!(f, "order:{}", id),
            RoomId::Restaurant(id) => write!(f, "restaurant:{}", id),
            RoomId::Customer(id) => write!(f, "customer:{}", id),
            RoomId::Delivery(status) => write!(f, "delivery:{}", status.as_str()),
            RoomId::AdminDashboard => f.write_str("admin:dashboard"),
        }
    }
}

/// Room membership for one namespace.
///
/// `BTreeSet` keeps member iteration deterministic, which keeps fan-out
/// order stable across runs.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room, creating the room if needed.
    ///
    /// Returns `false` if the connection was already a member.
    pub fn join(&mut self, room: RoomId, connection: ConnectionId) -> bool {
        self.rooms.entry(room).or_default().insert(connection)
    }

    /// Removes a connection from a room, dropping the room once empty.
    ///
    /// Returns `false` if the connection was not a member.
    pub fn leave(&mut self, room: &RoomId, connection: &ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(connection);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    /// Removes a connection from every listed room.
    pub fn leave_all<'a>(
        &mut self,
        rooms: impl IntoIterator<Item = &'a RoomId>,
        connection: &ConnectionId,
    ) {
        for room in rooms {
            self.leave(room, connection);
        }
    }

    /// Current members of a room; empty if the room does not exist.
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(BTreeSet::len).unwrap_or(0)
    }

    /// Number of live (non-empty) rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn active_rooms(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }
}
