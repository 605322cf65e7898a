//! Per-connection context built at handshake.

use std::collections::BTreeSet;

use crate::domain::foundation::{AuthenticatedActor, ConnectionId, OrderId, RestaurantId, Timestamp};

use super::{DeliveryStatus, Namespace, RoomId};

/// Typed state for one open connection.
///
/// Identity fields are fixed at handshake. The optional fields change only
/// through `join` (restaurant), `setStatus` (delivery status) and
/// `accept`/`complete` (current order).
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub id: ConnectionId,
    pub actor: AuthenticatedActor,
    pub namespace: Namespace,
    pub established_at: Timestamp,
    joined_rooms: BTreeSet<RoomId>,
    restaurant_id: Option<RestaurantId>,
    delivery_status: Option<DeliveryStatus>,
    current_order_id: Option<OrderId>,
}

impl ConnectionContext {
    pub fn new(id: ConnectionId, actor: AuthenticatedActor, namespace: Namespace) -> Self {
        Self {
            id,
            actor,
            namespace,
            established_at: Timestamp::now(),
            joined_rooms: BTreeSet::new(),
            restaurant_id: None,
            delivery_status: None,
            current_order_id: None,
        }
    }

    pub fn joined_rooms(&self) -> &BTreeSet<RoomId> {
        &self.joined_rooms
    }

    pub fn is_in(&self, room: &RoomId) -> bool {
        self.joined_rooms.contains(room)
    }

    pub(crate) fn record_join(&mut self, room: RoomId) -> bool {
        self.joined_rooms.insert(room)
    }

    pub(crate) fn record_leave(&mut self, room: &RoomId) -> bool {
        self.joined_rooms.remove(room)
    }

    pub fn restaurant_id(&self) -> Option<&RestaurantId> {
        self.restaurant_id.as_ref()
    }

    /// Restaurant to attribute restaurant-side events to: the id bound via
    /// `join`, otherwise the actor's own id.
    pub fn effective_restaurant_id(&self) -> RestaurantId {
        self.restaurant_id
            .clone()
            .unwrap_or_else(|| RestaurantId::from_actor(&self.actor.id))
    }

    pub(crate) fn bind_restaurant(&mut self, restaurant_id: RestaurantId) {
        self.restaurant_id = Some(restaurant_id);
    }

    pub fn delivery_status(&self) -> Option<&DeliveryStatus> {
        self.delivery_status.as_ref()
    }

    /// Returns the previous status.
    pub(crate) fn set_delivery_status(&mut self, status: DeliveryStatus) -> Option<DeliveryStatus> {
        self.delivery_status.replace(status)
    }

    pub fn current_order_id(&self) -> Option<&OrderId> {
        self.current_order_id.as_ref()
    }

    pub(crate) fn set_current_order(&mut self, order_id: Option<OrderId>) {
        self.current_order_id = order_id;
    }
}
