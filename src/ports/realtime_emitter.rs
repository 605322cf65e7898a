//! RealtimeEmitter port - push events to connected clients from outside the
//! socket layer.
//!
//! HTTP handlers that complete a domain action (order placed, payment
//! captured, status changed by an operator) call these operations to notify
//! whoever is currently listening. Delivery is fire-and-forget: recipients
//! that are not connected, or not in the target room, simply miss the event.

use async_trait::async_trait;

use crate::domain::foundation::{ActorId, OrderId, RestaurantId};

/// Errors surfaced by an emission call.
///
/// Per-recipient delivery failures are never reported here; they are logged
/// and dropped by the adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BroadcastError {
    /// The event name is blank or reserved for the transport.
    #[error("Invalid event name: {0}")]
    InvalidEvent(String),
}

/// Port for server-initiated emissions.
///
/// # Example
///
/// ```ignore
/// // After the restaurant marks an order ready through the REST API:
/// emitter
///     .emit_to_order(&order_id, "statusUpdated", json!({ "status": "ready" }))
///     .await?;
/// ```
#[async_trait]
pub trait RealtimeEmitter: Send + Sync {
    /// The customer's personal room in the customer namespace.
    async fn emit_to_customer(
        &self,
        customer_id: &ActorId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;

    /// The restaurant's room in the restaurant namespace.
    async fn emit_to_restaurant(
        &self,
        restaurant_id: &RestaurantId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;

    /// The order room in the customer, restaurant and delivery namespaces.
    async fn emit_to_order(
        &self,
        order_id: &OrderId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;

    /// Couriers currently in the `delivery:available` room.
    async fn emit_to_available_delivery(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;

    /// Admins that joined the dashboard room.
    async fn emit_to_admin(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;
}
