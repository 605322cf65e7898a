//! `RealtimeEmitter` implementation on top of the hub.
//!
//! Each call resolves its rooms and publishes immediately. The number of
//! recipients is logged but not returned: callers get no delivery
//! confirmation.

use async_trait::async_trait;

use crate::domain::foundation::{ActorId, OrderId, RestaurantId};
use crate::domain::tracking::events::names;
use crate::domain::tracking::{DeliveryStatus, Emission, Namespace, OutboundEvent, RoomId};
use crate::ports::{BroadcastError, RealtimeEmitter};

use super::hub::RealtimeHub;

/// Event names the transport uses for its own signalling.
const RESERVED_EVENTS: &[&str] = &[names::AUTH_ERROR, names::SESSION_REPLACED];

fn facade_event(event: &str, payload: serde_json::Value) -> Result<OutboundEvent, BroadcastError> {
    if event.trim().is_empty() {
        return Err(BroadcastError::InvalidEvent("event name is empty".to_string()));
    }
    if RESERVED_EVENTS.contains(&event) {
        return Err(BroadcastError::InvalidEvent(format!("'{}' is reserved", event)));
    }
    Ok(OutboundEvent::new(event, payload))
}

impl RealtimeHub {
    async fn publish_to_rooms(
        &self,
        targets: &[(Namespace, RoomId)],
        event: OutboundEvent,
    ) -> usize {
        let mut delivered = 0;
        for (namespace, room) in targets {
            delivered += self
                .publish(Emission::to_room(*namespace, room.clone(), event.clone()))
                .await;
        }
        tracing::debug!(event = %event.name, rooms = targets.len(), delivered, "Facade emission");
        delivered
    }
}

#[async_trait]
impl RealtimeEmitter for RealtimeHub {
    async fn emit_to_customer(
        &self,
        customer_id: &ActorId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let event = facade_event(event, payload)?;
        self.publish_to_rooms(
            &[(Namespace::Customer, RoomId::Customer(customer_id.clone()))],
            event,
        )
        .await;
        Ok(())
    }

    async fn emit_to_restaurant(
        &self,
        restaurant_id: &RestaurantId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let event = facade_event(event, payload)?;
        self.publish_to_rooms(
            &[(Namespace::Restaurant, RoomId::Restaurant(restaurant_id.clone()))],
            event,
        )
        .await;
        Ok(())
    }

    async fn emit_to_order(
        &self,
        order_id: &OrderId,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let event = facade_event(event, payload)?;
        let room = RoomId::Order(order_id.clone());
        self.publish_to_rooms(
            &[
                (Namespace::Customer, room.clone()),
                (Namespace::Restaurant, room.clone()),
                (Namespace::Delivery, room),
            ],
            event,
        )
        .await;
        Ok(())
    }

    async fn emit_to_available_delivery(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let event = facade_event(event, payload)?;
        self.publish_to_rooms(
            &[(Namespace::Delivery, RoomId::Delivery(DeliveryStatus::available()))],
            event,
        )
        .await;
        Ok(())
    }

    async fn emit_to_admin(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let event = facade_event(event, payload)?;
        self.publish_to_rooms(&[(Namespace::Admin, RoomId::AdminDashboard)], event)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::websocket::messages::OutboundFrame;
    use crate::adapters::websocket::ConnectionHandle;
    use crate::domain::foundation::{AuthenticatedActor, ConnectionId, Role};
    use serde_json::json;
    use std::sync::Arc;

    fn hub() -> RealtimeHub {
        RealtimeHub::new(Arc::new(MockSessionValidator::new()), 16)
    }

    async fn connect(hub: &RealtimeHub, ns: Namespace, id: &str, role: Role) -> ConnectionHandle {
        let actor = AuthenticatedActor::new(ActorId::new(id).unwrap(), role, None);
        hub.connect(ConnectionId::new(), ns, actor).await
    }

    fn received(handle: &mut ConnectionHandle) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(OutboundFrame::Event(event)) = handle.try_next_frame() {
            names.push(event.name);
        }
        names
    }

    #[tokio::test]
    async fn emit_to_customer_reaches_personal_room_only() {
        let hub = hub();
        let mut alice = connect(&hub, Namespace::Customer, "alice", Role::Customer).await;
        let mut bob = connect(&hub, Namespace::Customer, "bob", Role::Customer).await;

        hub.emit_to_customer(&ActorId::new("alice").unwrap(), "orderPlaced", json!({"orderId": "O1"}))
            .await
            .unwrap();

        assert_eq!(received(&mut alice), vec!["orderPlaced"]);
        assert!(received(&mut bob).is_empty());
    }

    #[tokio::test]
    async fn emit_to_restaurant_uses_actor_room() {
        let hub = hub();
        let mut owner = connect(&hub, Namespace::Restaurant, "R1", Role::Restaurant).await;

        hub.emit_to_restaurant(&RestaurantId::new("R1").unwrap(), "newOrder", json!({}))
            .await
            .unwrap();

        assert_eq!(received(&mut owner), vec!["newOrder"]);
    }

    #[tokio::test]
    async fn emit_to_order_reaches_all_three_namespaces() {
        let hub = hub();
        let mut customer = connect(&hub, Namespace::Customer, "alice", Role::Customer).await;
        let mut restaurant = connect(&hub, Namespace::Restaurant, "R1", Role::Restaurant).await;
        let mut courier = connect(&hub, Namespace::Delivery, "d-1", Role::Delivery).await;

        hub.handle_event(customer.id, "track", json!({"orderId": "O1"})).await.unwrap();
        hub.handle_event(restaurant.id, "monitor", json!({"orderId": "O1"})).await.unwrap();
        hub.handle_event(courier.id, "accept", json!({"orderId": "O1"})).await.unwrap();
        received(&mut customer);
        received(&mut restaurant);
        received(&mut courier);

        hub.emit_to_order(&OrderId::new("O1").unwrap(), "paymentCaptured", json!({}))
            .await
            .unwrap();

        assert_eq!(received(&mut customer), vec!["paymentCaptured"]);
        assert_eq!(received(&mut restaurant), vec!["paymentCaptured"]);
        assert_eq!(received(&mut courier), vec!["paymentCaptured"]);
    }

    #[tokio::test]
    async fn emit_to_available_delivery_skips_busy_couriers() {
        let hub = hub();
        let mut idle = connect(&hub, Namespace::Delivery, "d-1", Role::Delivery).await;
        let mut busy = connect(&hub, Namespace::Delivery, "d-2", Role::Delivery).await;
        hub.handle_event(idle.id, "setStatus", json!({"status": "available"})).await.unwrap();
        hub.handle_event(busy.id, "setStatus", json!({"status": "busy"})).await.unwrap();

        hub.emit_to_available_delivery("newOrderNearby", json!({"orderId": "O3"}))
            .await
            .unwrap();

        assert_eq!(received(&mut idle), vec!["newOrderNearby"]);
        assert!(received(&mut busy).is_empty());
    }

    #[tokio::test]
    async fn emit_to_admin_requires_dashboard_join() {
        let hub = hub();
        let mut joined = connect(&hub, Namespace::Admin, "root", Role::Admin).await;
        let mut idle = connect(&hub, Namespace::Admin, "ops", Role::Admin).await;
        hub.handle_event(joined.id, "joinAdmin", json!(null)).await.unwrap();
        received(&mut joined);

        hub.emit_to_admin("orderFlagged", json!({"orderId": "O4"})).await.unwrap();

        assert_eq!(received(&mut joined), vec!["orderFlagged"]);
        assert!(received(&mut idle).is_empty());
    }

    #[tokio::test]
    async fn blank_or_reserved_event_names_are_rejected() {
        let hub = hub();
        assert!(matches!(
            hub.emit_to_admin(" ", json!({})).await,
            Err(BroadcastError::InvalidEvent(_))
        ));
        assert!(matches!(
            hub.emit_to_admin("auth_error", json!({})).await,
            Err(BroadcastError::InvalidEvent(_))
        ));
    }

    #[tokio::test]
    async fn emitting_to_empty_room_succeeds() {
        let hub = hub();
        assert!(hub
            .emit_to_order(&OrderId::new("nobody").unwrap(), "statusUpdated", json!({}))
            .await
            .is_ok());
    }
}
