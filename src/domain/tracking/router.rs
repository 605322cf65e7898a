//! Inbound event handling and fan-out rules.
//!
//! The router is pure: it inspects the sender's context and the parsed event
//! and returns the membership changes and emissions the hub must apply, in
//! order. Only the typed optional fields of the context (bound restaurant,
//! delivery status, current order) are updated here; room membership is
//! recorded by the hub when it applies `Join`/`Leave`.

use crate::domain::foundation::{ConnectionId, Role};

use super::events::{
    names, AdminBroadcast, AdminMessageData, AssignedData, ClientEvent, Completion,
    DeliveredData, LocationReport, LocationUpdateData, OrderRef, OutboundEvent,
    ReadyForPickupData, StatusChange, StatusRequestData, StatusUpdatedData,
};
use super::{ConnectionContext, DeliveryStatus, Namespace, RoleGate, RoomId, TrackingError};

/// Recipients of an emission within one namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Every current member of a room.
    Room(RoomId),
    /// Every connection in the namespace.
    All,
    /// A single connection.
    Connection(ConnectionId),
}

/// One event addressed to one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub namespace: Namespace,
    pub target: Target,
    pub event: OutboundEvent,
}

impl Emission {
    pub fn to_room(namespace: Namespace, room: RoomId, event: OutboundEvent) -> Self {
        Self {
            namespace,
            target: Target::Room(room),
            event,
        }
    }

    pub fn to_namespace(namespace: Namespace, event: OutboundEvent) -> Self {
        Self {
            namespace,
            target: Target::All,
            event,
        }
    }
}

/// A step the hub applies on behalf of the sender.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    /// Add the sender to a room in its own namespace.
    Join(RoomId),
    /// Remove the sender from a room in its own namespace.
    Leave(RoomId),
    Emit(Emission),
    /// Send an event to the sender only.
    Reply(OutboundEvent),
    /// Send current presence counts to the sender only.
    ReplyStats,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoomRouter {
    gate: RoleGate,
}

impl RoomRouter {
    pub fn new(gate: RoleGate) -> Self {
        Self { gate }
    }

    /// Resolves an inbound event into the actions that implement it.
    pub fn route(
        &self,
        ctx: &mut ConnectionContext,
        event: ClientEvent,
    ) -> Result<Vec<RouteAction>, TrackingError> {
        match (ctx.namespace, event) {
            (_, ClientEvent::Ping) => Ok(vec![RouteAction::Reply(OutboundEvent::pong())]),

            (Namespace::Customer, ClientEvent::Track(OrderRef { order_id })) => {
                Ok(vec![RouteAction::Join(RoomId::Order(order_id))])
            }
            (Namespace::Customer, ClientEvent::Untrack(OrderRef { order_id })) => {
                Ok(vec![RouteAction::Leave(RoomId::Order(order_id))])
            }
            (Namespace::Customer, ClientEvent::RequestStatus(OrderRef { order_id })) => {
                let event = OutboundEvent::encode(
                    names::STATUS_REQUEST,
                    &StatusRequestData {
                        order_id: order_id.clone(),
                        customer_id: ctx.actor.id.clone(),
                    },
                )?;
                Ok(vec![RouteAction::Emit(Emission::to_room(
                    Namespace::Restaurant,
                    RoomId::Order(order_id),
                    event,
                ))])
            }

            (Namespace::Restaurant, ClientEvent::Join(join)) => {
                ctx.bind_restaurant(join.restaurant_id.clone());
                Ok(vec![RouteAction::Join(RoomId::Restaurant(join.restaurant_id))])
            }
            (Namespace::Restaurant, ClientEvent::Monitor(OrderRef { order_id })) => {
                Ok(vec![RouteAction::Join(RoomId::Order(order_id))])
            }
            (Namespace::Restaurant, ClientEvent::UpdateStatus(change)) => {
                self.update_status(ctx, change)
            }

            (Namespace::Delivery, ClientEvent::SetStatus(courier)) => {
                Ok(self.set_status(ctx, courier.status))
            }
            (Namespace::Delivery, ClientEvent::Accept(OrderRef { order_id })) => {
                let event = OutboundEvent::encode(
                    names::ASSIGNED,
                    &AssignedData {
                        order_id: order_id.clone(),
                        delivery_id: ctx.actor.id.clone(),
                    },
                )?;
                ctx.set_current_order(Some(order_id.clone()));
                let room = RoomId::Order(order_id);
                let mut actions = vec![RouteAction::Join(room.clone())];
                actions.extend(to_order_watchers(&room, event));
                Ok(actions)
            }
            (Namespace::Delivery, ClientEvent::LocationUpdate(report)) => {
                let LocationReport { order_id, location } = report;
                let event = OutboundEvent::encode(
                    names::LOCATION_UPDATE,
                    &LocationUpdateData {
                        order_id: order_id.clone(),
                        delivery_id: ctx.actor.id.clone(),
                        location,
                    },
                )?;
                let room = RoomId::Order(order_id);
                let actions = to_order_watchers(&room, event).collect();
                Ok(actions)
            }
            (Namespace::Delivery, ClientEvent::Complete(completion)) => {
                self.complete(ctx, completion)
            }

            (Namespace::Admin, ClientEvent::StatsRequest) => {
                self.require_admin(ctx, "request stats")?;
                Ok(vec![RouteAction::ReplyStats])
            }
            (Namespace::Admin, ClientEvent::Broadcast(broadcast)) => {
                self.require_admin(ctx, "broadcast")?;
                self.broadcast(ctx, broadcast)
            }
            (Namespace::Admin, ClientEvent::JoinAdmin) => {
                self.require_admin(ctx, "join the admin dashboard")?;
                let room = RoomId::AdminDashboard;
                let reply = OutboundEvent::new(
                    names::ADMIN_JOINED,
                    serde_json::json!({ "room": room.to_string() }),
                );
                Ok(vec![RouteAction::Join(room), RouteAction::Reply(reply)])
            }

            (namespace, other) => Err(TrackingError::UnknownEvent {
                namespace,
                event: other.name().to_string(),
            }),
        }
    }

    fn update_status(
        &self,
        ctx: &ConnectionContext,
        change: StatusChange,
    ) -> Result<Vec<RouteAction>, TrackingError> {
        let ready = change.status.is_ready();
        let order_id = change.order_id.clone();

        let updated = OutboundEvent::encode(
            names::STATUS_UPDATED,
            &StatusUpdatedData {
                order_id: change.order_id,
                status: change.status,
                estimated_time: change.estimated_time,
                notes: change.notes,
                updated_by: ctx.actor.id.clone(),
            },
        )?;
        let mut actions = vec![RouteAction::Emit(Emission::to_room(
            Namespace::Customer,
            RoomId::Order(order_id.clone()),
            updated,
        ))];

        if ready {
            let pickup = OutboundEvent::encode(
                names::READY_FOR_PICKUP,
                &ReadyForPickupData {
                    order_id,
                    restaurant_id: ctx.effective_restaurant_id(),
                },
            )?;
            actions.push(RouteAction::Emit(Emission::to_namespace(
                Namespace::Delivery,
                pickup,
            )));
        }
        Ok(actions)
    }

    fn set_status(&self, ctx: &mut ConnectionContext, status: DeliveryStatus) -> Vec<RouteAction> {
        let mut actions = Vec::with_capacity(2);
        if let Some(previous) = ctx.set_delivery_status(status.clone()) {
            if previous != status {
                actions.push(RouteAction::Leave(RoomId::Delivery(previous)));
            }
        }
        actions.push(RouteAction::Join(RoomId::Delivery(status)));
        actions
    }

    fn complete(
        &self,
        ctx: &mut ConnectionContext,
        completion: Completion,
    ) -> Result<Vec<RouteAction>, TrackingError> {
        let Completion {
            order_id,
            signature,
            photo,
        } = completion;
        let event = OutboundEvent::encode(
            names::DELIVERED,
            &DeliveredData {
                order_id: order_id.clone(),
                delivery_id: ctx.actor.id.clone(),
                signature,
                photo,
            },
        )?;
        if ctx.current_order_id() == Some(&order_id) {
            ctx.set_current_order(None);
        }

        let room = RoomId::Order(order_id);
        let mut actions: Vec<RouteAction> = to_order_watchers(&room, event).collect();
        actions.push(RouteAction::Leave(room));
        Ok(actions)
    }

    fn broadcast(
        &self,
        ctx: &ConnectionContext,
        broadcast: AdminBroadcast,
    ) -> Result<Vec<RouteAction>, TrackingError> {
        let event = OutboundEvent::encode(
            names::ADMIN_MESSAGE,
            &AdminMessageData {
                message: broadcast.message,
                from: ctx.actor.id.clone(),
            },
        )?;
        Ok(broadcast
            .target
            .namespaces()
            .iter()
            .map(|ns| RouteAction::Emit(Emission::to_namespace(*ns, event.clone())))
            .collect())
    }

    fn require_admin(
        &self,
        ctx: &ConnectionContext,
        action: &'static str,
    ) -> Result<(), TrackingError> {
        self.gate.authorize(ctx.actor.role, &[Role::Admin], action)
    }
}

/// The same event into the customer and restaurant copies of an order room.
fn to_order_watchers(
    room: &RoomId,
    event: OutboundEvent,
) -> impl Iterator<Item = RouteAction> + '_ {
    [Namespace::Customer, Namespace::Restaurant]
        .into_iter()
        .map(move |ns| RouteAction::Emit(Emission::to_room(ns, room.clone(), event.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ActorId, AuthenticatedActor, OrderId, RestaurantId};
    use crate::domain::tracking::events::{BroadcastTarget, CourierStatus, JoinRestaurant, OrderStatus};
    use serde_json::json;

    fn ctx(namespace: Namespace, role: Role, actor: &str) -> ConnectionContext {
        ConnectionContext::new(
            ConnectionId::new(),
            AuthenticatedActor::new(ActorId::new(actor).unwrap(), role, None),
            namespace,
        )
    }

    fn order(id: &str) -> OrderId {
        OrderId::new(id).unwrap()
    }

    fn order_ref(id: &str) -> OrderRef {
        OrderRef { order_id: order(id) }
    }

    fn emissions(actions: &[RouteAction]) -> Vec<&Emission> {
        actions
            .iter()
            .filter_map(|a| match a {
                RouteAction::Emit(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn track_and_untrack_map_to_order_room() {
        let router = RoomRouter::default();
        let mut c = ctx(Namespace::Customer, Role::Customer, "c1");

        let actions = router.route(&mut c, ClientEvent::Track(order_ref("O1"))).unwrap();
        assert_eq!(actions, vec![RouteAction::Join(RoomId::Order(order("O1")))]);

        let actions = router.route(&mut c, ClientEvent::Untrack(order_ref("O1"))).unwrap();
        assert_eq!(actions, vec![RouteAction::Leave(RoomId::Order(order("O1")))]);
    }

    #[test]
    fn request_status_goes_to_restaurant_namespace() {
        let router = RoomRouter::default();
        let mut c = ctx(Namespace::Customer, Role::Customer, "c1");

        let actions = router
            .route(&mut c, ClientEvent::RequestStatus(order_ref("O1")))
            .unwrap();
        let sent = emissions(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].namespace, Namespace::Restaurant);
        assert_eq!(sent[0].target, Target::Room(RoomId::Order(order("O1"))));
        assert_eq!(sent[0].event.name, "statusRequest");
        assert_eq!(sent[0].event.data["customerId"], "c1");
    }

    #[test]
    fn join_binds_restaurant_id() {
        let router = RoomRouter::default();
        let mut r = ctx(Namespace::Restaurant, Role::Restaurant, "owner");

        let actions = router
            .route(
                &mut r,
                ClientEvent::Join(JoinRestaurant {
                    restaurant_id: RestaurantId::new("R9").unwrap(),
                }),
            )
            .unwrap();

        assert_eq!(r.restaurant_id().map(|id| id.as_str()), Some("R9"));
        assert_eq!(
            actions,
            vec![RouteAction::Join(RoomId::Restaurant(RestaurantId::new("R9").unwrap()))]
        );
    }

    #[test]
    fn ready_status_also_notifies_all_couriers() {
        let router = RoomRouter::default();
        let mut r = ctx(Namespace::Restaurant, Role::Restaurant, "owner");
        r.bind_restaurant(RestaurantId::new("R9").unwrap());

        let actions = router
            .route(
                &mut r,
                ClientEvent::UpdateStatus(StatusChange {
                    order_id: order("O1"),
                    status: OrderStatus::new("ready").unwrap(),
                    estimated_time: Some(json!(5)),
                    notes: None,
                }),
            )
            .unwrap();

        let sent = emissions(&actions);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].namespace, Namespace::Customer);
        assert_eq!(sent[0].event.data["status"], "ready");
        assert_eq!(sent[0].event.data["estimatedTime"], 5);
        assert_eq!(sent[1].namespace, Namespace::Delivery);
        assert_eq!(sent[1].target, Target::All);
        assert_eq!(sent[1].event.data["restaurantId"], "R9");
    }

    #[test]
    fn non_ready_status_stays_with_customers() {
        let router = RoomRouter::default();
        let mut r = ctx(Namespace::Restaurant, Role::Restaurant, "owner");

        let actions = router
            .route(
                &mut r,
                ClientEvent::UpdateStatus(StatusChange {
                    order_id: order("O1"),
                    status: OrderStatus::new("preparing").unwrap(),
                    estimated_time: None,
                    notes: None,
                }),
            )
            .unwrap();

        let sent = emissions(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].namespace, Namespace::Customer);
    }

    #[test]
    fn set_status_moves_between_status_rooms() {
        let router = RoomRouter::default();
        let mut d = ctx(Namespace::Delivery, Role::Delivery, "d1");

        let first = router
            .route(
                &mut d,
                ClientEvent::SetStatus(CourierStatus {
                    status: DeliveryStatus::available(),
                }),
            )
            .unwrap();
        assert_eq!(first, vec![RouteAction::Join(RoomId::Delivery(DeliveryStatus::available()))]);

        let busy = DeliveryStatus::new("busy").unwrap();
        let second = router
            .route(&mut d, ClientEvent::SetStatus(CourierStatus { status: busy.clone() }))
            .unwrap();
        assert_eq!(
            second,
            vec![
                RouteAction::Leave(RoomId::Delivery(DeliveryStatus::available())),
                RouteAction::Join(RoomId::Delivery(busy)),
            ]
        );
    }

    #[test]
    fn accept_joins_room_and_notifies_both_sides() {
        let router = RoomRouter::default();
        let mut d = ctx(Namespace::Delivery, Role::Delivery, "d1");

        let actions = router.route(&mut d, ClientEvent::Accept(order_ref("O1"))).unwrap();

        assert_eq!(actions[0], RouteAction::Join(RoomId::Order(order("O1"))));
        let sent = emissions(&actions);
        let namespaces: Vec<_> = sent.iter().map(|e| e.namespace).collect();
        assert_eq!(namespaces, vec![Namespace::Customer, Namespace::Restaurant]);
        assert!(sent.iter().all(|e| e.event.name == "assigned"));
        assert_eq!(d.current_order_id(), Some(&order("O1")));
    }

    #[test]
    fn complete_notifies_then_leaves_and_clears_order() {
        let router = RoomRouter::default();
        let mut d = ctx(Namespace::Delivery, Role::Delivery, "d1");
        router.route(&mut d, ClientEvent::Accept(order_ref("O1"))).unwrap();

        let actions = router
            .route(
                &mut d,
                ClientEvent::Complete(Completion {
                    order_id: order("O1"),
                    signature: Some("sig".to_string()),
                    photo: None,
                }),
            )
            .unwrap();

        assert_eq!(emissions(&actions).len(), 2);
        assert_eq!(
            actions.last(),
            Some(&RouteAction::Leave(RoomId::Order(order("O1"))))
        );
        assert!(d.current_order_id().is_none());
    }

    #[test]
    fn events_from_other_namespaces_are_unknown() {
        let router = RoomRouter::default();
        let mut c = ctx(Namespace::Customer, Role::Customer, "c1");

        let err = router.route(&mut c, ClientEvent::Accept(order_ref("O1"))).unwrap_err();
        assert_eq!(
            err,
            TrackingError::UnknownEvent {
                namespace: Namespace::Customer,
                event: "accept".to_string()
            }
        );
    }

    #[test]
    fn admin_events_recheck_role() {
        let router = RoomRouter::default();
        // Admin namespace admission is bypassed here to exercise the second check.
        let mut intruder = ctx(Namespace::Admin, Role::Restaurant, "r1");

        let err = router.route(&mut intruder, ClientEvent::JoinAdmin).unwrap_err();
        assert!(matches!(err, TrackingError::Forbidden { role: Role::Restaurant, .. }));
    }

    #[test]
    fn join_admin_joins_dashboard_and_replies() {
        let router = RoomRouter::default();
        let mut admin = ctx(Namespace::Admin, Role::Admin, "root");

        let actions = router.route(&mut admin, ClientEvent::JoinAdmin).unwrap();
        assert_eq!(actions[0], RouteAction::Join(RoomId::AdminDashboard));
        let RouteAction::Reply(reply) = &actions[1] else {
            panic!("expected reply");
        };
        assert_eq!(reply.data["room"], "admin:dashboard");
    }

    #[test]
    fn broadcast_fans_out_per_target() {
        let router = RoomRouter::default();
        let mut admin = ctx(Namespace::Admin, Role::Admin, "root");

        let actions = router
            .route(
                &mut admin,
                ClientEvent::Broadcast(AdminBroadcast {
                    target: BroadcastTarget::All,
                    message: "maintenance".to_string(),
                }),
            )
            .unwrap();

        let namespaces: Vec<_> = emissions(&actions).iter().map(|e| e.namespace).collect();
        assert_eq!(
            namespaces,
            vec![Namespace::Customer, Namespace::Restaurant, Namespace::Delivery]
        );
    }

    #[test]
    fn stats_request_replies_to_sender() {
        let router = RoomRouter::default();
        let mut admin = ctx(Namespace::Admin, Role::Admin, "root");
        assert_eq!(
            router.route(&mut admin, ClientEvent::StatsRequest).unwrap(),
            vec![RouteAction::ReplyStats]
        );
    }

    #[test]
    fn ping_is_answered_on_every_namespace() {
        let router = RoomRouter::default();
        for ns in Namespace::ALL {
            let mut c = ctx(ns, Role::Admin, "root");
            let actions = router.route(&mut c, ClientEvent::Ping).unwrap();
            assert!(matches!(&actions[..], [RouteAction::Reply(e)] if e.name == "pong"));
        }
    }
}
