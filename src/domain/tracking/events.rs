//! Inbound and outbound event vocabulary.
//!
//! Inbound events arrive as an event name plus a JSON `data` value and are
//! parsed into [`ClientEvent`]. Outbound events are [`OutboundEvent`]s: an
//! event name, a JSON payload and the time the event fired.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ActorId, AuthError, ConnectionId, OrderId, RestaurantId, Timestamp, ValidationError,
};

use super::{DeliveryStatus, Namespace, PresenceStats, TrackingError};

// ============================================
// Client → Server
// ============================================

/// Order status label set by the restaurant, e.g. `preparing` or `ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderStatus(String);

impl OrderStatus {
    pub const READY: &'static str = "ready";

    pub fn new(status: impl Into<String>) -> Result<Self, ValidationError> {
        let status = status.into();
        let status = status.trim();
        if status.is_empty() {
            return Err(ValidationError::empty_field("status"));
        }
        Ok(Self(status.to_string()))
    }

    pub fn is_ready(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::READY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRestaurant {
    pub restaurant_id: RestaurantId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Free-form ETA (minutes or a timestamp), relayed verbatim.
    #[serde(default, alias = "eta")]
    pub estimated_time: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourierStatus {
    pub status: DeliveryStatus,
}

/// Courier position. Relayed verbatim after range checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl Location {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ValidationError::out_of_range("lat", -90.0, 90.0, self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(ValidationError::out_of_range("lng", -180.0, 180.0, self.lng));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub order_id: OrderId,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub order_id: OrderId,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Namespaces an admin broadcast reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastTarget {
    All,
    Customers,
    Restaurants,
    Delivery,
}

impl BroadcastTarget {
    pub fn namespaces(&self) -> &'static [Namespace] {
        match self {
            BroadcastTarget::All => &[
                Namespace::Customer,
                Namespace::Restaurant,
                Namespace::Delivery,
            ],
            BroadcastTarget::Customers => &[Namespace::Customer],
            BroadcastTarget::Restaurants => &[Namespace::Restaurant],
            BroadcastTarget::Delivery => &[Namespace::Delivery],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminBroadcast {
    pub target: BroadcastTarget,
    pub message: String,
}

/// A parsed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Ping,
    // customer
    Track(OrderRef),
    Untrack(OrderRef),
    RequestStatus(OrderRef),
    // restaurant
    Join(JoinRestaurant),
    Monitor(OrderRef),
    UpdateStatus(StatusChange),
    // delivery
    SetStatus(CourierStatus),
    Accept(OrderRef),
    LocationUpdate(LocationReport),
    Complete(Completion),
    // admin
    StatsRequest,
    Broadcast(AdminBroadcast),
    JoinAdmin,
}

impl ClientEvent {
    /// Parses an event name and its `data` payload.
    ///
    /// Unknown names yield [`TrackingError::UnknownEvent`]; malformed payloads
    /// yield [`TrackingError::Validation`].
    pub fn parse(
        namespace: Namespace,
        name: &str,
        data: serde_json::Value,
    ) -> Result<Self, TrackingError> {
        let event = match name {
            "ping" => ClientEvent::Ping,
            "track" => ClientEvent::Track(payload(data)?),
            "untrack" => ClientEvent::Untrack(payload(data)?),
            "requestStatus" => ClientEvent::RequestStatus(payload(data)?),
            "join" => ClientEvent::Join(payload(data)?),
            "monitor" => ClientEvent::Monitor(payload(data)?),
            "updateStatus" => ClientEvent::UpdateStatus(payload(data)?),
            "setStatus" => ClientEvent::SetStatus(payload(data)?),
            "accept" => ClientEvent::Accept(payload(data)?),
            "locationUpdate" => {
                let report: LocationReport = payload(data)?;
                report.location.validate()?;
                ClientEvent::LocationUpdate(report)
            }
            "complete" => ClientEvent::Complete(payload(data)?),
            "statsRequest" | "stats:request" => ClientEvent::StatsRequest,
            "broadcast" => {
                let broadcast: AdminBroadcast = payload(data)?;
                if broadcast.message.trim().is_empty() {
                    return Err(ValidationError::empty_field("message").into());
                }
                ClientEvent::Broadcast(broadcast)
            }
            "joinAdmin" => ClientEvent::JoinAdmin,
            other => {
                return Err(TrackingError::UnknownEvent {
                    namespace,
                    event: other.to_string(),
                })
            }
        };
        Ok(event)
    }

    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Ping => "ping",
            ClientEvent::Track(_) => "track",
            ClientEvent::Untrack(_) => "untrack",
            ClientEvent::RequestStatus(_) => "requestStatus",
            ClientEvent::Join(_) => "join",
            ClientEvent::Monitor(_) => "monitor",
            ClientEvent::UpdateStatus(_) => "updateStatus",
            ClientEvent::SetStatus(_) => "setStatus",
            ClientEvent::Accept(_) => "accept",
            ClientEvent::LocationUpdate(_) => "locationUpdate",
            ClientEvent::Complete(_) => "complete",
            ClientEvent::StatsRequest => "statsRequest",
            ClientEvent::Broadcast(_) => "broadcast",
            ClientEvent::JoinAdmin => "joinAdmin",
        }
    }
}

fn payload<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, TrackingError> {
    serde_json::from_value(data)
        .map_err(|e| TrackingError::from(ValidationError::invalid_format("data", e.to_string())))
}

// ============================================
// Server → Client
// ============================================

pub mod names {
    pub const STATUS_UPDATED: &str = "statusUpdated";
    pub const READY_FOR_PICKUP: &str = "readyForPickup";
    pub const STATUS_REQUEST: &str = "statusRequest";
    pub const ASSIGNED: &str = "assigned";
    pub const LOCATION_UPDATE: &str = "locationUpdate";
    pub const DELIVERED: &str = "delivered";
    pub const ADMIN_MESSAGE: &str = "admin:message";
    pub const STATS_RESPONSE: &str = "stats:response";
    pub const ADMIN_JOINED: &str = "adminJoined";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const ERROR: &str = "error";
    pub const AUTH_ERROR: &str = "auth_error";
    pub const SESSION_REPLACED: &str = "sessionReplaced";
}

/// An event ready for fan-out. Ephemeral: never stored or replayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    #[serde(rename = "event")]
    pub name: String,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl OutboundEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp: Timestamp::now(),
        }
    }

    /// Encodes a typed payload.
    pub fn encode<T: Serialize>(name: &str, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::to_value(payload)?))
    }

    pub fn ping() -> Self {
        Self::new(names::PING, serde_json::Value::Null)
    }

    pub fn pong() -> Self {
        Self::new(names::PONG, serde_json::Value::Null)
    }

    pub fn error(payload: &ErrorPayload) -> Self {
        Self::new(
            names::ERROR,
            serde_json::json!({ "code": payload.code, "message": payload.message }),
        )
    }

    pub fn auth_error(payload: &ErrorPayload) -> Self {
        Self::new(
            names::AUTH_ERROR,
            serde_json::json!({ "code": payload.code, "message": payload.message }),
        )
    }

    pub fn stats(stats: &PresenceStats) -> Self {
        Self::new(
            names::STATS_RESPONSE,
            serde_json::json!({
                "customers": stats.customers,
                "restaurants": stats.restaurants,
                "delivery": stats.delivery,
                "admins": stats.admins,
                "total": stats.total,
            }),
        )
    }

    pub fn session_replaced(by: ConnectionId) -> Self {
        Self::new(
            names::SESSION_REPLACED,
            serde_json::json!({ "connectionId": by.to_string() }),
        )
    }
}

/// `{code, message}` body of `error` and `auth_error` events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl From<&TrackingError> for ErrorPayload {
    fn from(err: &TrackingError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<&AuthError> for ErrorPayload {
    fn from(err: &AuthError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatedData {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_by: ActorId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyForPickupData {
    pub order_id: OrderId,
    pub restaurant_id: RestaurantId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequestData {
    pub order_id: OrderId,
    pub customer_id: ActorId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedData {
    pub order_id: OrderId,
    pub delivery_id: ActorId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateData {
    pub order_id: OrderId,
    pub delivery_id: ActorId,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredData {
    pub order_id: OrderId,
    pub delivery_id: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminMessageData {
    pub message: String,
    pub from: ActorId,
}
