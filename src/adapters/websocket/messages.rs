//! WebSocket wire frames.
//!
//! Both directions carry JSON text frames shaped as
//! `{"event": "<name>", "data": {...}}`; outbound frames add `timestamp`.
//! Connection-level signals (close after auth failure or replacement) travel
//! through the same per-connection queue as events so they stay ordered.

use serde::Deserialize;

use crate::domain::foundation::ValidationError;
use crate::domain::tracking::{OutboundEvent, TrackingError};

// ============================================
// Client → Server
// ============================================

/// Raw inbound envelope, before the event name is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, TrackingError> {
        let frame: InboundFrame = serde_json::from_str(text).map_err(|e| {
            TrackingError::from(ValidationError::invalid_format("frame", e.to_string()))
        })?;
        if frame.event.trim().is_empty() {
            return Err(ValidationError::empty_field("event").into());
        }
        Ok(frame)
    }
}

// ============================================
// Server → Client
// ============================================

/// Item on a connection's outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Event(OutboundEvent),
    /// Send a close frame and stop writing.
    Close { code: u16, reason: &'static str },
}

impl OutboundFrame {
    pub fn event_name(&self) -> Option<&str> {
        match self {
            OutboundFrame::Event(event) => Some(&event.name),
            OutboundFrame::Close { .. } => None,
        }
    }
}

/// Encodes an event as a text frame body.
pub fn encode_event(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
