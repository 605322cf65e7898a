//! Connection hub: owns every open connection, the per-namespace room
//! registries and the presence registry.
//!
//! # Architecture
//!
//! ```text
//!   socket task ──text──▶ RealtimeHub::handle_text
//!                               │ parse + RoomRouter::route
//!                               ▼
//!                     ┌───────────────────────┐
//!                     │ HubState (one lock)   │
//!                     │  connections          │
//!                     │  rooms[namespace]     │
//!                     │  presence             │
//!                     └───────────────────────┘
//!                               │ try_send
//!                               ▼
//!            per-connection mpsc queue ──▶ socket writer task
//! ```
//!
//! All state sits behind a single `RwLock`, so each inbound event or timer
//! tick applies its membership changes and fan-out atomically. Fan-out never
//! awaits a client: a full or closed queue drops the frame with a warning.
//!
//! Supersession does not use the queue. It travels on a per-connection
//! oneshot that the writer checks before queued frames.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::extract::ws::close_code;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::domain::foundation::{AuthError, AuthenticatedActor, ConnectionId, ValidationError};
use crate::domain::tracking::{
    ClientEvent, ConnectionContext, Emission, ErrorPayload, Namespace, OutboundEvent,
    PresenceRegistry, PresenceStats, RoleGate, RoomId, RoomRegistry, RoomRouter, RouteAction,
    Target, TrackingError,
};
use crate::ports::SessionValidator;

use super::messages::{InboundFrame, OutboundFrame};

/// Receiving half handed to the socket task after a successful handshake.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    outbound: mpsc::Receiver<OutboundFrame>,
    superseded: Option<oneshot::Receiver<ConnectionId>>,
    closing: VecDeque<OutboundFrame>,
    finished: bool,
}

impl ConnectionHandle {
    fn new(
        id: ConnectionId,
        outbound: mpsc::Receiver<OutboundFrame>,
        superseded: oneshot::Receiver<ConnectionId>,
    ) -> Self {
        Self {
            id,
            outbound,
            superseded: Some(superseded),
            closing: VecDeque::new(),
            finished: false,
        }
    }

    /// Waits for the next frame to write to the socket.
    ///
    /// Once the connection is superseded this yields `sessionReplaced`, then
    /// a policy close, then `None`, regardless of what is still queued.
    pub async fn next_frame(&mut self) -> Option<OutboundFrame> {
        loop {
            if let Some(frame) = self.closing.pop_front() {
                return Some(frame);
            }
            if self.finished {
                return None;
            }
            let Some(signal) = self.superseded.as_mut() else {
                return self.outbound.recv().await;
            };
            let replaced_by = tokio::select! {
                biased;
                replaced = signal => replaced.ok(),
                frame = self.outbound.recv() => return frame,
            };
            self.on_signal(replaced_by);
        }
    }

    /// Non-blocking variant of [`next_frame`](Self::next_frame).
    pub fn try_next_frame(&mut self) -> Option<OutboundFrame> {
        if let Some(signal) = self.superseded.as_mut() {
            match signal.try_recv() {
                Ok(replaced_by) => self.on_signal(Some(replaced_by)),
                Err(oneshot::error::TryRecvError::Closed) => self.on_signal(None),
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        if let Some(frame) = self.closing.pop_front() {
            return Some(frame);
        }
        if self.finished {
            return None;
        }
        self.outbound.try_recv().ok()
    }

    // A closed signal means the hub dropped the connection normally.
    fn on_signal(&mut self, replaced_by: Option<ConnectionId>) {
        self.superseded = None;
        if let Some(replaced_by) = replaced_by {
            self.closing
                .push_back(OutboundFrame::Event(OutboundEvent::session_replaced(replaced_by)));
            self.closing.push_back(OutboundFrame::Close {
                code: close_code::POLICY,
                reason: "session replaced",
            });
            self.finished = true;
        }
    }
}

struct ConnectionEntry {
    context: ConnectionContext,
    outbound: mpsc::Sender<OutboundFrame>,
    superseded: oneshot::Sender<ConnectionId>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<Namespace, RoomRegistry>,
    presence: PresenceRegistry,
}

impl HubState {
    fn recipients(&self, emission: &Emission) -> Vec<ConnectionId> {
        match &emission.target {
            Target::Room(room) => self
                .rooms
                .get(&emission.namespace)
                .map(|rooms| rooms.members(room))
                .unwrap_or_default(),
            Target::All => self
                .connections
                .iter()
                .filter(|(_, entry)| entry.context.namespace == emission.namespace)
                .map(|(id, _)| *id)
                .collect(),
            Target::Connection(id) => self
                .connections
                .get(id)
                .filter(|entry| entry.context.namespace == emission.namespace)
                .map(|_| vec![*id])
                .unwrap_or_default(),
        }
    }

    /// Returns how many recipients accepted the event.
    fn deliver(&self, emission: &Emission) -> usize {
        let recipients = self.recipients(emission);
        let delivered = recipients
            .iter()
            .filter(|id| self.send(id, OutboundFrame::Event(emission.event.clone())))
            .count();

        tracing::debug!(
            namespace = %emission.namespace,
            event = %emission.event.name,
            recipients = recipients.len(),
            delivered,
            "Fan-out complete"
        );
        delivered
    }

    fn send(&self, id: &ConnectionId, frame: OutboundFrame) -> bool {
        let Some(entry) = self.connections.get(id) else {
            return false;
        };
        match entry.outbound.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(frame)) => {
                tracing::warn!(
                    connection_id = %id,
                    event = ?frame.event_name(),
                    "Outbound queue full, dropping frame"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(frame)) => {
                tracing::warn!(
                    connection_id = %id,
                    event = ?frame.event_name(),
                    "Connection writer gone, dropping frame"
                );
                false
            }
        }
    }

    fn reply_error(&self, id: &ConnectionId, err: &TrackingError) {
        self.send(id, OutboundFrame::Event(OutboundEvent::error(&ErrorPayload::from(err))));
    }

    fn join(&mut self, id: ConnectionId, room: RoomId) {
        let Some(entry) = self.connections.get_mut(&id) else {
            return;
        };
        let namespace = entry.context.namespace;
        entry.context.record_join(room.clone());
        tracing::debug!(connection_id = %id, namespace = %namespace, room = %room, "Joined room");
        self.rooms.entry(namespace).or_default().join(room, id);
    }

    fn leave(&mut self, id: ConnectionId, room: &RoomId) {
        let Some(entry) = self.connections.get_mut(&id) else {
            return;
        };
        let namespace = entry.context.namespace;
        entry.context.record_leave(room);
        if let Some(rooms) = self.rooms.get_mut(&namespace) {
            rooms.leave(room, &id);
        }
        tracing::debug!(connection_id = %id, namespace = %namespace, room = %room, "Left room");
    }

    fn apply(&mut self, id: ConnectionId, actions: Vec<RouteAction>) {
        for action in actions {
            match action {
                RouteAction::Join(room) => self.join(id, room),
                RouteAction::Leave(room) => self.leave(id, &room),
                RouteAction::Emit(emission) => {
                    self.deliver(&emission);
                }
                RouteAction::Reply(event) => {
                    self.send(&id, OutboundFrame::Event(event));
                }
                RouteAction::ReplyStats => {
                    let stats = self.presence.stats();
                    self.send(&id, OutboundFrame::Event(OutboundEvent::stats(&stats)));
                }
            }
        }
    }

    /// Drops a connection and its room memberships. Presence is left to the
    /// caller.
    fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(id)?;
        if let Some(rooms) = self.rooms.get_mut(&entry.context.namespace) {
            rooms.leave_all(entry.context.joined_rooms(), id);
        }
        Some(entry)
    }
}

/// In-process pub/sub hub for the four tracking namespaces.
pub struct RealtimeHub {
    validator: Arc<dyn SessionValidator>,
    gate: RoleGate,
    router: RoomRouter,
    outbound_buffer: usize,
    state: RwLock<HubState>,
}

impl RealtimeHub {
    pub fn new(validator: Arc<dyn SessionValidator>, outbound_buffer: usize) -> Self {
        let gate = RoleGate::new();
        Self {
            validator,
            gate,
            router: RoomRouter::new(gate),
            outbound_buffer: outbound_buffer.max(1),
            state: RwLock::new(HubState::default()),
        }
    }

    /// Verifies the handshake credential and the namespace allow-list for
    /// the socket that will become connection `id`.
    ///
    /// Nothing is registered here; a socket that drops while this is in
    /// flight leaves no trace.
    pub async fn authenticate(
        &self,
        id: ConnectionId,
        namespace: Namespace,
        token: Option<&str>,
    ) -> Result<AuthenticatedActor, AuthError> {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            tracing::warn!(
                connection_id = %id,
                namespace = %namespace,
                code = %AuthError::MissingToken.code(),
                "Handshake rejected: no token"
            );
            return Err(AuthError::MissingToken);
        };

        let actor = self.validator.validate(token).await.map_err(|e| {
            tracing::warn!(
                connection_id = %id,
                namespace = %namespace,
                code = %e.code(),
                error = %e,
                "Handshake rejected"
            );
            e
        })?;

        self.gate.admit(namespace, &actor).map_err(|e| {
            tracing::warn!(
                connection_id = %id,
                namespace = %namespace,
                actor_id = %actor.id,
                role = %actor.role,
                code = %e.code(),
                "Handshake rejected: role not allowed"
            );
            e
        })?;

        tracing::info!(
            connection_id = %id,
            namespace = %namespace,
            actor_id = %actor.id,
            role = %actor.role,
            "Handshake authenticated"
        );
        Ok(actor)
    }

    /// Registers an authenticated connection under `id`.
    ///
    /// A previous connection for the same (namespace role, actor) is dropped
    /// from the hub and its handle yields `sessionReplaced` and a close.
    pub async fn connect(
        &self,
        id: ConnectionId,
        namespace: Namespace,
        actor: AuthenticatedActor,
    ) -> ConnectionHandle {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let (superseded_tx, superseded_rx) = oneshot::channel();
        let context = ConnectionContext::new(id, actor, namespace);
        let actor_id = context.actor.id.clone();
        let role = context.actor.role;

        let mut state = self.state.write().await;

        if let Some(displaced) = state
            .presence
            .register(namespace.presence_role(), actor_id.clone(), id)
        {
            if let Some(entry) = state.remove(&displaced) {
                if entry.superseded.send(id).is_err() {
                    tracing::debug!(connection_id = %displaced, "Superseded writer already gone");
                }
            }
            tracing::info!(
                connection_id = %displaced,
                replaced_by = %id,
                actor_id = %actor_id,
                namespace = %namespace,
                "Connection superseded"
            );
        }

        state.connections.insert(
            id,
            ConnectionEntry {
                context,
                outbound: tx,
                superseded: superseded_tx,
            },
        );
        if let Some(room) = RoomId::personal(role, &actor_id) {
            state.join(id, room);
        }

        tracing::info!(
            connection_id = %id,
            actor_id = %actor_id,
            role = %role,
            namespace = %namespace,
            "Connection established"
        );

        ConnectionHandle::new(id, rx, superseded_rx)
    }

    /// Handles one inbound text frame.
    pub async fn handle_text(&self, id: ConnectionId, text: &str) -> Result<(), TrackingError> {
        match InboundFrame::parse(text) {
            Ok(frame) => self.handle_event(id, &frame.event, frame.data).await,
            Err(err) => {
                tracing::warn!(connection_id = %id, error = %err, "Malformed frame");
                self.state.read().await.reply_error(&id, &err);
                Err(err)
            }
        }
    }

    /// Parses, routes and applies one inbound event.
    ///
    /// Failures are reported to the sender as an `error` event and returned;
    /// they never affect other connections.
    pub async fn handle_event(
        &self,
        id: ConnectionId,
        event: &str,
        data: serde_json::Value,
    ) -> Result<(), TrackingError> {
        let mut state = self.state.write().await;

        let Some(entry) = state.connections.get_mut(&id) else {
            tracing::debug!(connection_id = %id, event, "Event from unregistered connection ignored");
            return Ok(());
        };
        let namespace = entry.context.namespace;
        let routed = ClientEvent::parse(namespace, event, data)
            .and_then(|parsed| self.router.route(&mut entry.context, parsed));

        match routed {
            Ok(actions) => {
                tracing::debug!(
                    connection_id = %id,
                    namespace = %namespace,
                    event,
                    actions = actions.len(),
                    "Event routed"
                );
                state.apply(id, actions);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    connection_id = %id,
                    namespace = %namespace,
                    event,
                    code = %err.code(),
                    error = %err,
                    "Event rejected"
                );
                state.reply_error(&id, &err);
                Err(err)
            }
        }
    }

    /// Answers a binary frame with an `error` event.
    pub async fn reject_binary(&self, id: ConnectionId) {
        let err = TrackingError::Validation(ValidationError::invalid_format(
            "frame",
            "binary frames are not supported",
        ));
        self.state.read().await.reply_error(&id, &err);
    }

    /// Removes a connection, its presence entry and its room memberships.
    ///
    /// Returns `false` if the connection was already gone (for instance
    /// superseded by a newer one).
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let Some(ConnectionEntry { context, .. }) = state.remove(&id) else {
            return false;
        };
        state
            .presence
            .unregister(context.namespace.presence_role(), &context.actor.id, &id);

        tracing::info!(
            connection_id = %id,
            actor_id = %context.actor.id,
            namespace = %context.namespace,
            established_at = %context.established_at,
            "Connection closed"
        );
        true
    }

    /// Fans an emission out; returns how many recipients accepted it.
    pub async fn publish(&self, emission: Emission) -> usize {
        self.state.read().await.deliver(&emission)
    }

    /// Sends `ping` to every open connection.
    pub async fn heartbeat(&self) -> usize {
        let state = self.state.read().await;
        let ping = OutboundEvent::ping();
        state
            .connections
            .keys()
            .filter(|id| state.send(id, OutboundFrame::Event(ping.clone())))
            .count()
    }

    pub async fn stats(&self) -> PresenceStats {
        self.state.read().await.presence.stats()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    pub async fn room_members(&self, namespace: Namespace, room: &RoomId) -> Vec<ConnectionId> {
        self.state
            .read()
            .await
            .rooms
            .get(&namespace)
            .map(|rooms| rooms.members(room))
            .unwrap_or_default()
    }

    pub async fn room_count(&self, namespace: Namespace) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(&namespace)
            .map(RoomRegistry::room_count)
            .unwrap_or(0)
    }

    /// Snapshot of a connection's context.
    pub async fn context(&self, id: ConnectionId) -> Option<ConnectionContext> {
        self.state
            .read()
            .await
            .connections
            .get(&id)
            .map(|entry| entry.context.clone())
    }
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("outbound_buffer", &self.outbound_buffer)
            .finish_non_exhaustive()
    }
}
