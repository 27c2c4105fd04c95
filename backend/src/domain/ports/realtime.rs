//! Driven ports for pushing events to connected clients.

use tokio::sync::mpsc;

use crate::domain::{ConnectionId, RealtimeEvent, RoomName, UserId};

/// Fire-and-forget event emission.
///
/// Implementations must never block the caller; events for slow or absent
/// connections are dropped.
#[cfg_attr(test, mockall::automock)]
pub trait RealtimePublisher: Send + Sync {
    /// Deliver to every connection of `user`.
    fn emit_to_user(&self, user: &UserId, event: RealtimeEvent);

    /// Deliver to every connection in `room`.
    fn emit_to_room(&self, room: &RoomName, event: RealtimeEvent);
}

/// Connection and room membership bookkeeping.
#[cfg_attr(test, mockall::automock)]
pub trait RoomRegistry: Send + Sync {
    /// Register a connection and hand back its event stream.
    fn connect(&self, user: &UserId) -> (ConnectionId, mpsc::Receiver<RealtimeEvent>);

    fn join(&self, connection: ConnectionId, room: RoomName);

    fn leave(&self, connection: ConnectionId, room: &RoomName);

    /// Drop the connection and all of its memberships.
    fn disconnect(&self, connection: ConnectionId);
}

/// Publisher that discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpRealtimePublisher;

impl RealtimePublisher for NoOpRealtimePublisher {
    fn emit_to_user(&self, _user: &UserId, _event: RealtimeEvent) {}

    fn emit_to_room(&self, _room: &RoomName, _event: RealtimeEvent) {}
}
