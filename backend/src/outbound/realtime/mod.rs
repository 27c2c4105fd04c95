//! In-process room hub backing the realtime ports.
//!
//! Each connection owns a bounded queue. Emission never waits: when a
//! connection's queue is full the event is dropped for that connection only.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::ports::{RealtimePublisher, RoomRegistry};
use crate::domain::{ConnectionId, RealtimeEvent, RoomName, UserId};

/// Events buffered per connection before new ones are dropped.
pub const CONNECTION_QUEUE_CAPACITY: usize = 64;

struct Connection {
    user: UserId,
    sender: mpsc::Sender<RealtimeEvent>,
    rooms: HashSet<RoomName>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

/// Room membership table and fan-out for live sockets.
pub struct RoomHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(CONNECTION_QUEUE_CAPACITY)
    }
}

impl RoomHub {
    /// Hub whose per-connection queues hold `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Members of `room`, mainly for diagnostics.
    pub fn room_size(&self, room: &RoomName) -> usize {
        self.lock().rooms.get(room).map_or(0, HashSet::len)
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn deliver(&self, room: &RoomName, event: &RealtimeEvent) {
        let targets: Vec<(ConnectionId, mpsc::Sender<RealtimeEvent>)> = {
            let state = self.lock();
            let Some(members) = state.rooms.get(room) else {
                return;
            };
            members
                .iter()
                .filter_map(|id| {
                    state
                        .connections
                        .get(id)
                        .map(|conn| (*id, conn.sender.clone()))
                })
                .collect()
        };
        for (connection, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(%connection, %room, event = %event.event, "connection queue full; dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%connection, %room, "connection closed before delivery");
                }
            }
        }
    }
}

impl RealtimePublisher for RoomHub {
    fn emit_to_user(&self, user: &UserId, event: RealtimeEvent) {
        self.deliver(&RoomName::User(*user), &event);
    }

    fn emit_to_room(&self, room: &RoomName, event: RealtimeEvent) {
        self.deliver(room, &event);
    }
}

impl RoomRegistry for RoomHub {
    fn connect(&self, user: &UserId) -> (ConnectionId, mpsc::Receiver<RealtimeEvent>) {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.lock().connections.insert(
            id,
            Connection {
                user: *user,
                sender,
                rooms: HashSet::new(),
            },
        );
        debug!(connection = %id, %user, "realtime connection registered");
        (id, receiver)
    }

    fn join(&self, connection: ConnectionId, room: RoomName) {
        let mut state = self.lock();
        let Some(conn) = state.connections.get_mut(&connection) else {
            return;
        };
        conn.rooms.insert(room);
        state.rooms.entry(room).or_default().insert(connection);
    }

    fn leave(&self, connection: ConnectionId, room: &RoomName) {
        let mut state = self.lock();
        if let Some(conn) = state.connections.get_mut(&connection) {
            conn.rooms.remove(room);
        }
        if let Some(members) = state.rooms.get_mut(room) {
            members.remove(&connection);
            if members.is_empty() {
                state.rooms.remove(room);
            }
        }
    }

    fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.lock();
        let Some(conn) = state.connections.remove(&connection) else {
            return;
        };
        for room in &conn.rooms {
            if let Some(members) = state.rooms.get_mut(room) {
                members.remove(&connection);
                if members.is_empty() {
                    state.rooms.remove(room);
                }
            }
        }
        debug!(%connection, user = %conn.user, "realtime connection removed");
    }
}
