//! Realtime rooms, events, and gateway requests.
//!
//! Room names are deterministic so that every participant derives the same
//! identifier without coordination. A chat room sorts both user ids so that
//! `chat:{a}:{b}` and `chat:{b}:{a}` never both exist.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::UserId;

/// Event names pushed to clients.
pub mod events {
    /// A student requested a lesson; sent to the teacher.
    pub const BOOKING_CREATED: &str = "booking-created";
    /// A booking changed status; sent to both participants.
    pub const BOOKING_UPDATED: &str = "booking-updated";
    /// A teacher published, changed, or removed a day.
    pub const AVAILABILITY_UPDATED: &str = "availability-updated";
    /// A chat message was delivered.
    pub const NEW_MESSAGE: &str = "new-message";
    /// The recipient read a conversation.
    pub const MESSAGES_READ: &str = "messages-read";
    /// A teacher shared a resource with a student.
    pub const RESOURCE_ASSIGNED: &str = "resource-assigned";
    /// A student sent a lesson inquiry.
    pub const INQUIRY_CREATED: &str = "inquiry-created";
}

/// Identifier of one live socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a hub-assigned sequence number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Broadcast group a connection may belong to.
///
/// # Examples
/// ```
/// use musiconthego::domain::{RoomName, UserId};
///
/// let a = UserId::random();
/// let b = UserId::random();
/// assert_eq!(RoomName::chat(a, b), RoomName::chat(b, a));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomName {
    /// Personal room every connection joins automatically.
    User(UserId),
    /// Private conversation; ids are stored lowest first.
    Chat(UserId, UserId),
    /// Booking feed of one teacher.
    TeacherBookings(UserId),
    /// Booking feed of one student.
    StudentBookings(UserId),
    /// Published schedule of one teacher; open to any role.
    TeacherAvailability(UserId),
}

impl RoomName {
    /// Chat room for two users in canonical order.
    pub fn chat(a: UserId, b: UserId) -> Self {
        if a <= b { Self::Chat(a, b) } else { Self::Chat(b, a) }
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Chat(low, high) => write!(f, "chat:{low}:{high}"),
            Self::TeacherBookings(id) => write!(f, "teacher-bookings:{id}"),
            Self::StudentBookings(id) => write!(f, "student-bookings:{id}"),
            Self::TeacherAvailability(id) => write!(f, "teacher-availability:{id}"),
        }
    }
}

impl Serialize for RoomName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl RealtimeEvent {
    /// Build an event, serialising `payload` into `data`.
    pub fn new(event: &str, payload: &impl Serialize) -> Self {
        let data = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, event, "failed to serialise realtime payload");
                Value::Null
            }
        };
        Self {
            event: event.to_owned(),
            data,
        }
    }
}

/// Room operations a client may request over the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayRequest {
    /// `join-chat`: subscribe to the conversation with another user.
    JoinChat { other_user_id: UserId },
    /// `leave-chat`
    LeaveChat { other_user_id: UserId },
    /// `join-teacher-bookings`: the caller's own teacher feed.
    JoinTeacherBookings,
    /// `join-student-bookings`: the caller's own student feed.
    JoinStudentBookings,
    /// `join-teacher-availability`
    JoinTeacherAvailability { teacher_id: UserId },
}

/// Outcome of a successful gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayAck {
    /// Sent back as a `joined` frame.
    Joined(RoomName),
    /// Sent back as a `left` frame.
    Left(RoomName),
}

#[cfg(test)]
mod tests {
    //! Room naming.
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn id(raw: &str) -> UserId {
        UserId::from_uuid(Uuid::parse_str(raw).expect("valid uuid"))
    }

    #[rstest]
    fn chat_rooms_sort_participants() {
        let low = id("00000000-0000-0000-0000-000000000001");
        let high = id("00000000-0000-0000-0000-000000000002");
        assert_eq!(
            RoomName::chat(high, low).to_string(),
            "chat:00000000-0000-0000-0000-000000000001:00000000-0000-0000-0000-000000000002"
        );
    }

    #[rstest]
    #[case(RoomName::User(id("00000000-0000-0000-0000-00000000000a")), "user:")]
    #[case(RoomName::TeacherBookings(id("00000000-0000-0000-0000-00000000000a")), "teacher-bookings:")]
    #[case(RoomName::StudentBookings(id("00000000-0000-0000-0000-00000000000a")), "student-bookings:")]
    #[case(RoomName::TeacherAvailability(id("00000000-0000-0000-0000-00000000000a")), "teacher-availability:")]
    fn room_prefixes(#[case] room: RoomName, #[case] prefix: &str) {
        assert_eq!(
            room.to_string(),
            format!("{prefix}00000000-0000-0000-0000-00000000000a")
        );
    }

    #[rstest]
    fn events_serialise_as_envelopes() {
        let event = RealtimeEvent::new(events::NEW_MESSAGE, &serde_json::json!({"text": "hi"}));
        let value = serde_json::to_value(&event).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({"event": "new-message", "data": {"text": "hi"}})
        );
    }
}
