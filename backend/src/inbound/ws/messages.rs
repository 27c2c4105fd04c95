//! Wire envelope for socket frames.
//!
//! Every frame in either direction is `{"event": "...", "data": {...}}`.
//! Pushed domain events reuse [`RealtimeEvent`] directly.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{Error, ErrorCode, GatewayAck, GatewayRequest, RealtimeEvent, UserId};

pub const JOIN_CHAT: &str = "join-chat";
pub const LEAVE_CHAT: &str = "leave-chat";
pub const JOIN_TEACHER_BOOKINGS: &str = "join-teacher-bookings";
pub const JOIN_STUDENT_BOOKINGS: &str = "join-student-bookings";
pub const JOIN_TEACHER_AVAILABILITY: &str = "join-teacher-availability";

const JOINED: &str = "joined";
const LEFT: &str = "left";
const ERROR: &str = "error";

/// Frame sent by a client.
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatTarget {
    other_user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherTarget {
    teacher_id: UserId,
}

fn payload<T: for<'de> Deserialize<'de>>(event: &str, data: Value, field: &str) -> Result<T, Error> {
    serde_json::from_value(data).map_err(|_| {
        Error::invalid_field(
            field,
            "invalid_uuid",
            format!("{event} requires a valid {field}"),
        )
    })
}

impl ClientFrame {
    /// Interpret the frame as a room request.
    pub fn into_request(self) -> Result<GatewayRequest, Error> {
        let Self { event, data } = self;
        match event.as_str() {
            JOIN_CHAT => {
                let target: ChatTarget = payload(&event, data, "otherUserId")?;
                Ok(GatewayRequest::JoinChat {
                    other_user_id: target.other_user_id,
                })
            }
            LEAVE_CHAT => {
                let target: ChatTarget = payload(&event, data, "otherUserId")?;
                Ok(GatewayRequest::LeaveChat {
                    other_user_id: target.other_user_id,
                })
            }
            JOIN_TEACHER_BOOKINGS => Ok(GatewayRequest::JoinTeacherBookings),
            JOIN_STUDENT_BOOKINGS => Ok(GatewayRequest::JoinStudentBookings),
            JOIN_TEACHER_AVAILABILITY => {
                let target: TeacherTarget = payload(&event, data, "teacherId")?;
                Ok(GatewayRequest::JoinTeacherAvailability {
                    teacher_id: target.teacher_id,
                })
            }
            _ => Err(Error::invalid_request(format!("unknown event {event}"))
                .with_details(json!({ "event": event }))),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorData<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

/// `joined {room}` or `left {room}`.
pub fn ack_frame(ack: GatewayAck) -> RealtimeEvent {
    match ack {
        GatewayAck::Joined(room) => RealtimeEvent::new(JOINED, &json!({ "room": room })),
        GatewayAck::Left(room) => RealtimeEvent::new(LEFT, &json!({ "room": room })),
    }
}

/// `error {code, message}`.
pub fn error_frame(error: &Error) -> RealtimeEvent {
    RealtimeEvent::new(
        ERROR,
        &ErrorData {
            code: error.code(),
            message: error.message(),
            details: error.details(),
        },
    )
}
