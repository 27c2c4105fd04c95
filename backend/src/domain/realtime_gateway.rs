//! Room membership rules for socket clients.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::ports::{RealtimeGateway, RoomRegistry};
use crate::domain::{
    AuthenticatedUser, ConnectionId, Error, GatewayAck, GatewayRequest, RealtimeEvent, Role,
    RoomName,
};

/// Gateway deciding which rooms a connection may enter.
#[derive(Clone)]
pub struct RealtimeGatewayImpl {
    rooms: Arc<dyn RoomRegistry>,
}

impl RealtimeGatewayImpl {
    /// Gateway over a room registry.
    pub fn new(rooms: Arc<dyn RoomRegistry>) -> Self {
        Self { rooms }
    }

    fn room_for(user: &AuthenticatedUser, request: GatewayRequest) -> Result<RoomName, Error> {
        match request {
            GatewayRequest::JoinChat { other_user_id }
            | GatewayRequest::LeaveChat { other_user_id } => {
                if other_user_id == user.id {
                    return Err(Error::invalid_field(
                        "otherUserId",
                        "self_chat",
                        "cannot open a chat with yourself",
                    ));
                }
                Ok(RoomName::chat(user.id, other_user_id))
            }
            GatewayRequest::JoinTeacherBookings => {
                user.require_role(&[Role::Teacher])?;
                Ok(RoomName::TeacherBookings(user.id))
            }
            GatewayRequest::JoinStudentBookings => {
                user.require_role(&[Role::Student])?;
                Ok(RoomName::StudentBookings(user.id))
            }
            GatewayRequest::JoinTeacherAvailability { teacher_id } => {
                Ok(RoomName::TeacherAvailability(teacher_id))
            }
        }
    }
}

impl RealtimeGateway for RealtimeGatewayImpl {
    fn connect(&self, user: &AuthenticatedUser) -> (ConnectionId, mpsc::Receiver<RealtimeEvent>) {
        let (connection, events) = self.rooms.connect(&user.id);
        self.rooms.join(connection, RoomName::User(user.id));
        debug!(%connection, user_id = %user.id, "socket connected");
        (connection, events)
    }

    fn handle(
        &self,
        connection: ConnectionId,
        user: &AuthenticatedUser,
        request: GatewayRequest,
    ) -> Result<GatewayAck, Error> {
        let room = Self::room_for(user, request)?;
        if matches!(request, GatewayRequest::LeaveChat { .. }) {
            self.rooms.leave(connection, &room);
            return Ok(GatewayAck::Left(room));
        }
        self.rooms.join(connection, room);
        debug!(%connection, %room, "joined room");
        Ok(GatewayAck::Joined(room))
    }

    fn disconnect(&self, connection: ConnectionId) {
        self.rooms.disconnect(connection);
        debug!(%connection, "socket disconnected");
    }
}
