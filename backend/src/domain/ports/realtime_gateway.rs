//! Driving port for socket room management.
//!
//! The WebSocket adapter forwards parsed client requests here; all join
//! authorisation happens behind this port.

use tokio::sync::mpsc;

use crate::domain::{
    AuthenticatedUser, ConnectionId, Error, GatewayAck, GatewayRequest, RealtimeEvent,
};

#[cfg_attr(test, mockall::automock)]
pub trait RealtimeGateway: Send + Sync {
    /// Register a connection and join its personal room.
    fn connect(&self, user: &AuthenticatedUser) -> (ConnectionId, mpsc::Receiver<RealtimeEvent>);

    /// Apply a join or leave request.
    fn handle(
        &self,
        connection: ConnectionId,
        user: &AuthenticatedUser,
        request: GatewayRequest,
    ) -> Result<GatewayAck, Error>;

    fn disconnect(&self, connection: ConnectionId);
}
