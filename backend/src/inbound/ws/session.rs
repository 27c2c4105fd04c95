//! Per-connection WebSocket loop.
//!
//! Multiplexes three sources: client frames, events pushed through the room
//! hub, and the heartbeat timer. The public contract pings every 5s and
//! treats a connection as idle after 10s without client traffic; tests
//! shorten both.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ports::RealtimeGateway;
use crate::domain::{AuthenticatedUser, ConnectionId, RealtimeEvent};
use crate::inbound::ws::messages::{ClientFrame, ack_frame, error_frame};

#[cfg(not(test))]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_millis(300);

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HubClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

pub(super) struct WsSession {
    gateway: Arc<dyn RealtimeGateway>,
    user: AuthenticatedUser,
    connection: ConnectionId,
}

impl WsSession {
    pub(super) fn new(
        gateway: Arc<dyn RealtimeGateway>,
        user: AuthenticatedUser,
        connection: ConnectionId,
    ) -> Self {
        Self {
            gateway,
            user,
            connection,
        }
    }

    pub(super) async fn run(
        self,
        mut session: Session,
        mut stream: MessageStream,
        mut events: mpsc::Receiver<RealtimeEvent>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                event = events.recv() => match event {
                    Some(event) => Self::send(&mut session, &event).await,
                    None => Err(SessionError::HubClosed),
                },
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                self.gateway.disconnect(self.connection);
                if let Some(reason) = close_reason_for(error) {
                    if let Err(error) = session.close(reason).await {
                        warn!(error = %error, "failed to close socket");
                    }
                }
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            None => return Err(SessionError::StreamClosed),
            Some(Err(error)) => return Err(SessionError::Protocol(error)),
            Some(Ok(message)) => message,
        };
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => self.handle_text(session, text.as_ref()).await,
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => Ok(()),
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text(&self, session: &mut Session, text: &str) -> Result<(), SessionError> {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, connection = %self.connection, "rejected malformed socket frame");
                return Err(SessionError::InvalidPayload);
            }
        };
        let reply = frame.into_request().and_then(|request| {
            self.gateway.handle(self.connection, &self.user, request)
        });
        let reply = match reply {
            Ok(ack) => ack_frame(ack),
            Err(error) => {
                debug!(connection = %self.connection, code = ?error.code(), "socket request refused");
                error_frame(&error)
            }
        };
        Self::send(session, &reply).await
    }

    async fn send(session: &mut Session, event: &RealtimeEvent) -> Result<(), SessionError> {
        match serde_json::to_string(event) {
            Ok(body) => session.text(body).await.map_err(SessionError::Network),
            Err(error) => {
                warn!(error = %error, event = %event.event, "failed to serialise socket frame");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        let connection = self.connection;
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(%connection, "socket heartbeat timeout; closing");
            }
            SessionError::Protocol(error) => {
                warn!(%connection, error = %error, "socket protocol error");
            }
            SessionError::Network(error) => {
                warn!(%connection, error = %error, "socket send failed; closing");
            }
            SessionError::HubClosed => {
                warn!(%connection, "event stream ended; closing");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {
                debug!(%connection, "socket closed");
            }
        }
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    let reason = |code, description: &str| {
        Some(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
        SessionError::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
        SessionError::InvalidPayload => reason(CloseCode::Policy, "invalid payload"),
        SessionError::HubClosed => reason(CloseCode::Away, "server shutting down"),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
