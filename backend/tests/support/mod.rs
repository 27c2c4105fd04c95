//! Shared doubles for integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use musiconthego::domain::ports::AuthService;
use musiconthego::domain::{
    AuthSession, AuthToken, AuthenticatedUser, Error, LoginCredentials, RealtimeGatewayImpl,
    RegistrationRequest, Role, UserId,
};
use musiconthego::inbound::ws::origin::OriginPolicy;
use musiconthego::inbound::ws::state::WsState;
use musiconthego::outbound::realtime::RoomHub;

/// Bearer token accepted by [`SingleTokenAuth`].
pub const VALID_TOKEN: &str = "student-token";

/// Auth double that knows exactly one token.
pub struct SingleTokenAuth {
    pub user: AuthenticatedUser,
}

impl Default for SingleTokenAuth {
    fn default() -> Self {
        Self {
            user: AuthenticatedUser {
                id: UserId::random(),
                role: Role::Student,
                name: "Sam Student".to_owned(),
            },
        }
    }
}

#[async_trait]
impl AuthService for SingleTokenAuth {
    async fn register(&self, _request: RegistrationRequest) -> Result<AuthSession, Error> {
        Err(Error::internal("not used in socket tests"))
    }

    async fn login(&self, _credentials: LoginCredentials) -> Result<AuthSession, Error> {
        Err(Error::internal("not used in socket tests"))
    }

    async fn authenticate(&self, token: &AuthToken) -> Result<AuthenticatedUser, Error> {
        if token.expose() == VALID_TOKEN {
            Ok(self.user.clone())
        } else {
            Err(Error::unauthorized("invalid or expired token"))
        }
    }

    async fn logout(&self, _token: &AuthToken) -> Result<(), Error> {
        Ok(())
    }

    async fn ensure_admin(&self, _credentials: LoginCredentials) -> Result<bool, Error> {
        Ok(false)
    }
}

/// Socket state over a real room hub with the given origin allow-list.
pub fn ws_state(origins: &[&str]) -> WsState {
    let hub = Arc::new(RoomHub::default());
    WsState::new(
        Arc::new(SingleTokenAuth::default()),
        Arc::new(RealtimeGatewayImpl::new(hub)),
        OriginPolicy::new(origins).expect("valid origins"),
    )
}
