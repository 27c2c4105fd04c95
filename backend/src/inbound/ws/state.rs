//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::ports::{AuthService, RealtimeGateway};
use crate::inbound::ws::origin::OriginPolicy;

/// Dependency bundle for the socket entry point and its sessions.
#[derive(Clone)]
pub struct WsState {
    pub auth: Arc<dyn AuthService>,
    pub gateway: Arc<dyn RealtimeGateway>,
    pub origins: OriginPolicy,
}

impl WsState {
    /// Bundle the gateway, authenticator, and origin policy.
    pub fn new(
        auth: Arc<dyn AuthService>,
        gateway: Arc<dyn RealtimeGateway>,
        origins: OriginPolicy,
    ) -> Self {
        Self {
            auth,
            gateway,
            origins,
        }
    }
}
