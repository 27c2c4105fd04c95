//! Driving port for registration, login, and token resolution.
//!
//! Inbound adapters (HTTP handlers, the WebSocket handshake) call this port
//! so that they never see password hashes or token storage.

use async_trait::async_trait;

use crate::domain::{
    AuthSession, AuthToken, AuthenticatedUser, Error, LoginCredentials, RegistrationRequest,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and issue its first token.
    async fn register(&self, request: RegistrationRequest) -> Result<AuthSession, Error>;

    /// Verify credentials and issue a token.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Resolve a presented bearer token.
    async fn authenticate(&self, token: &AuthToken) -> Result<AuthenticatedUser, Error>;

    /// Revoke a bearer token.
    async fn logout(&self, token: &AuthToken) -> Result<(), Error>;

    /// Create the bootstrap admin account unless the email is taken.
    /// Returns whether an account was created.
    async fn ensure_admin(&self, credentials: LoginCredentials) -> Result<bool, Error>;
}
