//! Port for bearer token storage.
//!
//! Adapters only ever see token digests, never the raw value handed to the
//! client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token repository adapters.
    pub enum AuthTokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "token repository query failed: {message}",
    }
}

/// Token row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub digest: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    /// Persist a freshly issued token.
    async fn store(&self, token: &StoredToken) -> Result<(), AuthTokenRepositoryError>;

    /// Resolve an unexpired token digest to its owner in one lookup.
    async fn find_user(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthTokenRepositoryError>;

    /// Delete a token; unknown digests are ignored.
    async fn revoke(&self, digest: &str) -> Result<(), AuthTokenRepositoryError>;

    /// Delete every token that expired before `now`, returning the count.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthTokenRepositoryError>;
}
