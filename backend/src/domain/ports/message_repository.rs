//! Port for direct message persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Message, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message repository adapters.
    pub enum MessageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "message repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<(), MessageRepositoryError>;

    /// Messages between two users, newest first, strictly before `before`.
    async fn conversation(
        &self,
        user: &UserId,
        other: &UserId,
        before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Message>, MessageRepositoryError>;

    /// Most recent messages sent or received by `user`.
    async fn recent_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<Message>, MessageRepositoryError>;

    /// Mark messages from `sender` to `reader` as read; returns the count.
    async fn mark_read(
        &self,
        reader: &UserId,
        sender: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, MessageRepositoryError>;
}
