//! Driving port for direct messaging.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AuthenticatedUser, ConversationSummary, Error, Message, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageService: Send + Sync {
    async fn send(
        &self,
        sender: &AuthenticatedUser,
        recipient_id: &UserId,
        text: String,
    ) -> Result<Message, Error>;

    /// Messages with `other`, newest first.
    async fn conversation(
        &self,
        user: &AuthenticatedUser,
        other: &UserId,
        before: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, Error>;

    async fn conversations(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ConversationSummary>, Error>;

    /// Mark everything `other` sent to `user` as read.
    async fn mark_read(&self, user: &AuthenticatedUser, other: &UserId) -> Result<u64, Error>;
}
