//! Direct messages and per-counterpart conversation summaries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::UserId;

pub const MESSAGE_TEXT_MAX: usize = 2000;
pub const CONVERSATION_LIMIT_DEFAULT: u32 = 50;
pub const CONVERSATION_LIMIT_MAX: u32 = 100;

/// Validation failures for message payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageValidationError {
    #[error("text must not be empty")]
    EmptyText,
    #[error("text must be at most {max} characters")]
    TextTooLong { max: usize },
    #[error("cannot send a message to yourself")]
    SelfMessage,
}

impl MessageValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyText | Self::TextTooLong { .. } => "text",
            Self::SelfMessage => "recipientId",
        }
    }
}

/// One message between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub text: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Validate the text and build an unread message.
    pub fn new(
        sender_id: UserId,
        recipient_id: UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, MessageValidationError> {
        if sender_id == recipient_id {
            return Err(MessageValidationError::SelfMessage);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MessageValidationError::EmptyText);
        }
        if trimmed.chars().count() > MESSAGE_TEXT_MAX {
            return Err(MessageValidationError::TextTooLong {
                max: MESSAGE_TEXT_MAX,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            text: trimmed.to_owned(),
            read_at: None,
            created_at: now,
        })
    }

    /// The participant that is not `user`.
    pub fn counterpart(&self, user: &UserId) -> UserId {
        if self.sender_id == *user {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

/// Latest state of a conversation with one counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub other_user_id: UserId,
    pub other_user_name: String,
    pub last_message: Message,
    pub unread_count: u64,
}

/// Clamp a requested page size into `1..=CONVERSATION_LIMIT_MAX`.
pub fn clamp_conversation_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(CONVERSATION_LIMIT_DEFAULT)
        .clamp(1, CONVERSATION_LIMIT_MAX)
}

/// Group `messages` by counterpart, newest conversation first.
///
/// `names` resolves counterpart display names; unknown users are labelled
/// as deleted accounts.
pub fn summarise_conversations(
    user: &UserId,
    messages: Vec<Message>,
    names: &HashMap<UserId, String>,
) -> Vec<ConversationSummary> {
    let mut by_counterpart: HashMap<UserId, ConversationSummary> = HashMap::new();
    for message in messages {
        let other = message.counterpart(user);
        let unread = u64::from(message.recipient_id == *user && message.read_at.is_none());
        match by_counterpart.get_mut(&other) {
            Some(summary) => {
                summary.unread_count += unread;
                if message.created_at > summary.last_message.created_at {
                    summary.last_message = message;
                }
            }
            None => {
                let other_user_name = names
                    .get(&other)
                    .cloned()
                    .unwrap_or_else(|| "Deleted user".to_owned());
                by_counterpart.insert(
                    other,
                    ConversationSummary {
                        other_user_id: other,
                        other_user_name,
                        last_message: message,
                        unread_count: unread,
                    },
                );
            }
        }
    }
    let mut summaries: Vec<ConversationSummary> = by_counterpart.into_values().collect();
    summaries.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    summaries
}

impl From<MessageValidationError> for super::Error {
    fn from(err: MessageValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}
