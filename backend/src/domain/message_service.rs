//! Direct messaging between users.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use tracing::debug;

use super::profile_service::{map_user_error, require_user};
use crate::domain::ports::{MessageRepository, MessageService, RealtimePublisher, UserRepository};
use crate::domain::{
    AuthenticatedUser, ConversationSummary, Error, Message, RealtimeEvent, RoomName, UserId,
    clamp_conversation_limit, events, summarise_conversations,
};

/// How many recent messages feed the conversation list.
const RECENT_MESSAGE_WINDOW: u32 = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessagesRead {
    reader_id: UserId,
    sender_id: UserId,
    count: u64,
    read_at: DateTime<Utc>,
}

/// Messaging service implementing [`MessageService`].
#[derive(Clone)]
pub struct MessageServiceImpl<M, U> {
    messages: Arc<M>,
    users: Arc<U>,
    publisher: Arc<dyn RealtimePublisher>,
    clock: Arc<dyn Clock>,
}

impl<M, U> MessageServiceImpl<M, U> {
    /// Wire the service to its repositories, publisher, and clock.
    pub fn new(
        messages: Arc<M>,
        users: Arc<U>,
        publisher: Arc<dyn RealtimePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            users,
            publisher,
            clock,
        }
    }
}

#[async_trait]
impl<M, U> MessageService for MessageServiceImpl<M, U>
where
    M: MessageRepository,
    U: UserRepository,
{
    async fn send(
        &self,
        sender: &AuthenticatedUser,
        recipient_id: &UserId,
        text: String,
    ) -> Result<Message, Error> {
        let message = Message::new(sender.id, *recipient_id, &text, self.clock.utc())?;
        require_user(self.users.as_ref(), recipient_id).await?;
        self.messages
            .insert(&message)
            .await
            .map_err(Error::from)?;
        debug!(message_id = %message.id, sender = %sender.id, recipient = %recipient_id, "message sent");

        let event = RealtimeEvent::new(events::NEW_MESSAGE, &message);
        self.publisher
            .emit_to_room(&RoomName::chat(sender.id, *recipient_id), event.clone());
        self.publisher.emit_to_user(recipient_id, event);
        Ok(message)
    }

    async fn conversation(
        &self,
        user: &AuthenticatedUser,
        other: &UserId,
        before: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, Error> {
        self.messages
            .conversation(&user.id, other, before, clamp_conversation_limit(limit))
            .await
            .map_err(Error::from)
    }

    async fn conversations(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ConversationSummary>, Error> {
        let recent = self
            .messages
            .recent_for_user(&user.id, RECENT_MESSAGE_WINDOW)
            .await
            .map_err(Error::from)?;
        let counterparts: Vec<UserId> = recent
            .iter()
            .map(|message| message.counterpart(&user.id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<UserId, String> = if counterparts.is_empty() {
            HashMap::new()
        } else {
            self.users
                .find_many(&counterparts)
                .await
                .map_err(map_user_error)?
                .into_iter()
                .map(|found| (found.id, found.name.to_string()))
                .collect()
        };
        Ok(summarise_conversations(&user.id, recent, &names))
    }

    async fn mark_read(&self, user: &AuthenticatedUser, other: &UserId) -> Result<u64, Error> {
        let now = self.clock.utc();
        let count = self
            .messages
            .mark_read(&user.id, other, now)
            .await
            .map_err(Error::from)?;
        if count > 0 {
            self.publisher.emit_to_room(
                &RoomName::chat(user.id, *other),
                RealtimeEvent::new(
                    events::MESSAGES_READ,
                    &MessagesRead {
                        reader_id: user.id,
                        sender_id: *other,
                        count,
                        read_at: now,
                    },
                ),
            );
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    //! Messaging behaviour and emitted events.
    use super::*;
    use crate::domain::ports::{MockMessageRepository, MockUserRepository};
    use crate::domain::{ErrorCode, Role};
    use crate::test_support::{RecordingPublisher, actor, fixture_clock, fixture_now, sample_user};

    fn service(
        messages: MockMessageRepository,
        users: MockUserRepository,
        publisher: Arc<RecordingPublisher>,
    ) -> MessageServiceImpl<MockMessageRepository, MockUserRepository> {
        MessageServiceImpl::new(Arc::new(messages), Arc::new(users), publisher, fixture_clock())
    }

    #[tokio::test]
    async fn send_emits_to_chat_and_recipient() {
        let sender = sample_user(Role::Student, "Sam Student");
        let recipient = sample_user(Role::Teacher, "Tess Teacher");
        let recipient_id = recipient.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(recipient)));
        let mut messages = MockMessageRepository::new();
        messages.expect_insert().times(1).return_once(|_| Ok(()));
        let publisher = Arc::new(RecordingPublisher::default());

        let sent = service(messages, users, publisher.clone())
            .send(&actor(&sender), &recipient_id, " Hello! ".to_owned())
            .await
            .expect("send succeeds");

        assert_eq!(sent.text, "Hello!");
        assert_eq!(
            publisher.emitted(),
            vec![
                (RoomName::chat(sender.id, recipient_id).to_string(), events::NEW_MESSAGE.to_owned()),
                (format!("user:{recipient_id}"), events::NEW_MESSAGE.to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn send_rejects_self_messages_without_lookup() {
        let sender = sample_user(Role::Student, "Sam Student");
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(0);

        let err = service(MockMessageRepository::new(), users, Arc::default())
            .send(&actor(&sender), &sender.id, "hi".to_owned())
            .await
            .expect_err("self message");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn send_requires_existing_recipient() {
        let sender = sample_user(Role::Student, "Sam Student");
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().return_once(|_| Ok(None));
        let mut messages = MockMessageRepository::new();
        messages.expect_insert().times(0);

        let err = service(messages, users, Arc::default())
            .send(&actor(&sender), &UserId::random(), "hi".to_owned())
            .await
            .expect_err("unknown recipient");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn conversation_clamps_limit() {
        let user = sample_user(Role::Student, "Sam Student");
        let mut messages = MockMessageRepository::new();
        messages
            .expect_conversation()
            .withf(|_, _, _, limit| *limit == 100)
            .return_once(|_, _, _, _| Ok(Vec::new()));

        service(messages, MockUserRepository::new(), Arc::default())
            .conversation(&actor(&user), &UserId::random(), None, Some(5000))
            .await
            .expect("conversation loads");
    }

    #[tokio::test]
    async fn conversations_resolve_counterpart_names() {
        let user = sample_user(Role::Student, "Sam Student");
        let teacher = sample_user(Role::Teacher, "Tess Teacher");
        let incoming = Message::new(teacher.id, user.id, "See you", fixture_now()).expect("valid");
        let mut messages = MockMessageRepository::new();
        messages
            .expect_recent_for_user()
            .return_once(move |_, _| Ok(vec![incoming]));
        let mut users = MockUserRepository::new();
        let found = vec![teacher.clone()];
        users.expect_find_many().return_once(move |_| Ok(found));

        let summaries = service(messages, users, Arc::default())
            .conversations(&actor(&user))
            .await
            .expect("summaries load");

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].other_user_name, "Tess Teacher");
        assert_eq!(summaries[0].unread_count, 1);
    }

    #[tokio::test]
    async fn mark_read_only_announces_changes() {
        let user = sample_user(Role::Student, "Sam Student");
        let mut messages = MockMessageRepository::new();
        messages.expect_mark_read().return_once(|_, _, _| Ok(0));
        let publisher = Arc::new(RecordingPublisher::default());

        let count = service(messages, MockUserRepository::new(), publisher.clone())
            .mark_read(&actor(&user), &UserId::random())
            .await
            .expect("mark read succeeds");

        assert_eq!(count, 0);
        assert!(publisher.emitted().is_empty());
    }
}
