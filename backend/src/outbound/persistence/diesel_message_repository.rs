//! PostgreSQL-backed `MessageRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MessageRepository, MessageRepositoryError};
use crate::domain::{Message, UserId};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::models::MessageRow;
use super::pool::DbPool;
use super::schema::messages;

basic_error_mapping!(MessageRepositoryError);

/// Diesel-backed implementation of the [`MessageRepository`] port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(messages::table)
            .values(&MessageRow::from(message))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn conversation(
        &self,
        user: &UserId,
        other: &UserId,
        before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        let (user, other) = (*user.as_uuid(), *other.as_uuid());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = messages::table
            .filter(
                messages::sender_id
                    .eq(user)
                    .and(messages::recipient_id.eq(other))
                    .or(messages::sender_id
                        .eq(other)
                        .and(messages::recipient_id.eq(user))),
            )
            .select(MessageRow::as_select())
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(i64::from(limit))
            .into_boxed();
        if let Some(before) = before {
            query = query.filter(messages::created_at.lt(before));
        }
        let rows = query
            .load::<MessageRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn recent_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        let user = *user.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = messages::table
            .filter(messages::sender_id.eq(user).or(messages::recipient_id.eq(user)))
            .select(MessageRow::as_select())
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(i64::from(limit))
            .load::<MessageRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn mark_read(
        &self,
        reader: &UserId,
        sender: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            messages::table
                .filter(messages::sender_id.eq(*sender.as_uuid()))
                .filter(messages::recipient_id.eq(*reader.as_uuid()))
                .filter(messages::read_at.is_null()),
        )
        .set(messages::read_at.eq(Some(read_at)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(u64::try_from(updated).unwrap_or(0))
    }
}
