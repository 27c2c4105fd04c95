//! PostgreSQL-backed `AuthTokenRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::User;
use crate::domain::ports::{AuthTokenRepository, AuthTokenRepositoryError, StoredToken};

use super::diesel_basic_error_mapping::basic_error_mapping;
use super::models::{NewAuthTokenRow, UserRow};
use super::pool::DbPool;
use super::schema::{auth_tokens, users};

basic_error_mapping!(AuthTokenRepositoryError);

/// Diesel-backed implementation of the [`AuthTokenRepository`] port.
#[derive(Clone)]
pub struct DieselAuthTokenRepository {
    pool: DbPool,
}

impl DieselAuthTokenRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthTokenRepository for DieselAuthTokenRepository {
    async fn store(&self, token: &StoredToken) -> Result<(), AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewAuthTokenRow {
            digest: &token.digest,
            user_id: *token.user_id.as_uuid(),
            created_at: token.created_at,
            expires_at: token.expires_at,
        };
        diesel::insert_into(auth_tokens::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_user(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::digest.eq(digest))
            .filter(auth_tokens::expires_at.gt(now))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn revoke(&self, digest: &str) -> Result<(), AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(auth_tokens::table.filter(auth_tokens::digest.eq(digest)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let purged = diesel::delete(auth_tokens::table.filter(auth_tokens::expires_at.le(now)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(purged).unwrap_or(0))
    }
}
