//! PostgreSQL-backed `UserRepository`.
//!
//! Emails are stored in their normalised form, so the `users_email_key`
//! unique index enforces one account per address regardless of input case.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Array, Text};
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, Role, TeacherFilter, User, UserFilter, UserId};

use super::diesel_basic_error_mapping::{basic_error_mapping, is_unique_violation};
use super::diesel_helpers::{contains_pattern, page_window};
use super::models::{NewUserRow, UserChangeset, UserRow, from_db_count};
use super::pool::DbPool;
use super::schema::users;

basic_error_mapping!(UserPersistenceError);

diesel::define_sql_function! {
    /// Joins a text array so it can be matched with `ILIKE`.
    fn array_to_string(array: Array<Text>, delimiter: Text) -> Text;
}

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn teacher_filter<'a, ST>(
    mut query: users::BoxedQuery<'a, Pg, ST>,
    filter: &TeacherFilter,
) -> users::BoxedQuery<'a, Pg, ST> {
    query = query.filter(users::role.eq(Role::Teacher.as_str()));
    if let Some(instrument) = &filter.instrument {
        query = query.filter(
            array_to_string(users::instruments, ",").ilike(contains_pattern(instrument)),
        );
    }
    if let Some(location) = &filter.location {
        query = query.filter(users::location.ilike(contains_pattern(location)));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            users::name
                .ilike(pattern.clone())
                .or(users::bio.ilike(pattern.clone()))
                .or(array_to_string(users::instruments, ",").ilike(pattern)),
        );
    }
    query
}

fn user_filter<'a, ST>(
    mut query: users::BoxedQuery<'a, Pg, ST>,
    filter: &UserFilter,
) -> users::BoxedQuery<'a, Pg, ST> {
    if let Some(role) = filter.role {
        query = query.filter(users::role.eq(role.as_str()));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            users::name
                .ilike(pattern.clone())
                .or(users::email.ilike(pattern)),
        );
    }
    query
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>, UserPersistenceError> {
    rows.into_iter()
        .map(|row| User::try_from(row).map_err(UserPersistenceError::from))
        .collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow::new(user, password_hash);
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email.to_string())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(*user.id.as_uuid()))
            .set(UserChangeset::from(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<_> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_users(rows)
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = users::table
            .filter(users::email.eq(email.to_string()))
            .select((UserRow::as_select(), users::password_hash))
            .first::<(UserRow, String)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some((row, password_hash)) = found else {
            return Ok(None);
        };
        Ok(Some(StoredCredentials {
            user: User::try_from(row)?,
            password_hash,
        }))
    }

    async fn list_teachers(
        &self,
        filter: &TeacherFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, u64), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total = teacher_filter(users::table.count().into_boxed(), filter)
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let (limit, offset) = page_window(page);
        let rows = teacher_filter(users::table.select(UserRow::as_select()).into_boxed(), filter)
            .order((users::name.asc(), users::id.asc()))
            .limit(limit)
            .offset(offset)
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((into_users(rows)?, from_db_count(total)))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, u64), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total = user_filter(users::table.count().into_boxed(), filter)
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let (limit, offset) = page_window(page);
        let rows = user_filter(users::table.select(UserRow::as_select()).into_boxed(), filter)
            .order((users::created_at.desc(), users::id.asc()))
            .limit(limit)
            .offset(offset)
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((into_users(rows)?, from_db_count(total)))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
