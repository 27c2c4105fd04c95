//! Profile reads and edits.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;

use crate::domain::ports::{UserPersistenceError, UserProfileService, UserRepository};
use crate::domain::{Error, ProfileUpdate, Role, TeacherFilter, User, UserId};

/// Duplicate emails additionally name the offending field.
pub(super) fn map_user_error(error: UserPersistenceError) -> Error {
    let duplicate = matches!(error, UserPersistenceError::DuplicateEmail { .. });
    let mapped = Error::from(error);
    if duplicate {
        mapped.with_details(serde_json::json!({ "field": "email", "code": "duplicate_email" }))
    } else {
        mapped
    }
}

/// Load a user that must exist.
pub(super) async fn require_user<U>(users: &U, id: &UserId) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    users
        .find_by_id(id)
        .await
        .map_err(map_user_error)?
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

/// Load a user that must exist and hold the teacher role.
pub(super) async fn require_teacher<U>(users: &U, id: &UserId) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    match users.find_by_id(id).await.map_err(map_user_error)? {
        Some(user) if user.role == Role::Teacher => Ok(user),
        _ => Err(Error::not_found(format!("teacher {id} not found"))),
    }
}

/// Profile service implementing [`UserProfileService`].
#[derive(Clone)]
pub struct UserProfileServiceImpl<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U> UserProfileServiceImpl<U> {
    /// Wire the service to its repository and clock.
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

#[async_trait]
impl<U> UserProfileService for UserProfileServiceImpl<U>
where
    U: UserRepository,
{
    async fn get_me(&self, user_id: &UserId) -> Result<User, Error> {
        require_user(self.users.as_ref(), user_id).await
    }

    async fn update_me(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        let mut user = require_user(self.users.as_ref(), user_id).await?;
        user.apply(update, self.clock.utc())?;
        self.users.update(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    async fn list_teachers(
        &self,
        filter: TeacherFilter,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error> {
        let (teachers, total) = self
            .users
            .list_teachers(&filter, &page)
            .await
            .map_err(map_user_error)?;
        Ok(Paginated::new(teachers, page, total))
    }

    async fn get_teacher(&self, teacher_id: &UserId) -> Result<User, Error> {
        require_teacher(self.users.as_ref(), teacher_id).await
    }

    async fn set_profile_image(&self, user_id: &UserId, url: String) -> Result<User, Error> {
        let mut user = require_user(self.users.as_ref(), user_id).await?;
        user.profile.profile_image_url = Some(url);
        user.updated_at = self.clock.utc();
        self.users.update(&user).await.map_err(map_user_error)?;
        Ok(user)
    }
}
