//! Driving port for reading and editing user profiles.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Error, ProfileUpdate, TeacherFilter, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileService: Send + Sync {
    async fn get_me(&self, user_id: &UserId) -> Result<User, Error>;

    async fn update_me(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User, Error>;

    async fn list_teachers(
        &self,
        filter: TeacherFilter,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error>;

    /// Fetch a teacher profile; other roles read as not found.
    async fn get_teacher(&self, teacher_id: &UserId) -> Result<User, Error>;

    async fn set_profile_image(&self, user_id: &UserId, url: String) -> Result<User, Error>;
}
