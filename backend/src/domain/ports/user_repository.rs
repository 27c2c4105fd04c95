//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{EmailAddress, TeacherFilter, User, UserFilter, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => Conflict, "email {email} is already registered",
    }
}

/// Stored user together with its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn insert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError>;

    /// Persist name, profile, and `updated_at` changes.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch several users at once; unknown ids are skipped.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// Look up login material by normalised email.
    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// Page through teachers matching `filter`, returning the page and total.
    async fn list_teachers(
        &self,
        filter: &TeacherFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, u64), UserPersistenceError>;

    /// Page through all users for the admin panel.
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, u64), UserPersistenceError>;

    /// Delete an account; returns whether a row was removed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}
