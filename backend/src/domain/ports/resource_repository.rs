//! Port for teaching resource persistence and assignments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::{Resource, ResourceFilter, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by resource repository adapters.
    pub enum ResourceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "resource repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "resource repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn insert(&self, resource: &Resource) -> Result<(), ResourceRepositoryError>;

    async fn update(&self, resource: &Resource) -> Result<(), ResourceRepositoryError>;

    async fn delete(&self, id: &Uuid) -> Result<bool, ResourceRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Resource>, ResourceRepositoryError>;

    async fn list(
        &self,
        filter: &ResourceFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Resource>, u64), ResourceRepositoryError>;

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
    ) -> Result<Vec<Resource>, ResourceRepositoryError>;

    /// Assign to each student, ignoring existing assignments. Returns the
    /// students that were newly assigned.
    async fn assign(
        &self,
        resource_id: &Uuid,
        student_ids: &[UserId],
        assigned_at: DateTime<Utc>,
    ) -> Result<Vec<UserId>, ResourceRepositoryError>;

    async fn unassign(
        &self,
        resource_id: &Uuid,
        student_id: &UserId,
    ) -> Result<bool, ResourceRepositoryError>;

    async fn list_assigned(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Resource>, ResourceRepositoryError>;
}
