//! Port for lesson inquiry persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Inquiry, InquiryStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inquiry repository adapters.
    pub enum InquiryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "inquiry repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "inquiry repository query failed: {message}",
        /// The row no longer holds the status the caller read.
        StatusChanged { id: String } => Conflict,
            "inquiry {id} was updated concurrently; reload and retry",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn insert(&self, inquiry: &Inquiry) -> Result<(), InquiryRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Inquiry>, InquiryRepositoryError>;

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<Inquiry>, InquiryRepositoryError>;

    async fn list_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Inquiry>, InquiryRepositoryError>;

    /// Move the inquiry from `from` to `to`; `StatusChanged` when the row
    /// no longer holds `from` or is gone.
    async fn update_status(
        &self,
        id: &Uuid,
        from: InquiryStatus,
        to: InquiryStatus,
    ) -> Result<(), InquiryRepositoryError>;
}
