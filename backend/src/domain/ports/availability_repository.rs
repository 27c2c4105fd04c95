//! Port for teacher availability persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{AvailabilityDay, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by availability repository adapters.
    pub enum AvailabilityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "availability repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError,
            "availability repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Insert or replace the slots for `(teacher, date)`, returning the stored
    /// row (which keeps its original id when replacing).
    async fn upsert(&self, day: &AvailabilityDay)
    -> Result<AvailabilityDay, AvailabilityRepositoryError>;

    /// Days for a teacher ordered by date, optionally from a start date.
    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityDay>, AvailabilityRepositoryError>;

    async fn find_by_id(&self, id: &Uuid)
    -> Result<Option<AvailabilityDay>, AvailabilityRepositoryError>;

    async fn find_for_date(
        &self,
        teacher_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityDay>, AvailabilityRepositoryError>;

    /// Delete a day; returns whether a row was removed.
    async fn delete(&self, id: &Uuid) -> Result<bool, AvailabilityRepositoryError>;
}
