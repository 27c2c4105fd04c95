//! Port for booking persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "booking repository query failed: {message}",
        /// An active booking already holds an overlapping slot.
        SlotTaken { teacher_id: String, date: String } => Conflict,
            "teacher {teacher_id} already has an overlapping booking on {date}",
        /// The row no longer holds the status the caller read.
        StatusChanged { id: String } => Conflict,
            "booking {id} was updated concurrently; reload and retry",
    }
}

/// Port for writing and reading bookings.
///
/// Returned bookings carry the student and teacher display names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Store a new booking; `SlotTaken` when an active booking of the same
    /// teacher overlaps it.
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError>;

    /// A student's bookings, newest date first.
    async fn list_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// A teacher's bookings, newest date first, optionally by status.
    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Pending and approved bookings holding slots on `date`.
    async fn list_active_on(
        &self,
        teacher_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Move the booking from `from` to `to`; `StatusChanged` when the row
    /// no longer holds `from` or is gone.
    async fn update_status(
        &self,
        id: &Uuid,
        from: BookingStatus,
        to: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), BookingRepositoryError>;

    /// Page through every booking for the admin panel.
    async fn list_all(
        &self,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), BookingRepositoryError>;
}
