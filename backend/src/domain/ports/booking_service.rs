//! Driving port for lesson bookings.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthenticatedUser, Booking, BookingRequest, BookingStatus, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Request a slot on behalf of the acting student.
    async fn create(
        &self,
        student: &AuthenticatedUser,
        request: BookingRequest,
    ) -> Result<Booking, Error>;

    async fn update_status(
        &self,
        actor: &AuthenticatedUser,
        booking_id: &Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error>;

    async fn list_for_student(&self, student: &AuthenticatedUser) -> Result<Vec<Booking>, Error>;

    async fn list_for_teacher(
        &self,
        teacher: &AuthenticatedUser,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error>;

    async fn get(&self, actor: &AuthenticatedUser, booking_id: &Uuid) -> Result<Booking, Error>;
}
