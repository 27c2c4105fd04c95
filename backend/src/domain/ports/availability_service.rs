//! Driving port for teacher availability.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{AuthenticatedUser, AvailabilityDay, Error, TimeSlot, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Replace the acting teacher's slots for `date`.
    async fn set_day(
        &self,
        teacher: &AuthenticatedUser,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
    ) -> Result<AvailabilityDay, Error>;

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityDay>, Error>;

    async fn delete_day(&self, teacher: &AuthenticatedUser, day_id: &Uuid) -> Result<(), Error>;
}
