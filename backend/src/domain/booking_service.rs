//! Lesson booking workflow.
//!
//! A booking must fit inside a published availability slot and must not
//! overlap another pending or approved booking for the same teacher.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use super::profile_service::require_teacher;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, BookingRepositoryError, BookingService,
    RealtimePublisher, UserRepository,
};
use crate::domain::{
    AuthenticatedUser, BOOKING_MESSAGE_MAX, Booking, BookingRequest, BookingStatus, Error,
    RealtimeEvent, Role, RoomName, TimeSlot, events,
};

fn normalise_message(message: Option<String>) -> Result<Option<String>, Error> {
    let Some(message) = message.map(|text| text.trim().to_owned()) else {
        return Ok(None);
    };
    if message.is_empty() {
        return Ok(None);
    }
    if message.chars().count() > BOOKING_MESSAGE_MAX {
        return Err(Error::invalid_field(
            "message",
            "too_long",
            format!("message must be at most {BOOKING_MESSAGE_MAX} characters"),
        ));
    }
    Ok(Some(message))
}

/// Booking service implementing [`BookingService`].
#[derive(Clone)]
pub struct BookingServiceImpl<B, A, U> {
    bookings: Arc<B>,
    availability: Arc<A>,
    users: Arc<U>,
    publisher: Arc<dyn RealtimePublisher>,
    clock: Arc<dyn Clock>,
}

impl<B, A, U> BookingServiceImpl<B, A, U> {
    /// Wire the service to its repositories, publisher, and clock.
    pub fn new(
        bookings: Arc<B>,
        availability: Arc<A>,
        users: Arc<U>,
        publisher: Arc<dyn RealtimePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            availability,
            users,
            publisher,
            clock,
        }
    }

    fn announce_update(&self, booking: &Booking) {
        let event = RealtimeEvent::new(events::BOOKING_UPDATED, booking);
        self.publisher
            .emit_to_room(&RoomName::StudentBookings(booking.student_id), event.clone());
        self.publisher
            .emit_to_room(&RoomName::TeacherBookings(booking.teacher_id), event.clone());
        self.publisher.emit_to_user(&booking.student_id, event.clone());
        self.publisher.emit_to_user(&booking.teacher_id, event);
    }
}

impl<B, A, U> BookingServiceImpl<B, A, U>
where
    B: BookingRepository,
{
    async fn find(&self, booking_id: &Uuid) -> Result<Booking, Error> {
        self.bookings
            .find_by_id(booking_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))
    }
}

/// Conflict raised when an active booking already covers the slot.
fn slot_taken(slot: TimeSlot, date: NaiveDate) -> Error {
    Error::conflict(format!("{slot} on {date} is already booked"))
        .with_details(serde_json::json!({ "field": "slot", "code": "slot_taken" }))
}

#[async_trait]
impl<B, A, U> BookingService for BookingServiceImpl<B, A, U>
where
    B: BookingRepository,
    A: AvailabilityRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        student: &AuthenticatedUser,
        request: BookingRequest,
    ) -> Result<Booking, Error> {
        student.require_role(&[Role::Student])?;
        let teacher = require_teacher(self.users.as_ref(), &request.teacher_id).await?;
        let now = self.clock.utc();
        if request.date < now.date_naive() {
            return Err(Error::invalid_field(
                "date",
                "past_date",
                "bookings cannot be made for past dates",
            ));
        }
        let message = normalise_message(request.message)?;

        let offered = self
            .availability
            .find_for_date(&teacher.id, request.date)
            .await
            .map_err(Error::from)?
            .is_some_and(|day| day.offers(&request.slot));
        if !offered {
            return Err(Error::invalid_field(
                "slot",
                "slot_unavailable",
                format!("{} is not available on {}", request.slot, request.date),
            ));
        }

        let clash = self
            .bookings
            .list_active_on(&teacher.id, request.date)
            .await
            .map_err(Error::from)?
            .into_iter()
            .any(|existing| existing.slot.overlaps(&request.slot));
        if clash {
            return Err(slot_taken(request.slot, request.date));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            student_id: student.id,
            student_name: student.name.clone(),
            teacher_id: teacher.id,
            teacher_name: teacher.name.to_string(),
            date: request.date,
            slot: request.slot,
            message,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.bookings
            .insert(&booking)
            .await
            .map_err(|error| match error {
                BookingRepositoryError::SlotTaken { .. } => slot_taken(request.slot, request.date),
                other => Error::from(other),
            })?;
        info!(booking_id = %booking.id, teacher_id = %teacher.id, "booking requested");

        let event = RealtimeEvent::new(events::BOOKING_CREATED, &booking);
        self.publisher
            .emit_to_room(&RoomName::TeacherBookings(teacher.id), event.clone());
        self.publisher.emit_to_user(&teacher.id, event);
        Ok(booking)
    }

    async fn update_status(
        &self,
        actor: &AuthenticatedUser,
        booking_id: &Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error> {
        let mut booking = self.find(booking_id).await?;
        booking.check_transition(actor, status)?;
        let now = self.clock.utc();
        self.bookings
            .update_status(booking_id, booking.status, status, now)
            .await
            .map_err(Error::from)?;
        info!(
            booking_id = %booking.id,
            from = %booking.status,
            to = %status,
            actor = %actor.id,
            "booking status changed"
        );
        booking.status = status;
        booking.updated_at = now;
        self.announce_update(&booking);
        Ok(booking)
    }

    async fn list_for_student(&self, student: &AuthenticatedUser) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for_student(&student.id)
            .await
            .map_err(Error::from)
    }

    async fn list_for_teacher(
        &self,
        teacher: &AuthenticatedUser,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for_teacher(&teacher.id, status)
            .await
            .map_err(Error::from)
    }

    async fn get(&self, actor: &AuthenticatedUser, booking_id: &Uuid) -> Result<Booking, Error> {
        let booking = self.find(booking_id).await?;
        booking.ensure_visible_to(actor)?;
        Ok(booking)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
