//! Lesson bookings and their status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthenticatedUser, Error, Role, TimeSlot, UserId};

/// Maximum length of the optional note attached to a booking request.
pub const BOOKING_MESSAGE_MAX: usize = 1000;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and approved bookings hold their slot.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be one of pending, approved, rejected, or cancelled")]
pub struct BookingStatusParseError;

impl FromStr for BookingStatus {
    type Err = BookingStatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or(BookingStatusParseError)
    }
}

/// A student's request for a lesson slot with a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub student_id: UserId,
    pub student_name: String,
    pub teacher_id: UserId,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// True for the booking's student or teacher.
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.student_id == *user || self.teacher_id == *user
    }

    /// Check that `actor` may read this booking.
    pub fn ensure_visible_to(&self, actor: &AuthenticatedUser) -> Result<(), Error> {
        if actor.is_admin() || self.is_participant(&actor.id) {
            Ok(())
        } else {
            Err(Error::forbidden("only booking participants may view this booking"))
        }
    }

    /// Validate a status change requested by `actor`.
    ///
    /// | From                 | To                   | Actor                 |
    /// |----------------------|----------------------|-----------------------|
    /// | pending              | approved, rejected   | booking teacher       |
    /// | pending, approved    | cancelled            | participant or admin  |
    pub fn check_transition(
        &self,
        actor: &AuthenticatedUser,
        next: BookingStatus,
    ) -> Result<(), Error> {
        let is_teacher = self.teacher_id == actor.id;
        let may_cancel = self.is_participant(&actor.id) || actor.role == Role::Admin;
        if !may_cancel {
            return Err(Error::forbidden(
                "only booking participants may change its status",
            ));
        }

        match (self.status, next) {
            (BookingStatus::Pending, BookingStatus::Approved | BookingStatus::Rejected) => {
                if is_teacher {
                    Ok(())
                } else {
                    Err(Error::forbidden(format!(
                        "only the teacher may mark a booking {next}"
                    )))
                }
            }
            (BookingStatus::Pending | BookingStatus::Approved, BookingStatus::Cancelled) => Ok(()),
            (current, requested) => Err(Error::conflict(format!(
                "booking cannot move from {current} to {requested}"
            ))),
        }
    }
}

/// Validated request to book a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub teacher_id: UserId,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    //! Status transition rules.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            student_id: UserId::random(),
            student_name: "Sam Student".to_owned(),
            teacher_id: UserId::random(),
            teacher_name: "Tia Teacher".to_owned(),
            date: now.date_naive(),
            slot: TimeSlot::parse("10:00", "11:00").expect("valid slot"),
            message: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    fn actor(id: UserId, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            role,
            name: "Actor".to_owned(),
        }
    }

    #[rstest]
    #[case(BookingStatus::Approved)]
    #[case(BookingStatus::Rejected)]
    #[case(BookingStatus::Cancelled)]
    fn teacher_may_decide_pending(booking: Booking, #[case] next: BookingStatus) {
        let teacher = actor(booking.teacher_id, Role::Teacher);
        assert!(booking.check_transition(&teacher, next).is_ok());
    }

    #[rstest]
    fn student_may_not_approve(booking: Booking) {
        let student = actor(booking.student_id, Role::Student);
        let err = booking
            .check_transition(&student, BookingStatus::Approved)
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    fn student_may_cancel_approved(mut booking: Booking) {
        booking.status = BookingStatus::Approved;
        let student = actor(booking.student_id, Role::Student);
        assert!(booking.check_transition(&student, BookingStatus::Cancelled).is_ok());
    }

    #[rstest]
    #[case(BookingStatus::Rejected, BookingStatus::Approved)]
    #[case(BookingStatus::Cancelled, BookingStatus::Cancelled)]
    #[case(BookingStatus::Approved, BookingStatus::Rejected)]
    #[case(BookingStatus::Pending, BookingStatus::Pending)]
    fn invalid_transitions_conflict(
        mut booking: Booking,
        #[case] from: BookingStatus,
        #[case] to: BookingStatus,
    ) {
        booking.status = from;
        let teacher = actor(booking.teacher_id, Role::Teacher);
        let err = booking.check_transition(&teacher, to).expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    fn outsiders_are_forbidden_but_admins_may_cancel(booking: Booking) {
        let outsider = actor(UserId::random(), Role::Teacher);
        let err = booking
            .check_transition(&outsider, BookingStatus::Cancelled)
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let admin = actor(UserId::random(), Role::Admin);
        assert!(booking.check_transition(&admin, BookingStatus::Cancelled).is_ok());
        assert!(booking.ensure_visible_to(&admin).is_ok());
        assert!(booking.ensure_visible_to(&outsider).is_err());
    }

    #[rstest]
    fn parses_status_case_insensitively() {
        assert_eq!("Approved".parse(), Ok(BookingStatus::Approved));
        assert_eq!("done".parse::<BookingStatus>(), Err(BookingStatusParseError));
    }
}
