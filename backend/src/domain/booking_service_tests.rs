//! Tests for the booking service.

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    BookingRepositoryError, MockAvailabilityRepository, MockBookingRepository, MockUserRepository,
};
use crate::domain::{AvailabilityDay, ErrorCode, TimeSlot, User};
use crate::test_support::{RecordingPublisher, actor, fixture_clock, fixture_now, sample_user};

type Service = BookingServiceImpl<MockBookingRepository, MockAvailabilityRepository, MockUserRepository>;

struct Harness {
    bookings: MockBookingRepository,
    availability: MockAvailabilityRepository,
    users: MockUserRepository,
    publisher: Arc<RecordingPublisher>,
}

impl Harness {
    fn new() -> Self {
        Self {
            bookings: MockBookingRepository::new(),
            availability: MockAvailabilityRepository::new(),
            users: MockUserRepository::new(),
            publisher: Arc::new(RecordingPublisher::default()),
        }
    }

    fn with_teacher(mut self, teacher: &User) -> Self {
        let teacher = teacher.clone();
        self.users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(teacher.clone())));
        self
    }

    fn with_slots(mut self, teacher: &User, slots: Vec<TimeSlot>) -> Self {
        let day = AvailabilityDay::new(Uuid::new_v4(), teacher.id, lesson_date(), slots, fixture_now())
            .expect("valid day");
        self.availability
            .expect_find_for_date()
            .returning(move |_, _| Ok(Some(day.clone())));
        self
    }

    fn build(self) -> (Service, Arc<RecordingPublisher>) {
        let publisher = self.publisher.clone();
        let service = BookingServiceImpl::new(
            Arc::new(self.bookings),
            Arc::new(self.availability),
            Arc::new(self.users),
            self.publisher,
            fixture_clock(),
        );
        (service, publisher)
    }
}

fn slot(start: &str, end: &str) -> TimeSlot {
    TimeSlot::parse(start, end).expect("valid slot")
}

fn lesson_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
}

fn request(teacher: &User, slot: TimeSlot) -> BookingRequest {
    BookingRequest {
        teacher_id: teacher.id,
        date: lesson_date(),
        slot,
        message: Some("  First lesson  ".to_owned()),
    }
}

fn booking(student: &User, teacher: &User, status: BookingStatus) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        student_id: student.id,
        student_name: student.name.to_string(),
        teacher_id: teacher.id,
        teacher_name: teacher.name.to_string(),
        date: lesson_date(),
        slot: slot("10:00", "11:00"),
        message: None,
        status,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

#[tokio::test]
async fn create_persists_pending_booking_and_notifies_teacher() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let mut harness = Harness::new()
        .with_teacher(&teacher)
        .with_slots(&teacher, vec![slot("09:00", "12:00")]);
    harness
        .bookings
        .expect_list_active_on()
        .return_once(|_, _| Ok(Vec::new()));
    harness
        .bookings
        .expect_insert()
        .withf(|booking| booking.status == BookingStatus::Pending)
        .times(1)
        .return_once(|_| Ok(()));
    let (service, publisher) = harness.build();

    let created = service
        .create(&actor(&student), request(&teacher, slot("10:00", "11:00")))
        .await
        .expect("booking succeeds");

    assert_eq!(created.message.as_deref(), Some("First lesson"));
    assert_eq!(created.teacher_name, "Tess Teacher");
    assert_eq!(
        publisher.emitted(),
        vec![
            (format!("teacher-bookings:{}", teacher.id), events::BOOKING_CREATED.to_owned()),
            (format!("user:{}", teacher.id), events::BOOKING_CREATED.to_owned()),
        ]
    );
}

#[tokio::test]
async fn create_rejects_slots_outside_availability() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let mut harness = Harness::new()
        .with_teacher(&teacher)
        .with_slots(&teacher, vec![slot("09:00", "10:00")]);
    harness.bookings.expect_insert().times(0);
    let (service, _) = harness.build();

    let err = service
        .create(&actor(&student), request(&teacher, slot("09:30", "10:30")))
        .await
        .expect_err("slot not offered");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|details| details.get("code")),
        Some(&serde_json::json!("slot_unavailable"))
    );
}

#[tokio::test]
async fn create_rejects_days_without_availability() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let mut harness = Harness::new().with_teacher(&teacher);
    harness
        .availability
        .expect_find_for_date()
        .return_once(|_, _| Ok(None));
    let (service, _) = harness.build();

    let err = service
        .create(&actor(&student), request(&teacher, slot("09:00", "10:00")))
        .await
        .expect_err("nothing published");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn create_reports_overlapping_active_booking_as_conflict() {
    let student = sample_user(Role::Student, "Sam Student");
    let other = sample_user(Role::Student, "Other Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let existing = booking(&other, &teacher, BookingStatus::Approved);
    let mut harness = Harness::new()
        .with_teacher(&teacher)
        .with_slots(&teacher, vec![slot("09:00", "12:00")]);
    harness
        .bookings
        .expect_list_active_on()
        .return_once(move |_, _| Ok(vec![existing]));
    harness.bookings.expect_insert().times(0);
    let (service, publisher) = harness.build();

    let err = service
        .create(&actor(&student), request(&teacher, slot("10:30", "11:30")))
        .await
        .expect_err("slot taken");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert!(publisher.emitted().is_empty());
}

#[tokio::test]
async fn create_maps_a_racing_insert_to_slot_taken() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let mut harness = Harness::new()
        .with_teacher(&teacher)
        .with_slots(&teacher, vec![slot("09:00", "12:00")]);
    harness
        .bookings
        .expect_list_active_on()
        .return_once(|_, _| Ok(Vec::new()));
    harness.bookings.expect_insert().return_once(|booking| {
        Err(BookingRepositoryError::slot_taken(
            booking.teacher_id.to_string(),
            booking.date.to_string(),
        ))
    });
    let (service, publisher) = harness.build();

    let err = service
        .create(&actor(&student), request(&teacher, slot("10:00", "11:00")))
        .await
        .expect_err("another booking won the slot");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details(),
        Some(&serde_json::json!({ "field": "slot", "code": "slot_taken" }))
    );
    assert!(publisher.emitted().is_empty());
}

#[tokio::test]
async fn create_rejects_past_dates() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let (service, _) = Harness::new().with_teacher(&teacher).build();
    let mut past = request(&teacher, slot("09:00", "10:00"));
    past.date = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");

    let err = service
        .create(&actor(&student), past)
        .await
        .expect_err("past date");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::student_target(Role::Student)]
#[case::admin_target(Role::Admin)]
#[tokio::test]
async fn create_requires_teacher_target(#[case] role: Role) {
    let student = sample_user(Role::Student, "Sam Student");
    let target = sample_user(role, "Not Teacher");
    let (service, _) = Harness::new().with_teacher(&target).build();

    let err = service
        .create(&actor(&student), request(&target, slot("09:00", "10:00")))
        .await
        .expect_err("target is not a teacher");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn teacher_approval_notifies_all_rooms() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let pending = booking(&student, &teacher, BookingStatus::Pending);
    let id = pending.id;
    let mut harness = Harness::new();
    harness
        .bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(pending)));
    harness
        .bookings
        .expect_update_status()
        .withf(|_, from, to, at| {
            *from == BookingStatus::Pending
                && *to == BookingStatus::Approved
                && *at == fixture_now()
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(()));
    let (service, publisher) = harness.build();

    let updated = service
        .update_status(&actor(&teacher), &id, BookingStatus::Approved)
        .await
        .expect("approval succeeds");

    assert_eq!(updated.status, BookingStatus::Approved);
    let rooms: Vec<String> = publisher.emitted().into_iter().map(|(room, _)| room).collect();
    assert_eq!(
        rooms,
        vec![
            format!("student-bookings:{}", student.id),
            format!("teacher-bookings:{}", teacher.id),
            format!("user:{}", student.id),
            format!("user:{}", teacher.id),
        ]
    );
}

#[rstest]
#[case::student_cannot_approve(Role::Student, BookingStatus::Pending, BookingStatus::Approved, ErrorCode::Forbidden)]
#[case::rejected_is_final(Role::Teacher, BookingStatus::Rejected, BookingStatus::Approved, ErrorCode::Conflict)]
#[case::cancelled_is_final(Role::Student, BookingStatus::Cancelled, BookingStatus::Cancelled, ErrorCode::Conflict)]
#[tokio::test]
async fn invalid_transitions_are_rejected(
    #[case] actor_role: Role,
    #[case] from: BookingStatus,
    #[case] to: BookingStatus,
    #[case] expected: ErrorCode,
) {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let existing = booking(&student, &teacher, from);
    let id = existing.id;
    let acting = if actor_role == Role::Teacher { &teacher } else { &student };
    let mut harness = Harness::new();
    harness
        .bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    harness.bookings.expect_update_status().times(0);
    let (service, _) = harness.build();

    let err = service
        .update_status(&actor(acting), &id, to)
        .await
        .expect_err("transition rejected");

    assert_eq!(err.code(), expected);
}

#[tokio::test]
async fn status_change_on_a_stale_row_is_a_conflict() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let pending = booking(&student, &teacher, BookingStatus::Pending);
    let id = pending.id;
    let mut harness = Harness::new();
    harness
        .bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(pending)));
    harness
        .bookings
        .expect_update_status()
        .withf(|_, from, _, _| *from == BookingStatus::Pending)
        .return_once(|id, _, _, _| Err(BookingRepositoryError::status_changed(id.to_string())));
    let (service, publisher) = harness.build();

    let err = service
        .update_status(&actor(&teacher), &id, BookingStatus::Approved)
        .await
        .expect_err("student cancelled first");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert!(publisher.emitted().is_empty());
}

#[tokio::test]
async fn get_hides_bookings_from_non_participants() {
    let student = sample_user(Role::Student, "Sam Student");
    let teacher = sample_user(Role::Teacher, "Tess Teacher");
    let outsider = sample_user(Role::Student, "Nosy Student");
    let existing = booking(&student, &teacher, BookingStatus::Pending);
    let id = existing.id;
    let mut harness = Harness::new();
    harness
        .bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    let (service, _) = harness.build();

    let err = service
        .get(&actor(&outsider), &id)
        .await
        .expect_err("outsider");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}
