//! Tests for practice validation and statistics.

use chrono::{Duration, TimeZone};
use rstest::{fixture, rstest};

use super::*;

/// Wednesday.
#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 11, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn session(student: UserId, instrument: &str, minutes: u32, at: DateTime<Utc>) -> PracticeSession {
    PracticeSession {
        id: Uuid::new_v4(),
        student_id: student,
        instrument: instrument.to_owned(),
        duration_minutes: minutes,
        focus: None,
        notes: None,
        practiced_at: at,
    }
}

fn goal(student: UserId, instrument: Option<&str>, target: u32, now: DateTime<Utc>) -> Goal {
    Goal {
        id: Uuid::new_v4(),
        student_id: student,
        title: "Practice".to_owned(),
        instrument: instrument.map(str::to_owned),
        target_minutes_per_week: target,
        due_date: None,
        completed: false,
        created_at: now,
    }
}

#[rstest]
#[case(0)]
#[case(601)]
#[case(-5)]
fn session_rejects_out_of_range_durations(now: DateTime<Utc>, #[case] minutes: i64) {
    let err = PracticeSession::new(
        UserId::random(),
        PracticeSessionDraft {
            instrument: "Piano".to_owned(),
            duration_minutes: minutes,
            ..PracticeSessionDraft::default()
        },
        now,
    )
    .expect_err("out of range");
    assert_eq!(err.field(), "durationMinutes");
}

#[rstest]
fn session_rejects_future_timestamps(now: DateTime<Utc>) {
    let err = PracticeSession::new(
        UserId::random(),
        PracticeSessionDraft {
            instrument: "Piano".to_owned(),
            duration_minutes: 30,
            practiced_at: Some(now + Duration::minutes(5)),
            ..PracticeSessionDraft::default()
        },
        now,
    )
    .expect_err("future");
    assert_eq!(err, PracticeValidationError::FutureSession);
}

#[rstest]
fn session_defaults_timestamp_to_now(now: DateTime<Utc>) {
    let session = PracticeSession::new(
        UserId::random(),
        PracticeSessionDraft {
            instrument: " Violin ".to_owned(),
            duration_minutes: 45,
            ..PracticeSessionDraft::default()
        },
        now,
    )
    .expect("valid session");
    assert_eq!(session.practiced_at, now);
    assert_eq!(session.instrument, "Violin");
}

#[rstest]
fn goal_update_validates_before_applying(now: DateTime<Utc>) {
    let mut goal = goal(UserId::random(), None, 120, now);
    let err = goal
        .apply(GoalUpdate {
            title: Some("New title".to_owned()),
            target_minutes_per_week: Some(0),
            completed: Some(true),
        })
        .expect_err("invalid target");
    assert_eq!(err.field(), "targetMinutesPerWeek");
    assert_eq!(goal.title, "Practice");
    assert!(!goal.completed);
}

#[rstest]
#[case("2026-03-09", "2026-03-09")]
#[case("2026-03-11", "2026-03-09")]
#[case("2026-03-15", "2026-03-09")]
#[case("2026-03-16", "2026-03-16")]
fn week_starts_on_monday(#[case] day: &str, #[case] monday: &str) {
    let day: NaiveDate = day.parse().expect("valid date");
    let monday: NaiveDate = monday.parse().expect("valid date");
    assert_eq!(week_start(day), monday);
}

#[rstest]
fn stats_aggregate_totals_week_and_instruments(now: DateTime<Utc>) {
    let student = UserId::random();
    let sessions = vec![
        session(student, "Piano", 30, now),
        session(student, "Piano", 20, now - Duration::days(1)),
        session(student, "Guitar", 40, now - Duration::days(2)),
        // Previous week.
        session(student, "Guitar", 60, now - Duration::days(5)),
    ];

    let stats = compute_stats(&sessions, &[], now);

    assert_eq!(stats.total_sessions, 4);
    assert_eq!(stats.total_minutes, 150);
    assert_eq!(stats.minutes_this_week, 90);
    assert_eq!(
        stats.by_instrument,
        vec![
            InstrumentMinutes {
                instrument: "Guitar".to_owned(),
                minutes: 100
            },
            InstrumentMinutes {
                instrument: "Piano".to_owned(),
                minutes: 50
            },
        ]
    );
}

#[rstest]
fn streak_counts_back_from_today(now: DateTime<Utc>) {
    let student = UserId::random();
    let sessions = vec![
        session(student, "Piano", 10, now),
        session(student, "Piano", 10, now - Duration::days(1)),
        session(student, "Piano", 10, now - Duration::days(2)),
        session(student, "Piano", 10, now - Duration::days(4)),
    ];
    assert_eq!(compute_stats(&sessions, &[], now).current_streak_days, 3);
}

#[rstest]
fn streak_may_end_yesterday(now: DateTime<Utc>) {
    let student = UserId::random();
    let sessions = vec![
        session(student, "Piano", 10, now - Duration::days(1)),
        session(student, "Piano", 10, now - Duration::days(2)),
    ];
    assert_eq!(compute_stats(&sessions, &[], now).current_streak_days, 2);

    let stale = vec![session(student, "Piano", 10, now - Duration::days(2))];
    assert_eq!(compute_stats(&stale, &[], now).current_streak_days, 0);
}

#[rstest]
fn goal_progress_is_capped_and_instrument_scoped(now: DateTime<Utc>) {
    let student = UserId::random();
    let sessions = vec![
        session(student, "Piano", 90, now),
        session(student, "Guitar", 15, now),
    ];
    let piano = goal(student, Some("piano"), 60, now);
    let any = goal(student, None, 210, now);

    let stats = compute_stats(&sessions, &[piano.clone(), any.clone()], now);

    let piano_progress = stats
        .goals
        .iter()
        .find(|progress| progress.goal_id == piano.id)
        .expect("piano goal");
    assert_eq!(piano_progress.minutes_this_week, 90);
    assert_eq!(piano_progress.percent, 100);

    let any_progress = stats
        .goals
        .iter()
        .find(|progress| progress.goal_id == any.id)
        .expect("general goal");
    assert_eq!(any_progress.minutes_this_week, 105);
    assert_eq!(any_progress.percent, 50);
}
