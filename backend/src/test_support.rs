//! Test doubles shared by unit tests across the crate.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::RealtimePublisher;
use crate::domain::{
    AuthenticatedUser, DisplayName, EmailAddress, RealtimeEvent, Role, RoomName, User, UserId,
    UserProfile,
};

/// Monday 2026-03-02 10:00 UTC.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock frozen at a settable instant.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_hours(&self, hours: i64) {
        *self.lock() += TimeDelta::hours(hours);
    }

    fn lock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock::new(fixture_now()))
}

/// Build a user with an empty profile.
pub fn sample_user(role: Role, name: &str) -> User {
    let slug = name.to_ascii_lowercase().replace(' ', ".");
    User {
        id: UserId::random(),
        name: DisplayName::new(name).expect("valid fixture name"),
        email: EmailAddress::new(&format!("{slug}@example.com")).expect("valid fixture email"),
        role,
        profile: UserProfile::default(),
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

pub fn actor(user: &User) -> AuthenticatedUser {
    AuthenticatedUser::from(user)
}

/// Publisher that records every emission as `(room, event name)`.
///
/// Emissions to a user are recorded against that user's personal room.
#[derive(Default)]
pub struct RecordingPublisher {
    emitted: Mutex<Vec<(RoomName, RealtimeEvent)>>,
}

impl RecordingPublisher {
    pub fn emitted(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .map(|(room, event)| (room.to_string(), event.event.clone()))
            .collect()
    }

    pub fn events(&self) -> Vec<RealtimeEvent> {
        self.lock().iter().map(|(_, event)| event.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(RoomName, RealtimeEvent)>> {
        match self.emitted.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("publisher mutex"),
        }
    }
}

impl RealtimePublisher for RecordingPublisher {
    fn emit_to_user(&self, user: &UserId, event: RealtimeEvent) {
        self.lock().push((RoomName::User(*user), event));
    }

    fn emit_to_room(&self, room: &RoomName, event: RealtimeEvent) {
        self.lock().push((*room, event));
    }
}
