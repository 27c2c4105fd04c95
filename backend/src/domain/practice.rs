//! Practice logging: sessions, weekly goals, recordings, and statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::UserId;

pub const SESSION_MINUTES_MAX: u32 = 600;
pub const GOAL_MINUTES_MAX: u32 = 10_080;
const TITLE_MAX: usize = 200;
const NOTES_MAX: usize = 2000;
const LABEL_MAX: usize = 50;

/// Validation failures for practice payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PracticeValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },
    #[error("practicedAt must not be in the future")]
    FutureSession,
    #[error("fileUrl must be an http or https URL")]
    InvalidUrl,
}

impl PracticeValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } | Self::OutOfRange { field, .. } => {
                field
            }
            Self::FutureSession => "practicedAt",
            Self::InvalidUrl => "fileUrl",
        }
    }
}

fn required(value: &str, field: &'static str, max: usize) -> Result<String, PracticeValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PracticeValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(PracticeValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn optional(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, PracticeValidationError> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(|text| required(&text, field, max))
        .transpose()
}

fn in_range(value: i64, field: &'static str, min: u32, max: u32) -> Result<u32, PracticeValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| (min..=max).contains(v))
        .ok_or(PracticeValidationError::OutOfRange { field, min, max })
}

/// One logged practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: Uuid,
    pub student_id: UserId,
    pub instrument: String,
    pub duration_minutes: u32,
    pub focus: Option<String>,
    pub notes: Option<String>,
    pub practiced_at: DateTime<Utc>,
}

/// Raw session fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct PracticeSessionDraft {
    pub instrument: String,
    pub duration_minutes: i64,
    pub focus: Option<String>,
    pub notes: Option<String>,
    pub practiced_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
    /// Validate a draft, defaulting `practiced_at` to `now`.
    pub fn new(
        student_id: UserId,
        draft: PracticeSessionDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PracticeValidationError> {
        let practiced_at = draft.practiced_at.unwrap_or(now);
        if practiced_at > now {
            return Err(PracticeValidationError::FutureSession);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            instrument: required(&draft.instrument, "instrument", LABEL_MAX)?,
            duration_minutes: in_range(
                draft.duration_minutes,
                "durationMinutes",
                1,
                SESSION_MINUTES_MAX,
            )?,
            focus: optional(draft.focus, "focus", TITLE_MAX)?,
            notes: optional(draft.notes, "notes", NOTES_MAX)?,
            practiced_at,
        })
    }
}

/// Weekly practice target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub student_id: UserId,
    pub title: String,
    pub instrument: Option<String>,
    pub target_minutes_per_week: u32,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw goal fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct GoalDraft {
    pub title: String,
    pub instrument: Option<String>,
    pub target_minutes_per_week: i64,
    pub due_date: Option<NaiveDate>,
}

impl Goal {
    pub fn new(
        student_id: UserId,
        draft: GoalDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PracticeValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            title: required(&draft.title, "title", TITLE_MAX)?,
            instrument: optional(draft.instrument, "instrument", LABEL_MAX)?,
            target_minutes_per_week: in_range(
                draft.target_minutes_per_week,
                "targetMinutesPerWeek",
                1,
                GOAL_MINUTES_MAX,
            )?,
            due_date: draft.due_date,
            completed: false,
            created_at: now,
        })
    }

    /// Apply partial changes after validating them.
    pub fn apply(&mut self, update: GoalUpdate) -> Result<(), PracticeValidationError> {
        let title = update
            .title
            .map(|title| required(&title, "title", TITLE_MAX))
            .transpose()?;
        let target = update
            .target_minutes_per_week
            .map(|target| in_range(target, "targetMinutesPerWeek", 1, GOAL_MINUTES_MAX))
            .transpose()?;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(target) = target {
            self.target_minutes_per_week = target;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        Ok(())
    }

    fn matches_instrument(&self, instrument: &str) -> bool {
        self.instrument
            .as_deref()
            .is_none_or(|wanted| wanted.eq_ignore_ascii_case(instrument))
    }
}

/// Partial goal changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub target_minutes_per_week: Option<i64>,
    pub completed: Option<bool>,
}

/// Audio or video take a student uploaded, optionally shared with a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: Uuid,
    pub student_id: UserId,
    pub student_name: String,
    pub teacher_id: Option<UserId>,
    pub title: String,
    pub file_url: String,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
    pub teacher_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw recording fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct RecordingDraft {
    pub teacher_id: Option<UserId>,
    pub title: String,
    pub file_url: String,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl Recording {
    pub fn new(
        student_id: UserId,
        student_name: String,
        draft: RecordingDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PracticeValidationError> {
        let file_url = super::resource::validate_http_url(&draft.file_url)
            .map_err(|_| PracticeValidationError::InvalidUrl)?;
        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            student_name,
            teacher_id: draft.teacher_id,
            title: required(&draft.title, "title", TITLE_MAX)?,
            file_url,
            duration_seconds: draft.duration_seconds,
            notes: optional(draft.notes, "notes", NOTES_MAX)?,
            teacher_feedback: None,
            created_at: now,
        })
    }

    /// Replace the teacher's feedback.
    pub fn set_feedback(&mut self, feedback: &str) -> Result<(), PracticeValidationError> {
        self.teacher_feedback = Some(required(feedback, "feedback", NOTES_MAX)?);
        Ok(())
    }
}

/// Minutes logged against one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentMinutes {
    pub instrument: String,
    pub minutes: u64,
}

/// Progress toward one weekly goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_id: Uuid,
    pub title: String,
    pub minutes_this_week: u64,
    pub target: u32,
    pub percent: u8,
    pub completed: bool,
}

/// Aggregated practice statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub minutes_this_week: u64,
    pub current_streak_days: u32,
    pub by_instrument: Vec<InstrumentMinutes>,
    pub goals: Vec<GoalProgress>,
}

/// Monday of the ISO week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(offset)).unwrap_or(day)
}

fn streak_days(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today.pred_opt();
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else if let Some(yesterday) = yesterday.filter(|day| days.contains(day)) {
        Some(yesterday)
    } else {
        None
    };
    let mut streak = 0;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Compute statistics from a student's sessions and goals.
///
/// The week starts on Monday (UTC). A streak counts consecutive practice days
/// ending today, or yesterday when nothing has been logged yet today.
pub fn compute_stats(
    sessions: &[PracticeSession],
    goals: &[Goal],
    now: DateTime<Utc>,
) -> PracticeStats {
    let today = now.date_naive();
    let monday = week_start(today);
    let this_week: Vec<&PracticeSession> = sessions
        .iter()
        .filter(|session| {
            let day = session.practiced_at.date_naive();
            day >= monday && day <= today
        })
        .collect();

    let mut by_instrument: BTreeMap<&str, u64> = BTreeMap::new();
    for session in sessions {
        *by_instrument.entry(session.instrument.as_str()).or_default() +=
            u64::from(session.duration_minutes);
    }
    let mut by_instrument: Vec<InstrumentMinutes> = by_instrument
        .into_iter()
        .map(|(instrument, minutes)| InstrumentMinutes {
            instrument: instrument.to_owned(),
            minutes,
        })
        .collect();
    by_instrument.sort_by(|a, b| b.minutes.cmp(&a.minutes).then(a.instrument.cmp(&b.instrument)));

    let practice_days: BTreeSet<NaiveDate> = sessions
        .iter()
        .map(|session| session.practiced_at.date_naive())
        .collect();

    let goals = goals
        .iter()
        .map(|goal| {
            let minutes: u64 = this_week
                .iter()
                .filter(|session| goal.matches_instrument(&session.instrument))
                .map(|session| u64::from(session.duration_minutes))
                .sum();
            let target = u64::from(goal.target_minutes_per_week.max(1));
            let percent = (minutes.saturating_mul(100) / target).min(100);
            GoalProgress {
                goal_id: goal.id,
                title: goal.title.clone(),
                minutes_this_week: minutes,
                target: goal.target_minutes_per_week,
                percent: u8::try_from(percent).unwrap_or(100),
                completed: goal.completed,
            }
        })
        .collect();

    PracticeStats {
        total_sessions: sessions.len() as u64,
        total_minutes: sessions
            .iter()
            .map(|session| u64::from(session.duration_minutes))
            .sum(),
        minutes_this_week: this_week
            .iter()
            .map(|session| u64::from(session.duration_minutes))
            .sum(),
        current_streak_days: streak_days(&practice_days, today),
        by_instrument,
        goals,
    }
}

impl From<PracticeValidationError> for super::Error {
    fn from(err: PracticeValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}

#[cfg(test)]
#[path = "practice_tests.rs"]
mod tests;
