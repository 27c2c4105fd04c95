//! Internal Diesel row structs and their domain conversions.
//!
//! Rows never leave the persistence layer. Reading a row back re-runs the
//! domain's parsers, so a value the domain no longer accepts surfaces as a
//! [`CorruptRow`] query error instead of a panic.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AvailabilityDay, Booking, Comment, CommunityPost, DisplayName, EmailAddress, Goal, Inquiry,
    Message, PracticeSession, Recording, Resource, Role, TimeSlot, User, UserId, UserProfile,
};

use super::schema::{
    auth_tokens, availability_days, bookings, community_posts, inquiries, messages,
    post_comments, practice_goals, practice_recordings, practice_sessions, resource_assignments,
    resources, users,
};

/// A stored column value the domain rejects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored {column} is invalid: {value}")]
pub(crate) struct CorruptRow {
    column: &'static str,
    value: String,
}

impl CorruptRow {
    pub(crate) fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

fn parse_column<T: FromStr>(column: &'static str, value: &str) -> Result<T, CorruptRow> {
    value
        .parse()
        .map_err(|_| CorruptRow::new(column, value))
}

/// Saturate domain counters into `INTEGER` columns.
pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db_int(column: &'static str, value: i32) -> Result<u32, CorruptRow> {
    u32::try_from(value).map_err(|_| CorruptRow::new(column, value.to_string()))
}

pub(crate) fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Display name and role of a referenced user.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: String,
}

/// Summaries keyed by user id, loaded once per query.
#[derive(Debug, Default)]
pub(crate) struct UserNames(HashMap<Uuid, UserSummary>);

impl UserNames {
    pub(crate) fn new(rows: Vec<UserSummary>) -> Self {
        Self(rows.into_iter().map(|row| (row.id, row)).collect())
    }

    /// Name of `id`; empty when the row vanished between queries.
    pub(crate) fn name(&self, id: &Uuid) -> String {
        self.0
            .get(id)
            .map(|summary| summary.name.clone())
            .unwrap_or_default()
    }

    pub(crate) fn role(&self, id: &Uuid) -> Result<Role, CorruptRow> {
        let summary = self
            .0
            .get(id)
            .ok_or_else(|| CorruptRow::new("author_id", id.to_string()))?;
        parse_column("role", &summary.role)
    }
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub instruments: Vec<String>,
    pub experience: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub hourly_rate: Option<i32>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CorruptRow;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let hourly_rate = row
            .hourly_rate
            .map(|rate| from_db_int("hourly_rate", rate))
            .transpose()?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: DisplayName::new(&row.name).map_err(|_| CorruptRow::new("name", &row.name))?,
            email: EmailAddress::new(&row.email)
                .map_err(|_| CorruptRow::new("email", &row.email))?,
            role: parse_column("role", &row.role)?,
            profile: UserProfile {
                instruments: row.instruments,
                experience: row.experience,
                bio: row.bio,
                location: row.location,
                hourly_rate,
                profile_image_url: row.profile_image_url,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub instruments: &'a [String],
    pub experience: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
    pub hourly_rate: Option<i32>,
    pub profile_image_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn new(user: &'a User, password_hash: &'a str) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            password_hash,
            role: user.role.as_str(),
            instruments: &user.profile.instruments,
            experience: user.profile.experience.as_deref(),
            bio: user.profile.bio.as_deref(),
            location: user.profile.location.as_deref(),
            hourly_rate: user.profile.hourly_rate.map(to_db_int),
            profile_image_url: user.profile.profile_image_url.as_deref(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Editable profile columns; `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserChangeset<'a> {
    pub name: &'a str,
    pub instruments: &'a [String],
    pub experience: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
    pub hourly_rate: Option<i32>,
    pub profile_image_url: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for UserChangeset<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            name: user.name.as_ref(),
            instruments: &user.profile.instruments,
            experience: user.profile.experience.as_deref(),
            bio: user.profile.bio.as_deref(),
            location: user.profile.location.as_deref(),
            hourly_rate: user.profile.hourly_rate.map(to_db_int),
            profile_image_url: user.profile.profile_image_url.as_deref(),
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_tokens)]
pub(crate) struct NewAuthTokenRow<'a> {
    pub digest: &'a str,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = availability_days)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AvailabilityRow {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AvailabilityDay> for AvailabilityRow {
    fn from(day: &AvailabilityDay) -> Self {
        Self {
            id: day.id,
            teacher_id: *day.teacher_id.as_uuid(),
            date: day.date,
            slots: day.slots().iter().map(ToString::to_string).collect(),
            updated_at: day.updated_at,
        }
    }
}

impl TryFrom<AvailabilityRow> for AvailabilityDay {
    type Error = CorruptRow;

    fn try_from(row: AvailabilityRow) -> Result<Self, Self::Error> {
        let slots = row
            .slots
            .iter()
            .map(|slot| parse_column::<TimeSlot>("slots", slot))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(
            row.id,
            UserId::from_uuid(row.teacher_id),
            row.date,
            slots,
            row.updated_at,
        )
        .map_err(|err| CorruptRow::new("slots", err.to_string()))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingRow {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            student_id: *booking.student_id.as_uuid(),
            teacher_id: *booking.teacher_id.as_uuid(),
            date: booking.date,
            start_time: booking.slot.start(),
            end_time: booking.slot.end(),
            message: booking.message.clone(),
            status: booking.status.as_str().to_owned(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

impl BookingRow {
    pub(crate) fn referenced_users(&self) -> [Uuid; 2] {
        [self.student_id, self.teacher_id]
    }

    pub(crate) fn into_booking(self, names: &UserNames) -> Result<Booking, CorruptRow> {
        let slot = TimeSlot::new(self.start_time, self.end_time)
            .map_err(|err| CorruptRow::new("start_time", err.to_string()))?;
        Ok(Booking {
            id: self.id,
            student_id: UserId::from_uuid(self.student_id),
            student_name: names.name(&self.student_id),
            teacher_id: UserId::from_uuid(self.teacher_id),
            teacher_name: names.name(&self.teacher_id),
            date: self.date,
            slot,
            message: self.message,
            status: parse_column("status", &self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = resources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ResourceRow {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: String,
    pub instrument: String,
    pub level: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Resource> for ResourceRow {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            teacher_id: *resource.teacher_id.as_uuid(),
            title: resource.title.clone(),
            description: resource.description.clone(),
            file_url: resource.file_url.clone(),
            file_type: resource.file_type.clone(),
            instrument: resource.instrument.clone(),
            level: resource.level.as_str().to_owned(),
            category: resource.category.clone(),
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

impl ResourceRow {
    pub(crate) fn into_resource(self, names: &UserNames) -> Result<Resource, CorruptRow> {
        Ok(Resource {
            id: self.id,
            teacher_id: UserId::from_uuid(self.teacher_id),
            teacher_name: names.name(&self.teacher_id),
            title: self.title,
            description: self.description,
            file_url: self.file_url,
            file_type: self.file_type,
            instrument: self.instrument,
            level: parse_column("level", &self.level)?,
            category: self.category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = resource_assignments)]
pub(crate) struct NewAssignmentRow {
    pub resource_id: Uuid,
    pub student_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Practice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = practice_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PracticeSessionRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub instrument: String,
    pub duration_minutes: i32,
    pub focus: Option<String>,
    pub notes: Option<String>,
    pub practiced_at: DateTime<Utc>,
}

impl From<&PracticeSession> for PracticeSessionRow {
    fn from(session: &PracticeSession) -> Self {
        Self {
            id: session.id,
            student_id: *session.student_id.as_uuid(),
            instrument: session.instrument.clone(),
            duration_minutes: to_db_int(session.duration_minutes),
            focus: session.focus.clone(),
            notes: session.notes.clone(),
            practiced_at: session.practiced_at,
        }
    }
}

impl TryFrom<PracticeSessionRow> for PracticeSession {
    type Error = CorruptRow;

    fn try_from(row: PracticeSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            student_id: UserId::from_uuid(row.student_id),
            instrument: row.instrument,
            duration_minutes: from_db_int("duration_minutes", row.duration_minutes)?,
            focus: row.focus,
            notes: row.notes,
            practiced_at: row.practiced_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = practice_goals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GoalRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub instrument: Option<String>,
    pub target_minutes_per_week: i32,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Goal> for GoalRow {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id,
            student_id: *goal.student_id.as_uuid(),
            title: goal.title.clone(),
            instrument: goal.instrument.clone(),
            target_minutes_per_week: to_db_int(goal.target_minutes_per_week),
            due_date: goal.due_date,
            completed: goal.completed,
            created_at: goal.created_at,
        }
    }
}

impl TryFrom<GoalRow> for Goal {
    type Error = CorruptRow;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            student_id: UserId::from_uuid(row.student_id),
            title: row.title,
            instrument: row.instrument,
            target_minutes_per_week: from_db_int(
                "target_minutes_per_week",
                row.target_minutes_per_week,
            )?,
            due_date: row.due_date,
            completed: row.completed,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = practice_recordings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecordingRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub title: String,
    pub file_url: String,
    pub duration_seconds: Option<i32>,
    pub notes: Option<String>,
    pub teacher_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Recording> for RecordingRow {
    fn from(recording: &Recording) -> Self {
        Self {
            id: recording.id,
            student_id: *recording.student_id.as_uuid(),
            teacher_id: recording.teacher_id.map(|id| *id.as_uuid()),
            title: recording.title.clone(),
            file_url: recording.file_url.clone(),
            duration_seconds: recording.duration_seconds.map(to_db_int),
            notes: recording.notes.clone(),
            teacher_feedback: recording.teacher_feedback.clone(),
            created_at: recording.created_at,
        }
    }
}

impl RecordingRow {
    pub(crate) fn into_recording(self, names: &UserNames) -> Result<Recording, CorruptRow> {
        let duration_seconds = self
            .duration_seconds
            .map(|seconds| from_db_int("duration_seconds", seconds))
            .transpose()?;
        Ok(Recording {
            id: self.id,
            student_id: UserId::from_uuid(self.student_id),
            student_name: names.name(&self.student_id),
            teacher_id: self.teacher_id.map(UserId::from_uuid),
            title: self.title,
            file_url: self.file_url,
            duration_seconds,
            notes: self.notes,
            teacher_feedback: self.teacher_feedback,
            created_at: self.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Community
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = community_posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommunityPostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub media_type: String,
    pub instrument: Option<String>,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CommunityPost> for CommunityPostRow {
    fn from(post: &CommunityPost) -> Self {
        Self {
            id: post.id,
            author_id: *post.author_id.as_uuid(),
            title: post.title.clone(),
            description: post.description.clone(),
            media_url: post.media_url.clone(),
            media_type: post.media_type.as_str().to_owned(),
            instrument: post.instrument.clone(),
            visibility: post.visibility.as_str().to_owned(),
            created_at: post.created_at,
        }
    }
}

/// Per-post aggregates computed alongside a page of posts.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PostCounters {
    pub likes: u64,
    pub comments: u64,
    pub liked_by_viewer: bool,
}

impl CommunityPostRow {
    pub(crate) fn into_post(
        self,
        names: &UserNames,
        counters: PostCounters,
    ) -> Result<CommunityPost, CorruptRow> {
        Ok(CommunityPost {
            id: self.id,
            author_id: UserId::from_uuid(self.author_id),
            author_name: names.name(&self.author_id),
            author_role: names.role(&self.author_id)?,
            title: self.title,
            description: self.description,
            media_url: self.media_url,
            media_type: parse_column("media_type", &self.media_type)?,
            instrument: self.instrument,
            visibility: parse_column("visibility", &self.visibility)?,
            like_count: counters.likes,
            comment_count: counters.comments,
            liked_by_me: counters.liked_by_viewer,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = post_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: *comment.author_id.as_uuid(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

impl CommentRow {
    pub(crate) fn into_comment(self, names: &UserNames) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: UserId::from_uuid(self.author_id),
            author_name: names.name(&self.author_id),
            text: self.text,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Messaging and inquiries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub text: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageRow {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: *message.sender_id.as_uuid(),
            recipient_id: *message.recipient_id.as_uuid(),
            text: message.text.clone(),
            read_at: message.read_at,
            created_at: message.created_at,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: UserId::from_uuid(row.sender_id),
            recipient_id: UserId::from_uuid(row.recipient_id),
            text: row.text,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = inquiries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InquiryRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub instrument: String,
    pub level: String,
    pub age_group: Option<String>,
    pub lesson_type: Option<String>,
    pub availability: Option<String>,
    pub goals: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Inquiry> for InquiryRow {
    fn from(inquiry: &Inquiry) -> Self {
        Self {
            id: inquiry.id,
            student_id: *inquiry.student_id.as_uuid(),
            teacher_id: *inquiry.teacher_id.as_uuid(),
            instrument: inquiry.instrument.clone(),
            level: inquiry.level.as_str().to_owned(),
            age_group: inquiry.age_group.clone(),
            lesson_type: inquiry.lesson_type.map(|kind| kind.as_str().to_owned()),
            availability: inquiry.availability.clone(),
            goals: inquiry.goals.clone(),
            message: inquiry.message.clone(),
            status: inquiry.status.as_str().to_owned(),
            created_at: inquiry.created_at,
        }
    }
}

impl InquiryRow {
    pub(crate) fn referenced_users(&self) -> [Uuid; 2] {
        [self.student_id, self.teacher_id]
    }

    pub(crate) fn into_inquiry(self, names: &UserNames) -> Result<Inquiry, CorruptRow> {
        let lesson_type = self
            .lesson_type
            .as_deref()
            .map(|kind| parse_column("lesson_type", kind))
            .transpose()?;
        Ok(Inquiry {
            id: self.id,
            student_id: UserId::from_uuid(self.student_id),
            student_name: names.name(&self.student_id),
            teacher_id: UserId::from_uuid(self.teacher_id),
            teacher_name: names.name(&self.teacher_id),
            instrument: self.instrument,
            level: parse_column("level", &self.level)?,
            age_group: self.age_group,
            lesson_type,
            availability: self.availability,
            goals: self.goals,
            message: self.message,
            status: parse_column("status", &self.status)?,
            created_at: self.created_at,
        })
    }
}
