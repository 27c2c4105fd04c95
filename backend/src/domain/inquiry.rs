//! Lesson inquiries students send to prospective teachers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Error, SkillLevel, UserId};

pub const INQUIRY_MESSAGE_MAX: usize = 2000;
const SHORT_TEXT_MAX: usize = 200;

/// Validation failures for inquiry payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InquiryValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("level must be one of beginner, intermediate, or advanced")]
    InvalidLevel,
    #[error("lessonType must be in_person or online")]
    InvalidLessonType,
    #[error("status must be one of new, read, or responded")]
    InvalidStatus,
}

impl InquiryValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
            Self::InvalidLevel => "level",
            Self::InvalidLessonType => "lessonType",
            Self::InvalidStatus => "status",
        }
    }
}

/// Preferred lesson format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    InPerson,
    Online,
}

impl LessonType {
    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::Online => "online",
        }
    }
}

impl FromStr for LessonType {
    type Err = InquiryValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_person" | "in-person" => Ok(Self::InPerson),
            "online" => Ok(Self::Online),
            _ => Err(InquiryValidationError::InvalidLessonType),
        }
    }
}

/// Processing state of an inquiry. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Read,
    Responded,
}

impl InquiryStatus {
    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InquiryStatus {
    type Err = InquiryValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "responded" => Ok(Self::Responded),
            _ => Err(InquiryValidationError::InvalidStatus),
        }
    }
}

/// A student's request for lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: Uuid,
    pub student_id: UserId,
    pub student_name: String,
    pub teacher_id: UserId,
    pub teacher_name: String,
    pub instrument: String,
    pub level: SkillLevel,
    pub age_group: Option<String>,
    pub lesson_type: Option<LessonType>,
    pub availability: Option<String>,
    pub goals: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

impl Inquiry {
    /// Move to `next`, rejecting backwards or no-op transitions.
    pub fn advance(&mut self, next: InquiryStatus) -> Result<(), Error> {
        if next <= self.status {
            return Err(Error::conflict(format!(
                "inquiry cannot move from {} to {next}",
                self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// Raw inquiry fields as received from a client.
#[derive(Debug, Clone)]
pub struct InquiryDraft {
    pub teacher_id: UserId,
    pub instrument: String,
    pub level: String,
    pub age_group: Option<String>,
    pub lesson_type: Option<String>,
    pub availability: Option<String>,
    pub goals: Option<String>,
    pub message: String,
}

/// Validated inquiry fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryRequest {
    pub teacher_id: UserId,
    pub instrument: String,
    pub level: SkillLevel,
    pub age_group: Option<String>,
    pub lesson_type: Option<LessonType>,
    pub availability: Option<String>,
    pub goals: Option<String>,
    pub message: String,
}

fn required(value: &str, field: &'static str, max: usize) -> Result<String, InquiryValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InquiryValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(InquiryValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn optional(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, InquiryValidationError> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(|text| required(&text, field, max))
        .transpose()
}

impl TryFrom<InquiryDraft> for InquiryRequest {
    type Error = InquiryValidationError;

    fn try_from(draft: InquiryDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            teacher_id: draft.teacher_id,
            instrument: required(&draft.instrument, "instrument", SHORT_TEXT_MAX)?,
            level: draft
                .level
                .parse::<SkillLevel>()
                .map_err(|_| InquiryValidationError::InvalidLevel)?,
            age_group: optional(draft.age_group, "ageGroup", SHORT_TEXT_MAX)?,
            lesson_type: draft
                .lesson_type
                .filter(|value| !value.trim().is_empty())
                .map(|value| value.parse::<LessonType>())
                .transpose()?,
            availability: optional(draft.availability, "availability", SHORT_TEXT_MAX)?,
            goals: optional(draft.goals, "goals", INQUIRY_MESSAGE_MAX)?,
            message: required(&draft.message, "message", INQUIRY_MESSAGE_MAX)?,
        })
    }
}

impl From<InquiryValidationError> for super::Error {
    fn from(err: InquiryValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}
