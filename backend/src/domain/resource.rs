//! Teaching resources published by teachers and assigned to students.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::UserId;

pub const RESOURCE_TITLE_MAX: usize = 200;
pub const RESOURCE_DESCRIPTION_MAX: usize = 2000;
const RESOURCE_LABEL_MAX: usize = 50;

/// Validation failures for resource payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("fileUrl must be an http or https URL")]
    InvalidUrl,
    #[error("level must be one of beginner, intermediate, or advanced")]
    InvalidLevel,
}

impl ResourceValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
            Self::InvalidUrl => "fileUrl",
            Self::InvalidLevel => "level",
        }
    }
}

/// Skill level a resource targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = ResourceValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ResourceValidationError::InvalidLevel),
        }
    }
}

pub(crate) fn required_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ResourceValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ResourceValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ResourceValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ResourceValidationError> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(|text| required_text(&text, field, max))
        .transpose()
}

/// Accept only absolute `http`/`https` URLs.
pub fn validate_http_url(raw: &str) -> Result<String, ResourceValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ResourceValidationError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        _ => Err(ResourceValidationError::InvalidUrl),
    }
}

/// Raw resource fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: String,
    pub instrument: String,
    pub level: String,
    pub category: Option<String>,
}

/// Validated, teacher-independent resource content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContent {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: String,
    pub instrument: String,
    pub level: SkillLevel,
    pub category: Option<String>,
}

impl TryFrom<ResourceDraft> for ResourceContent {
    type Error = ResourceValidationError;

    fn try_from(draft: ResourceDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required_text(&draft.title, "title", RESOURCE_TITLE_MAX)?,
            description: optional_text(
                draft.description,
                "description",
                RESOURCE_DESCRIPTION_MAX,
            )?,
            file_url: validate_http_url(&draft.file_url)?,
            file_type: required_text(&draft.file_type, "fileType", RESOURCE_LABEL_MAX)?,
            instrument: required_text(&draft.instrument, "instrument", RESOURCE_LABEL_MAX)?,
            level: draft.level.parse()?,
            category: optional_text(draft.category, "category", RESOURCE_LABEL_MAX)?,
        })
    }
}

/// Published teaching material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub teacher_id: UserId,
    pub teacher_name: String,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: String,
    pub instrument: String,
    pub level: SkillLevel,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Overwrite editable content and stamp the update time.
    pub fn replace_content(&mut self, content: ResourceContent, now: DateTime<Utc>) {
        let ResourceContent {
            title,
            description,
            file_url,
            file_type,
            instrument,
            level,
            category,
        } = content;
        self.title = title;
        self.description = description;
        self.file_url = file_url;
        self.file_type = file_type;
        self.instrument = instrument;
        self.level = level;
        self.category = category;
        self.updated_at = now;
    }
}

/// Filter for browsing resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub instrument: Option<String>,
    pub level: Option<SkillLevel>,
    pub teacher_id: Option<UserId>,
    pub search: Option<String>,
}

impl From<ResourceValidationError> for super::Error {
    fn from(err: ResourceValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Resource payload validation.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> ResourceDraft {
        ResourceDraft {
            title: "  Major scales ".to_owned(),
            description: Some(" ".to_owned()),
            file_url: "https://cdn.example.com/scales.pdf".to_owned(),
            file_type: "pdf".to_owned(),
            instrument: "Piano".to_owned(),
            level: "Beginner".to_owned(),
            category: None,
        }
    }

    #[rstest]
    fn accepts_and_normalises(draft: ResourceDraft) {
        let content = ResourceContent::try_from(draft).expect("valid resource");
        assert_eq!(content.title, "Major scales");
        assert_eq!(content.description, None);
        assert_eq!(content.level, SkillLevel::Beginner);
    }

    #[rstest]
    #[case("ftp://example.com/file.pdf")]
    #[case("not a url")]
    #[case("/relative/path.pdf")]
    fn rejects_non_http_urls(mut draft: ResourceDraft, #[case] url: &str) {
        draft.file_url = url.to_owned();
        assert_eq!(
            ResourceContent::try_from(draft),
            Err(ResourceValidationError::InvalidUrl)
        );
    }

    #[rstest]
    fn rejects_blank_and_long_titles(mut draft: ResourceDraft) {
        draft.title = "   ".to_owned();
        let err = ResourceContent::try_from(draft.clone()).expect_err("blank title");
        assert_eq!(err.field(), "title");

        draft.title = "t".repeat(RESOURCE_TITLE_MAX + 1);
        assert!(matches!(
            ResourceContent::try_from(draft),
            Err(ResourceValidationError::TooLong { field: "title", .. })
        ));
    }

    #[rstest]
    fn rejects_unknown_levels(mut draft: ResourceDraft) {
        draft.level = "expert".to_owned();
        assert_eq!(
            ResourceContent::try_from(draft),
            Err(ResourceValidationError::InvalidLevel)
        );
    }
}
