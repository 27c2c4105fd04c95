//! User accounts, roles, and editable profile data.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised by user value objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Name was blank once trimmed.
    #[error("name must not be empty")]
    EmptyName,
    /// Name length outside the accepted bounds.
    #[error("name must be between {min} and {max} characters")]
    NameLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// Email address is not `local@domain.tld` shaped.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Role string did not match a known role.
    #[error("role must be one of student, teacher, or admin")]
    InvalidRole,
    /// Too many instruments supplied.
    #[error("at most {max} instruments may be listed")]
    TooManyInstruments {
        /// Maximum number of instruments.
        max: usize,
    },
    /// A free-text profile field exceeded its length.
    #[error("{field} must be at most {max} characters")]
    TextTooLong {
        /// Field name in API casing.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },
    /// Hourly rates only apply to teachers.
    #[error("only teachers may set an hourly rate")]
    HourlyRateNotAllowed,
}

impl UserValidationError {
    /// API field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyName | Self::NameLength { .. } => "name",
            Self::InvalidEmail => "email",
            Self::InvalidRole => "role",
            Self::TooManyInstruments { .. } => "instruments",
            Self::TextTooLong { field, .. } => field,
            Self::HourlyRateNotAllowed => "hourlyRate",
        }
    }
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account role controlling which endpoints a user may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Learner booking lessons and logging practice.
    Student,
    /// Tutor publishing availability and resources.
    Teacher,
    /// Operator with access to the admin panel.
    Admin,
}

impl Role {
    /// Lower-case wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::InvalidRole),
        }
    }
}

/// Minimum allowed length for a display name.
pub const NAME_MIN: usize = 2;
/// Maximum allowed length for a display name.
pub const NAME_MAX: usize = 64;

/// Human readable name shown to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`], trimming surrounding space.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        let length = trimmed.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&length) {
            return Err(UserValidationError::NameLength {
                min: NAME_MIN,
                max: NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

const EMAIL_MAX: usize = 254;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised (trimmed, lower-cased) email address used as login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use musiconthego::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.len() > EMAIL_MAX || !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum number of instruments on a profile.
pub const INSTRUMENTS_MAX: usize = 10;
const INSTRUMENT_NAME_MAX: usize = 50;
const BIO_MAX: usize = 1000;
const SHORT_TEXT_MAX: usize = 200;

/// Trim, drop blanks, and case-insensitively de-duplicate instrument names.
pub fn normalise_instruments(
    instruments: Vec<String>,
) -> Result<Vec<String>, UserValidationError> {
    let mut normalised: Vec<String> = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let trimmed = instrument.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.chars().count() > INSTRUMENT_NAME_MAX {
            return Err(UserValidationError::TextTooLong {
                field: "instruments",
                max: INSTRUMENT_NAME_MAX,
            });
        }
        if normalised
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            continue;
        }
        normalised.push(trimmed.to_owned());
    }
    if normalised.len() > INSTRUMENTS_MAX {
        return Err(UserValidationError::TooManyInstruments {
            max: INSTRUMENTS_MAX,
        });
    }
    Ok(normalised)
}

fn optional_text(
    value: String,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, UserValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(UserValidationError::TextTooLong { field, max });
    }
    Ok(Some(trimmed.to_owned()))
}

/// Editable profile attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Instruments played or taught.
    pub instruments: Vec<String>,
    /// Free-text experience summary.
    pub experience: Option<String>,
    /// Longer biography.
    pub bio: Option<String>,
    /// City or region.
    pub location: Option<String>,
    /// Teacher hourly rate in whole currency units.
    pub hourly_rate: Option<u32>,
    /// Hosted profile image URL.
    pub profile_image_url: Option<String>,
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique across accounts (enforced by persistence).
/// - `profile.hourly_rate` is only set for teachers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: DisplayName,
    /// Login email.
    pub email: EmailAddress,
    /// Account role.
    pub role: Role,
    /// Editable profile data.
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Apply a validated profile update, stamping `updated_at`.
    pub fn apply(
        &mut self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), UserValidationError> {
        let ProfileUpdate {
            name,
            instruments,
            experience,
            bio,
            location,
            hourly_rate,
        } = update;

        if hourly_rate.is_some_and(|rate| rate.is_some()) && self.role != Role::Teacher {
            return Err(UserValidationError::HourlyRateNotAllowed);
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(instruments) = instruments {
            self.profile.instruments = instruments;
        }
        if let Some(experience) = experience {
            self.profile.experience = experience;
        }
        if let Some(bio) = bio {
            self.profile.bio = bio;
        }
        if let Some(location) = location {
            self.profile.location = location;
        }
        if let Some(hourly_rate) = hourly_rate {
            self.profile.hourly_rate = hourly_rate;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Raw profile changes as received from a client.
///
/// `None` leaves a field untouched; a blank string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDraft {
    /// Replacement display name.
    pub name: Option<String>,
    /// Replacement instrument list.
    pub instruments: Option<Vec<String>>,
    /// Replacement experience summary.
    pub experience: Option<String>,
    /// Replacement biography.
    pub bio: Option<String>,
    /// Replacement location.
    pub location: Option<String>,
    /// Replacement hourly rate (`Some(None)` clears it).
    pub hourly_rate: Option<Option<u32>>,
}

/// Validated profile changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    name: Option<DisplayName>,
    instruments: Option<Vec<String>>,
    experience: Option<Option<String>>,
    bio: Option<Option<String>>,
    location: Option<Option<String>>,
    hourly_rate: Option<Option<u32>>,
}

impl TryFrom<ProfileUpdateDraft> for ProfileUpdate {
    type Error = UserValidationError;

    fn try_from(draft: ProfileUpdateDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            name: draft.name.map(DisplayName::new).transpose()?,
            instruments: draft.instruments.map(normalise_instruments).transpose()?,
            experience: draft
                .experience
                .map(|value| optional_text(value, "experience", SHORT_TEXT_MAX))
                .transpose()?,
            bio: draft
                .bio
                .map(|value| optional_text(value, "bio", BIO_MAX))
                .transpose()?,
            location: draft
                .location
                .map(|value| optional_text(value, "location", SHORT_TEXT_MAX))
                .transpose()?,
            hourly_rate: draft.hourly_rate,
        })
    }
}

/// Filter applied when browsing teachers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherFilter {
    /// Case-insensitive instrument match.
    pub instrument: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

/// Filter applied when listing users in the admin panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Restrict to one role.
    pub role: Option<Role>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
}

impl From<UserValidationError> for super::Error {
    fn from(err: UserValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}
