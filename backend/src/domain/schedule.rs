//! Teacher availability: time slots and per-day schedules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Maximum number of slots a teacher may publish for one day.
pub const SLOTS_PER_DAY_MAX: usize = 24;

/// Validation failures for slots and availability days.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleValidationError {
    /// Time string not in `HH:MM` form.
    #[error("time must use HH:MM 24-hour format")]
    InvalidTime {
        /// Offending input.
        value: String,
    },
    /// Date string not in `YYYY-MM-DD` form.
    #[error("date must use YYYY-MM-DD format")]
    InvalidDate {
        /// Offending input.
        value: String,
    },
    /// Slot ends at or before it starts.
    #[error("slot end must be after its start")]
    ReversedSlot {
        /// Slot as supplied.
        value: String,
    },
    /// Two slots in one day intersect.
    #[error("slots must not overlap")]
    OverlappingSlots {
        /// The later of the two overlapping slots.
        value: String,
    },
    /// No slots supplied.
    #[error("at least one slot is required")]
    NoSlots,
    /// More than [`SLOTS_PER_DAY_MAX`] slots supplied.
    #[error("at most {max} slots may be published per day")]
    TooManySlots {
        /// Maximum.
        max: usize,
    },
}

impl ScheduleValidationError {
    /// Machine-readable code surfaced in error details.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTime { .. } => "invalid_time",
            Self::InvalidDate { .. } => "invalid_date",
            Self::ReversedSlot { .. } => "reversed_slot",
            Self::OverlappingSlots { .. } => "overlapping_slots",
            Self::NoSlots => "no_slots",
            Self::TooManySlots { .. } => "too_many_slots",
        }
    }

    /// Offending value, when one exists.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::InvalidTime { value }
            | Self::InvalidDate { value }
            | Self::ReversedSlot { value }
            | Self::OverlappingSlots { value } => Some(value.as_str()),
            Self::NoSlots | Self::TooManySlots { .. } => None,
        }
    }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleValidationError> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return Err(ScheduleValidationError::InvalidDate {
            value: raw.to_owned(),
        });
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        ScheduleValidationError::InvalidDate {
            value: raw.to_owned(),
        }
    })
}

fn parse_time(raw: &str) -> Result<NaiveTime, ScheduleValidationError> {
    let trimmed = raw.trim();
    let invalid = || ScheduleValidationError::InvalidTime {
        value: raw.to_owned(),
    };
    // chrono accepts single-digit hours; the wire format does not.
    if trimmed.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").map_err(|_| invalid())
}

/// Half-open `[start, end)` interval within one day.
///
/// # Examples
/// ```
/// use musiconthego::domain::TimeSlot;
///
/// let slot = TimeSlot::parse("09:00", "10:30").expect("valid slot");
/// assert_eq!(slot.to_string(), "09:00-10:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Build a slot from parsed times.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ScheduleValidationError> {
        if end <= start {
            return Err(ScheduleValidationError::ReversedSlot {
                value: format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a slot from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleValidationError> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    /// Inclusive start.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// True when the two slots share any instant.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely inside this slot.
    pub fn contains(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for TimeSlot {
    type Err = ScheduleValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| ScheduleValidationError::InvalidTime {
                value: value.to_owned(),
            })?;
        Self::parse(start, end)
    }
}

#[derive(Serialize, Deserialize)]
struct TimeSlotDto {
    start: String,
    end: String,
}

impl Serialize for TimeSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TimeSlotDto {
            start: self.start.format("%H:%M").to_string(),
            end: self.end.format("%H:%M").to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dto = TimeSlotDto::deserialize(deserializer)?;
        Self::parse(&dto.start, &dto.end).map_err(serde::de::Error::custom)
    }
}

/// Sort slots and reject empty, oversized, or overlapping sets.
pub fn normalise_slots(mut slots: Vec<TimeSlot>) -> Result<Vec<TimeSlot>, ScheduleValidationError> {
    if slots.is_empty() {
        return Err(ScheduleValidationError::NoSlots);
    }
    if slots.len() > SLOTS_PER_DAY_MAX {
        return Err(ScheduleValidationError::TooManySlots {
            max: SLOTS_PER_DAY_MAX,
        });
    }
    slots.sort();
    if let Some(pair) = slots.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
        return Err(ScheduleValidationError::OverlappingSlots {
            value: pair[1].to_string(),
        });
    }
    Ok(slots)
}

/// One teacher's published slots for a calendar date.
///
/// ## Invariants
/// - `slots` are sorted, non-overlapping, and number between 1 and
///   [`SLOTS_PER_DAY_MAX`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDay {
    pub id: Uuid,
    pub teacher_id: UserId,
    pub date: NaiveDate,
    slots: Vec<TimeSlot>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityDay {
    /// Construct a day after normalising its slots.
    pub fn new(
        id: Uuid,
        teacher_id: UserId,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ScheduleValidationError> {
        Ok(Self {
            id,
            teacher_id,
            date,
            slots: normalise_slots(slots)?,
            updated_at,
        })
    }

    /// Slots sorted by start.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// True when `slot` fits inside one published slot.
    pub fn offers(&self, slot: &TimeSlot) -> bool {
        self.slots.iter().any(|published| published.contains(slot))
    }
}

impl ScheduleValidationError {
    /// Report the failure against the request field `field`.
    pub fn into_field_error(self, field: &str) -> super::Error {
        let details = match self.value() {
            Some(value) => serde_json::json!({ "field": field, "value": value, "code": self.code() }),
            None => serde_json::json!({ "field": field, "code": self.code() }),
        };
        super::Error::invalid_request(self.to_string()).with_details(details)
    }
}

/// Dates report under `date`, everything else under the `slots` list.
impl From<ScheduleValidationError> for super::Error {
    fn from(err: ScheduleValidationError) -> Self {
        let field = match err {
            ScheduleValidationError::InvalidDate { .. } => "date",
            _ => "slots",
        };
        err.into_field_error(field)
    }
}
