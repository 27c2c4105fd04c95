//! Admin panel read models: platform statistics and CSV export tables.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// User counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCounts {
    pub students: u64,
    pub teachers: u64,
    pub admins: u64,
    pub total: u64,
}

/// Booking counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub cancelled: u64,
    pub total: u64,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: RoleCounts,
    pub bookings: BookingCounts,
    pub resources: u64,
    pub posts: u64,
    pub inquiries: u64,
}

/// Collections the admin panel can download as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportCollection {
    Users,
    Bookings,
    Resources,
    Inquiries,
    Posts,
}

/// Unknown export collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("collection must be one of users, bookings, resources, inquiries, or posts")]
pub struct ExportCollectionParseError;

impl ExportCollection {
    /// Path segment and file stem.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Bookings => "bookings",
            Self::Resources => "resources",
            Self::Inquiries => "inquiries",
            Self::Posts => "posts",
        }
    }

    /// Fixed header row; every exported row has the same width.
    pub const fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Users => &[
                "id",
                "name",
                "email",
                "role",
                "instruments",
                "location",
                "hourlyRate",
                "createdAt",
            ],
            Self::Bookings => &[
                "id",
                "studentName",
                "teacherName",
                "date",
                "start",
                "end",
                "status",
                "createdAt",
            ],
            Self::Resources => &[
                "id",
                "teacherName",
                "title",
                "instrument",
                "level",
                "fileType",
                "fileUrl",
                "createdAt",
            ],
            Self::Inquiries => &[
                "id",
                "studentName",
                "teacherName",
                "instrument",
                "level",
                "status",
                "message",
                "createdAt",
            ],
            Self::Posts => &[
                "id",
                "authorName",
                "title",
                "mediaType",
                "visibility",
                "likeCount",
                "commentCount",
                "createdAt",
            ],
        }
    }
}

impl fmt::Display for ExportCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportCollection {
    type Err = ExportCollectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "users" => Ok(Self::Users),
            "bookings" => Ok(Self::Bookings),
            "resources" => Ok(Self::Resources),
            "inquiries" => Ok(Self::Inquiries),
            "posts" => Ok(Self::Posts),
            _ => Err(ExportCollectionParseError),
        }
    }
}

/// Rows ready to be rendered as CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub collection: ExportCollection,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Fixed CSV header row.
    pub fn headers(&self) -> &'static [&'static str] {
        self.collection.headers()
    }
}

#[cfg(test)]
mod tests {
    //! Export collection parsing.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users", ExportCollection::Users)]
    #[case("Bookings", ExportCollection::Bookings)]
    #[case("posts", ExportCollection::Posts)]
    fn parses_collections(#[case] raw: &str, #[case] expected: ExportCollection) {
        assert_eq!(raw.parse(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_collections() {
        assert_eq!(
            "passwords".parse::<ExportCollection>(),
            Err(ExportCollectionParseError)
        );
    }

    #[rstest]
    #[case(ExportCollection::Users)]
    #[case(ExportCollection::Bookings)]
    #[case(ExportCollection::Resources)]
    #[case(ExportCollection::Inquiries)]
    #[case(ExportCollection::Posts)]
    fn headers_start_with_id(#[case] collection: ExportCollection) {
        assert_eq!(collection.headers().first(), Some(&"id"));
    }
}
