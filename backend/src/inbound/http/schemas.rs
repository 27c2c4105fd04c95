//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    #[schema(rename = "conflict")]
    Conflict,
    #[schema(rename = "payload_too_large")]
    PayloadTooLarge,
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "date must not be in the past")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` header.
    trace_id: Option<String>,
    /// `{field, value?, code}` for validation failures.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::UserProfile`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UserProfile)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserProfileSchema {
    instruments: Vec<String>,
    experience: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    /// Whole currency units per hour.
    hourly_rate: Option<u32>,
    profile_image_url: Option<String>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserSchema {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: String,
    #[schema(example = "Ada Lovelace")]
    name: String,
    #[schema(example = "ada@example.com")]
    email: String,
    #[schema(example = "teacher")]
    role: String,
    profile: UserProfileSchema,
    created_at: String,
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::Booking`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Booking)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct BookingSchema {
    id: String,
    student_id: String,
    student_name: String,
    teacher_id: String,
    teacher_name: String,
    #[schema(example = "2026-03-09")]
    date: String,
    #[schema(example = "10:00-11:00")]
    slot: String,
    message: Option<String>,
    #[schema(example = "pending")]
    status: String,
    created_at: String,
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::AvailabilityDay`].
#[derive(ToSchema)]
#[schema(as = crate::domain::AvailabilityDay)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AvailabilityDaySchema {
    id: String,
    teacher_id: String,
    #[schema(example = "2026-03-09")]
    date: String,
    #[schema(example = json!(["09:00-10:00", "10:00-11:00"]))]
    slots: Vec<String>,
    updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn error_code_schema_variants_match_domain() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        for code in [
            "invalid_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "conflict",
            "payload_too_large",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[rstest]
    fn schema_names_follow_domain_paths() {
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert_eq!(UserSchema::name(), "crate.domain.User");
        assert_eq!(BookingSchema::name(), "crate.domain.Booking");
    }

    #[rstest]
    fn user_schema_uses_camel_case() {
        let schema_json = schema_to_json::<UserSchema>();
        assert!(schema_json.contains("createdAt"));
        assert!(schema_json.contains("profileImageUrl") || schema_json.contains("UserProfile"));
    }
}
