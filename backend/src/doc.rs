//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every REST handler under `/api` plus the health
//! probes. Domain types are described through the wrapper schemas in
//! [`crate::inbound::http::schemas`] so the domain stays free of utoipa.
//!
//! The document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http;
use crate::inbound::http::accounts::{
    AuthResponse, LoginRequest, ProfileUpdateRequest, RegisterRequest,
};
use crate::inbound::http::availability::{AvailabilityRequest, SlotBody};
use crate::inbound::http::bookings::{CreateBookingRequest, StatusRequest};
use crate::inbound::http::community::{CommentRequest, PostRequest};
use crate::inbound::http::inquiries::InquiryBody;
use crate::inbound::http::messages::{ReadReceipt, SendMessageRequest};
use crate::inbound::http::practice::{
    FeedbackRequest, GoalRequest, GoalUpdateRequest, RecordingRequest, SessionRequest,
};
use crate::inbound::http::resources::{AssignRequest, ResourceRequest};
use crate::inbound::http::schemas::{
    AvailabilityDaySchema, BookingSchema, ErrorCodeSchema, ErrorSchema, UserProfileSchema,
    UserSchema,
};

/// Register the bearer token scheme issued by the auth endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.description = Some(
            "Opaque token returned by POST /api/auth/register or /api/auth/login.".to_owned(),
        );
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "MusicOnTheGo API",
        description = "Tutoring marketplace: accounts, scheduling, resources, practice, community, messaging, and admin."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        http::accounts::register,
        http::accounts::login,
        http::accounts::logout,
        http::accounts::get_me,
        http::accounts::update_me,
        http::accounts::list_teachers,
        http::accounts::get_teacher,
        http::availability::list_mine,
        http::availability::list_for_teacher,
        http::availability::set_day,
        http::availability::delete_day,
        http::bookings::create_booking,
        http::bookings::list_student_bookings,
        http::bookings::list_teacher_bookings,
        http::bookings::get_booking,
        http::bookings::update_booking_status,
        http::resources::create_resource,
        http::resources::list_resources,
        http::resources::list_my_resources,
        http::resources::list_assigned_resources,
        http::resources::update_resource,
        http::resources::delete_resource,
        http::resources::assign_resource,
        http::resources::unassign_resource,
        http::practice::log_session,
        http::practice::list_sessions,
        http::practice::delete_session,
        http::practice::stats,
        http::practice::create_goal,
        http::practice::list_goals,
        http::practice::update_goal,
        http::practice::delete_goal,
        http::practice::create_recording,
        http::practice::list_recordings,
        http::practice::list_shared_recordings,
        http::practice::give_feedback,
        http::community::list_posts,
        http::community::create_post,
        http::community::get_post,
        http::community::delete_post,
        http::community::toggle_like,
        http::community::add_comment,
        http::community::delete_comment,
        http::messages::send_message,
        http::messages::list_conversations,
        http::messages::get_conversation,
        http::messages::mark_read,
        http::inquiries::create_inquiry,
        http::inquiries::list_teacher_inquiries,
        http::inquiries::list_student_inquiries,
        http::inquiries::update_inquiry_status,
        http::uploads::upload_profile_image,
        http::uploads::upload_resource_file,
        http::admin::stats,
        http::admin::list_users,
        http::admin::delete_user,
        http::admin::list_bookings,
        http::admin::export,
        http::health::ready,
        http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserSchema,
        UserProfileSchema,
        BookingSchema,
        AvailabilityDaySchema,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        ProfileUpdateRequest,
        AvailabilityRequest,
        SlotBody,
        CreateBookingRequest,
        StatusRequest,
        ResourceRequest,
        AssignRequest,
        SessionRequest,
        GoalRequest,
        GoalUpdateRequest,
        RecordingRequest,
        FeedbackRequest,
        PostRequest,
        CommentRequest,
        SendMessageRequest,
        ReadReceipt,
        InquiryBody,
    )),
    tags(
        (name = "auth", description = "Registration, login, and logout"),
        (name = "users", description = "Profiles and the teacher directory"),
        (name = "availability", description = "Teacher availability calendar"),
        (name = "bookings", description = "Lesson bookings"),
        (name = "resources", description = "Teaching resources and assignments"),
        (name = "practice", description = "Practice sessions, goals, and recordings"),
        (name = "community", description = "Community feed"),
        (name = "messages", description = "Direct messages"),
        (name = "inquiries", description = "Lesson inquiries"),
        (name = "uploads", description = "Media uploads"),
        (name = "admin", description = "Admin panel data and exports"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Registration checks for the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        insta::assert_json_snapshot!(paths, @r#"
    [
      "/api/admin/bookings",
      "/api/admin/export/{collection}",
      "/api/admin/stats",
      "/api/admin/users",
      "/api/admin/users/{id}",
      "/api/auth/login",
      "/api/auth/logout",
      "/api/auth/register",
      "/api/availability",
      "/api/availability/me",
      "/api/availability/teachers/{teacherId}",
      "/api/availability/{id}",
      "/api/bookings",
      "/api/bookings/student/me",
      "/api/bookings/teacher/me",
      "/api/bookings/{id}",
      "/api/bookings/{id}/status",
      "/api/community/posts",
      "/api/community/posts/{id}",
      "/api/community/posts/{id}/comments",
      "/api/community/posts/{id}/comments/{commentId}",
      "/api/community/posts/{id}/like",
      "/api/inquiries",
      "/api/inquiries/student",
      "/api/inquiries/teacher",
      "/api/inquiries/{id}/status",
      "/api/messages",
      "/api/messages/conversations",
      "/api/messages/conversations/{userId}",
      "/api/messages/conversations/{userId}/read",
      "/api/practice/goals",
      "/api/practice/goals/{id}",
      "/api/practice/recordings",
      "/api/practice/recordings/shared",
      "/api/practice/recordings/{id}/feedback",
      "/api/practice/sessions",
      "/api/practice/sessions/{id}",
      "/api/practice/stats",
      "/api/resources",
      "/api/resources/assigned",
      "/api/resources/mine",
      "/api/resources/{id}",
      "/api/resources/{id}/assignments",
      "/api/resources/{id}/assignments/{studentId}",
      "/api/teachers",
      "/api/teachers/{id}",
      "/api/uploads/profile-image",
      "/api/uploads/resource-file",
      "/api/users/me",
      "/health/live",
      "/health/ready"
    ]
    "#);
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(matches!(
            components.security_schemes.get("BearerAuth"),
            Some(SecurityScheme::Http(_))
        ));
    }

    #[rstest]
    #[case("crate.domain.Error", &["code", "message", "traceId"])]
    #[case("crate.domain.User", &["id", "name", "email", "role", "profile"])]
    #[case("crate.domain.UserProfile", &["instruments", "hourlyRate", "profileImageUrl"])]
    fn wrapper_schemas_expose_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let present = object_fields(schemas.get(name).expect("schema registered"));
        for field in fields {
            assert!(present.iter().any(|p| p == field), "{name} should have {field}");
        }
    }
}
