//! Lesson inquiry handlers.
//!
//! ```text
//! POST /api/inquiries
//! GET  /api/inquiries/teacher?status=
//! GET  /api/inquiries/student
//! PUT  /api/inquiries/{id}/status   {"status":"read"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Inquiry, InquiryDraft, InquiryRequest, InquiryStatus, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::bookings::{StatusQuery, StatusRequest};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_optional, parse_user_id, parse_uuid, required};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InquiryBody {
    pub teacher_id: Option<String>,
    pub instrument: Option<String>,
    /// `beginner`, `intermediate`, or `advanced`.
    pub level: Option<String>,
    pub age_group: Option<String>,
    /// `in_person` or `online`.
    pub lesson_type: Option<String>,
    pub availability: Option<String>,
    pub goals: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<InquiryBody> for InquiryRequest {
    type Error = Error;

    fn try_from(value: InquiryBody) -> Result<Self, Self::Error> {
        let teacher_id = parse_user_id(&required(value.teacher_id, "teacherId")?, "teacherId")?;
        let draft = InquiryDraft {
            teacher_id,
            instrument: required(value.instrument, "instrument")?,
            level: required(value.level, "level")?,
            age_group: value.age_group,
            lesson_type: value.lesson_type,
            availability: value.availability,
            goals: value.goals,
            message: required(value.message, "message")?,
        };
        Ok(Self::try_from(draft)?)
    }
}

#[utoipa::path(
    post,
    path = "/api/inquiries",
    request_body = InquiryBody,
    responses(
        (status = 201, description = "Inquiry sent"),
        (status = 400, description = "Invalid inquiry", body = ErrorSchema),
        (status = 404, description = "No such teacher", body = ErrorSchema)
    ),
    tags = ["inquiries"],
    operation_id = "createInquiry"
)]
#[post("/inquiries")]
pub async fn create_inquiry(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<InquiryBody>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let request = InquiryRequest::try_from(payload.into_inner())?;
    let inquiry = state.inquiries.create(student, request).await?;
    Ok(HttpResponse::Created().json(inquiry))
}

#[utoipa::path(
    get,
    path = "/api/inquiries/teacher",
    params(StatusQuery),
    responses(
        (status = 200, description = "Inquiries addressed to the caller"),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["inquiries"],
    operation_id = "listTeacherInquiries"
)]
#[get("/inquiries/teacher")]
pub async fn list_teacher_inquiries(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<StatusQuery>,
) -> ApiResult<web::Json<Vec<Inquiry>>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let status = parse_optional::<InquiryStatus>(query.status.as_deref(), "status")?;
    Ok(web::Json(
        state.inquiries.list_for_teacher(teacher, status).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/inquiries/student",
    responses(
        (status = 200, description = "Inquiries the caller sent"),
        (status = 403, description = "Students only", body = ErrorSchema)
    ),
    tags = ["inquiries"],
    operation_id = "listStudentInquiries"
)]
#[get("/inquiries/student")]
pub async fn list_student_inquiries(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Inquiry>>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.inquiries.list_for_student(student).await?))
}

#[utoipa::path(
    put,
    path = "/api/inquiries/{id}/status",
    params(("id" = String, Path, description = "Inquiry id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Updated inquiry"),
        (status = 403, description = "Not the addressed teacher", body = ErrorSchema),
        (status = 409, description = "Status may only move forward", body = ErrorSchema)
    ),
    tags = ["inquiries"],
    operation_id = "updateInquiryStatus"
)]
#[put("/inquiries/{id}/status")]
pub async fn update_inquiry_status(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<web::Json<Inquiry>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let inquiry_id = parse_uuid(&path, "id")?;
    let status = payload.parse::<InquiryStatus>()?;
    Ok(web::Json(
        state
            .inquiries
            .update_status(teacher, &inquiry_id, status)
            .await?,
    ))
}
