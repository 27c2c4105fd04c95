//! Lesson booking handlers.
//!
//! ```text
//! POST /api/bookings                {"teacherId":"…","date":"2026-03-09","slot":{"start":"10:00","end":"11:00"}}
//! GET  /api/bookings/student/me
//! GET  /api/bookings/teacher/me?status=pending
//! GET  /api/bookings/{id}
//! PUT  /api/bookings/{id}/status    {"status":"approved"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Booking, BookingRequest, BookingStatus, Error, Role, parse_date};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::availability::SlotBody;
use crate::inbound::http::schemas::{BookingSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    missing_field_error, parse_optional, parse_user_id, parse_uuid, required,
};

/// Body for `POST /api/bookings`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub teacher_id: Option<String>,
    #[schema(example = "2026-03-09")]
    pub date: Option<String>,
    pub slot: Option<SlotBody>,
    pub message: Option<String>,
}

impl TryFrom<CreateBookingRequest> for BookingRequest {
    type Error = Error;

    fn try_from(value: CreateBookingRequest) -> Result<Self, Self::Error> {
        let teacher_id = parse_user_id(&required(value.teacher_id, "teacherId")?, "teacherId")?;
        let date = parse_date(&required(value.date, "date")?)?;
        let slot = required(value.slot, "slot")?.parse_as("slot")?;
        Ok(Self {
            teacher_id,
            date,
            slot,
            message: value.message,
        })
    }
}

/// Body for status changes.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusRequest {
    #[schema(example = "approved")]
    pub status: Option<String>,
}

impl StatusRequest {
    /// Parse the required `status` field.
    pub(crate) fn parse<T: std::str::FromStr>(&self) -> Result<T, Error> {
        parse_optional(self.status.as_deref(), "status")?
            .ok_or_else(|| missing_field_error("status"))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Request a lesson slot.
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingSchema),
        (status = 400, description = "Invalid or unavailable slot", body = ErrorSchema),
        (status = 404, description = "No such teacher", body = ErrorSchema),
        (status = 409, description = "Slot already taken", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "createBooking"
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let request = BookingRequest::try_from(payload.into_inner())?;
    let booking = state.bookings.create(student, request).await?;
    Ok(HttpResponse::Created().json(booking))
}

#[utoipa::path(
    get,
    path = "/api/bookings/student/me",
    responses(
        (status = 200, description = "Student's bookings", body = [BookingSchema]),
        (status = 403, description = "Students only", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "listStudentBookings"
)]
#[get("/bookings/student/me")]
pub async fn list_student_bookings(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Booking>>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.bookings.list_for_student(student).await?))
}

#[utoipa::path(
    get,
    path = "/api/bookings/teacher/me",
    params(StatusQuery),
    responses(
        (status = 200, description = "Teacher's bookings", body = [BookingSchema]),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "listTeacherBookings"
)]
#[get("/bookings/teacher/me")]
pub async fn list_teacher_bookings(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<StatusQuery>,
) -> ApiResult<web::Json<Vec<Booking>>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let status = parse_optional::<BookingStatus>(query.status.as_deref(), "status")?;
    Ok(web::Json(state.bookings.list_for_teacher(teacher, status).await?))
}

/// Fetch one booking; participants and admins only.
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = BookingSchema),
        (status = 403, description = "Not a participant", body = ErrorSchema),
        (status = 404, description = "No such booking", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    let booking_id = parse_uuid(&path, "id")?;
    Ok(web::Json(state.bookings.get(auth.user(), &booking_id).await?))
}

/// Approve, reject, or cancel a booking.
#[utoipa::path(
    put,
    path = "/api/bookings/{id}/status",
    params(("id" = String, Path, description = "Booking id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingSchema),
        (status = 403, description = "Not allowed for this actor", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "updateBookingStatus"
)]
#[put("/bookings/{id}/status")]
pub async fn update_booking_status(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<web::Json<Booking>> {
    let booking_id = parse_uuid(&path, "id")?;
    let status: BookingStatus = payload.parse()?;
    let booking = state
        .bookings
        .update_status(auth.user(), &booking_id, status)
        .await?;
    Ok(web::Json(booking))
}
