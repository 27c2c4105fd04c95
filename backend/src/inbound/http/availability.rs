//! Teacher availability handlers.
//!
//! ```text
//! GET    /api/availability/teachers/{teacherId}?from=YYYY-MM-DD
//! GET    /api/availability/me
//! PUT    /api/availability   {"date":"2026-03-09","slots":[{"start":"09:00","end":"10:00"}]}
//! DELETE /api/availability/{id}
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AvailabilityDay, Error, Role, TimeSlot, parse_date};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::{AvailabilityDaySchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    parse_optional_date, parse_user_id, parse_uuid, required,
};

/// `HH:MM` bounds of one slot.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SlotBody {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "10:00")]
    pub end: String,
}

impl SlotBody {
    /// Parse the bounds, reporting failures under `field`.
    pub(crate) fn parse_as(&self, field: &str) -> Result<TimeSlot, Error> {
        TimeSlot::parse(&self.start, &self.end).map_err(|err| err.into_field_error(field))
    }
}

impl TryFrom<&SlotBody> for TimeSlot {
    type Error = Error;

    fn try_from(value: &SlotBody) -> Result<Self, Self::Error> {
        value.parse_as("slots")
    }
}

/// Body for `PUT /api/availability`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    #[schema(example = "2026-03-09")]
    pub date: Option<String>,
    pub slots: Option<Vec<SlotBody>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Earliest date to include (`YYYY-MM-DD`).
    pub from: Option<String>,
}

/// List a teacher's published days.
#[utoipa::path(
    get,
    path = "/api/availability/teachers/{teacherId}",
    params(("teacherId" = String, Path, description = "Teacher id"), AvailabilityQuery),
    responses(
        (status = 200, description = "Published days", body = [AvailabilityDaySchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "listTeacherAvailability"
)]
#[get("/availability/teachers/{teacher_id}")]
pub async fn list_for_teacher(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> ApiResult<web::Json<Vec<AvailabilityDay>>> {
    let teacher_id = parse_user_id(&path, "teacherId")?;
    let from = parse_optional_date(query.from.as_deref())?;
    let days = state.availability.list_for_teacher(&teacher_id, from).await?;
    Ok(web::Json(days))
}

/// List the calling teacher's days.
#[utoipa::path(
    get,
    path = "/api/availability/me",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Own days", body = [AvailabilityDaySchema]),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "listMyAvailability"
)]
#[get("/availability/me")]
pub async fn list_mine(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<AvailabilityQuery>,
) -> ApiResult<web::Json<Vec<AvailabilityDay>>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let from = parse_optional_date(query.from.as_deref())?;
    let days = state.availability.list_for_teacher(&teacher.id, from).await?;
    Ok(web::Json(days))
}

/// Replace the slots for one date.
#[utoipa::path(
    put,
    path = "/api/availability",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Stored day", body = AvailabilityDaySchema),
        (status = 400, description = "Invalid slots", body = ErrorSchema),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "setAvailability"
)]
#[put("/availability")]
pub async fn set_day(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<AvailabilityRequest>,
) -> ApiResult<web::Json<AvailabilityDay>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let AvailabilityRequest { date, slots } = payload.into_inner();
    let date = parse_date(&required(date, "date")?)?;
    let slots = required(slots, "slots")?
        .iter()
        .map(TimeSlot::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let day = state.availability.set_day(teacher, date, slots).await?;
    Ok(web::Json(day))
}

/// Remove one of the calling teacher's days.
#[utoipa::path(
    delete,
    path = "/api/availability/{id}",
    params(("id" = String, Path, description = "Availability day id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "No such day", body = ErrorSchema)
    ),
    tags = ["availability"],
    operation_id = "deleteAvailability"
)]
#[delete("/availability/{id}")]
pub async fn delete_day(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let teacher = auth.require(&[Role::Teacher])?;
    let day_id = parse_uuid(&path, "id")?;
    state.availability.delete_day(teacher, &day_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
