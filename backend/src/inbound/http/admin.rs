//! Admin panel handlers. Every route requires the `admin` role.
//!
//! ```text
//! GET    /api/admin/stats
//! GET    /api/admin/users?role=&search=&page=&limit=
//! DELETE /api/admin/users/{id}
//! GET    /api/admin/bookings?status=&page=&limit=
//! GET    /api/admin/export/{collection}      text/csv attachment
//! ```

use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, delete, get, web};
use pagination::Paginated;
use serde::Deserialize;
use tracing::error;
use utoipa::IntoParams;

use crate::domain::{
    AdminStats, Booking, BookingStatus, Error, ExportCollection, ExportTable, Role, User,
    UserFilter,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::bookings::StatusQuery;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{PageQuery, parse_optional, parse_user_id};

const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// `student`, `teacher`, or `admin`.
    pub role: Option<String>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

impl TryFrom<UserListQuery> for UserFilter {
    type Error = Error;

    fn try_from(query: UserListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parse_optional::<Role>(query.role.as_deref(), "role")?,
            search: query.search.filter(|value| !value.trim().is_empty()),
        })
    }
}

/// Render an export as CSV with its fixed header row.
fn render_csv(table: &ExportTable) -> Result<Vec<u8>, Error> {
    let write_failed = |err: &dyn std::fmt::Display| {
        error!(collection = %table.collection, error = %err, "csv export failed");
        Error::internal("failed to render export")
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .map_err(|err| write_failed(&err))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|err| write_failed(&err))?;
    }
    writer.into_inner().map_err(|err| write_failed(&err))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform totals"),
        (status = 403, description = "Admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<AdminStats>> {
    auth.require(ADMIN_ONLY)?;
    Ok(web::Json(state.admin.stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery, PageQuery),
    responses(
        (status = 200, description = "Page of users"),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 403, description = "Admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<UserListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<User>>> {
    auth.require(ADMIN_ONLY)?;
    let filter = UserFilter::try_from(query.into_inner())?;
    let page = page.to_request()?;
    Ok(web::Json(state.admin.list_users(filter, page).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted with everything the user owned"),
        (status = 404, description = "No such user", body = ErrorSchema),
        (status = 409, description = "Admins cannot delete themselves", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteUser"
)]
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let admin = auth.require(ADMIN_ONLY)?;
    let user_id = parse_user_id(&path, "id")?;
    state.admin.delete_user(admin, &user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings",
    params(StatusQuery, PageQuery),
    responses(
        (status = 200, description = "Page of bookings"),
        (status = 403, description = "Admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListBookings"
)]
#[get("/admin/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<StatusQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Booking>>> {
    auth.require(ADMIN_ONLY)?;
    let status = parse_optional::<BookingStatus>(query.status.as_deref(), "status")?;
    let page = page.to_request()?;
    Ok(web::Json(state.admin.list_bookings(status, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/export/{collection}",
    params(("collection" = String, Path, description = "users, bookings, resources, inquiries, or posts")),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
        (status = 400, description = "Unknown collection", body = ErrorSchema),
        (status = 403, description = "Admins only", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminExport"
)]
#[get("/admin/export/{collection}")]
pub async fn export(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    auth.require(ADMIN_ONLY)?;
    let collection = path.parse::<ExportCollection>().map_err(|err| {
        Error::invalid_field("collection", "invalid_value", err.to_string())
    })?;
    let table = state.admin.export(collection).await?;
    let body = render_csv(&table)?;
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
        .insert_header((
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{collection}.csv\""),
        ))
        .body(body))
}
