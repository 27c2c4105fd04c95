//! Teaching resource handlers.
//!
//! ```text
//! POST   /api/resources
//! GET    /api/resources?instrument=&level=&teacherId=&search=&page=&limit=
//! GET    /api/resources/mine
//! GET    /api/resources/assigned
//! PUT    /api/resources/{id}
//! DELETE /api/resources/{id}
//! POST   /api/resources/{id}/assignments            {"studentIds":["…"]}
//! DELETE /api/resources/{id}/assignments/{studentId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::AssignmentOutcome;
use crate::domain::{
    Error, Resource, ResourceContent, ResourceDraft, ResourceFilter, Role, SkillLevel,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    PageQuery, parse_optional, parse_user_id, parse_user_ids, parse_uuid, required,
};

/// Body for creating or replacing a resource.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
    #[schema(example = "pdf")]
    pub file_type: Option<String>,
    pub instrument: Option<String>,
    /// `beginner`, `intermediate`, or `advanced`.
    pub level: Option<String>,
    pub category: Option<String>,
}

impl TryFrom<ResourceRequest> for ResourceContent {
    type Error = Error;

    fn try_from(value: ResourceRequest) -> Result<Self, Self::Error> {
        let draft = ResourceDraft {
            title: required(value.title, "title")?,
            description: value.description,
            file_url: required(value.file_url, "fileUrl")?,
            file_type: required(value.file_type, "fileType")?,
            instrument: required(value.instrument, "instrument")?,
            level: required(value.level, "level")?,
            category: value.category,
        };
        Ok(Self::try_from(draft)?)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ResourceQuery {
    pub instrument: Option<String>,
    pub level: Option<String>,
    pub teacher_id: Option<String>,
    pub search: Option<String>,
}

impl TryFrom<ResourceQuery> for ResourceFilter {
    type Error = Error;

    fn try_from(query: ResourceQuery) -> Result<Self, Self::Error> {
        let teacher_id = query
            .teacher_id
            .as_deref()
            .map(|raw| parse_user_id(raw, "teacherId"))
            .transpose()?;
        Ok(Self {
            instrument: query.instrument.filter(|value| !value.trim().is_empty()),
            level: parse_optional::<SkillLevel>(query.level.as_deref(), "level")?,
            teacher_id,
            search: query.search.filter(|value| !value.trim().is_empty()),
        })
    }
}

/// Body for `POST /api/resources/{id}/assignments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub student_ids: Option<Vec<String>>,
}

#[utoipa::path(
    post,
    path = "/api/resources",
    request_body = ResourceRequest,
    responses(
        (status = 201, description = "Resource created"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "createResource"
)]
#[post("/resources")]
pub async fn create_resource(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<ResourceRequest>,
) -> ApiResult<HttpResponse> {
    let teacher = auth.require(&[Role::Teacher])?;
    let content = ResourceContent::try_from(payload.into_inner())?;
    let resource = state.resources.create(teacher, content).await?;
    Ok(HttpResponse::Created().json(resource))
}

#[utoipa::path(
    get,
    path = "/api/resources",
    params(ResourceQuery, PageQuery),
    responses(
        (status = 200, description = "Page of resources"),
        (status = 400, description = "Invalid filter", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listResources"
)]
#[get("/resources")]
pub async fn list_resources(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    query: web::Query<ResourceQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Resource>>> {
    let filter = ResourceFilter::try_from(query.into_inner())?;
    let page = page.to_request()?;
    Ok(web::Json(state.resources.list(filter, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/resources/mine",
    responses(
        (status = 200, description = "Resources owned by the caller"),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listMyResources"
)]
#[get("/resources/mine")]
pub async fn list_my_resources(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Resource>>> {
    let teacher = auth.require(&[Role::Teacher])?;
    Ok(web::Json(state.resources.list_mine(teacher).await?))
}

#[utoipa::path(
    get,
    path = "/api/resources/assigned",
    responses(
        (status = 200, description = "Resources assigned to the caller"),
        (status = 403, description = "Students only", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listAssignedResources"
)]
#[get("/resources/assigned")]
pub async fn list_assigned_resources(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Resource>>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.resources.list_assigned(student).await?))
}

#[utoipa::path(
    put,
    path = "/api/resources/{id}",
    params(("id" = String, Path, description = "Resource id")),
    request_body = ResourceRequest,
    responses(
        (status = 200, description = "Updated resource"),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "No such resource", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "updateResource"
)]
#[put("/resources/{id}")]
pub async fn update_resource(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<ResourceRequest>,
) -> ApiResult<web::Json<Resource>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let resource_id = parse_uuid(&path, "id")?;
    let content = ResourceContent::try_from(payload.into_inner())?;
    Ok(web::Json(
        state.resources.update(teacher, &resource_id, content).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    params(("id" = String, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "No such resource", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "deleteResource"
)]
#[delete("/resources/{id}")]
pub async fn delete_resource(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = auth.require(&[Role::Teacher, Role::Admin])?;
    let resource_id = parse_uuid(&path, "id")?;
    state.resources.delete(actor, &resource_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/resources/{id}/assignments",
    params(("id" = String, Path, description = "Resource id")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Students newly assigned"),
        (status = 400, description = "Unknown or non-student ids", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "assignResource"
)]
#[post("/resources/{id}/assignments")]
pub async fn assign_resource(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<AssignRequest>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let resource_id = parse_uuid(&path, "id")?;
    let student_ids = parse_user_ids(
        &required(payload.into_inner().student_ids, "studentIds")?,
        "studentIds",
    )?;
    Ok(web::Json(
        state
            .resources
            .assign(teacher, &resource_id, student_ids)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/resources/{id}/assignments/{studentId}",
    params(
        ("id" = String, Path, description = "Resource id"),
        ("studentId" = String, Path, description = "Student id")
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 404, description = "No such assignment", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "unassignResource"
)]
#[delete("/resources/{id}/assignments/{student_id}")]
pub async fn unassign_resource(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let teacher = auth.require(&[Role::Teacher])?;
    let (resource_id, student_id) = path.into_inner();
    let resource_id = parse_uuid(&resource_id, "id")?;
    let student_id = parse_user_id(&student_id, "studentId")?;
    state
        .resources
        .unassign(teacher, &resource_id, &student_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
