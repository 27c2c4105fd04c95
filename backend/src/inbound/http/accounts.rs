//! Account, profile, and teacher directory handlers.
//!
//! ```text
//! POST /api/auth/register   {"name":"Ada","email":"ada@example.com","password":"…","role":"student"}
//! POST /api/auth/login      {"email":"ada@example.com","password":"…"}
//! POST /api/auth/logout
//! GET  /api/users/me
//! PUT  /api/users/me
//! GET  /api/teachers?instrument=&location=&search=&page=&limit=
//! GET  /api/teachers/{id}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use pagination::Paginated;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AuthSession, Error, LoginCredentials, ProfileUpdate, ProfileUpdateDraft, RegistrationDraft,
    RegistrationRequest, TeacherFilter, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::{ErrorSchema, UserSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{PageQuery, parse_user_id, required};

/// Registration body for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `student` or `teacher`.
    pub role: Option<String>,
    #[serde(default)]
    pub instruments: Vec<String>,
    pub location: Option<String>,
}

impl TryFrom<RegisterRequest> for RegistrationRequest {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let draft = RegistrationDraft {
            name: required(value.name, "name")?,
            email: required(value.email, "email")?,
            password: required(value.password, "password")?,
            role: required(value.role, "role")?,
            instruments: value.instruments,
            location: value.location,
        };
        Ok(Self::try_from(draft)?)
    }
}

/// Login body for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token and profile returned after registration or login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[schema(value_type = UserSchema)]
    pub user: User,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.expose().to_owned(),
            user: session.user,
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial profile update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub instruments: Option<Vec<String>>,
    pub experience: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Teachers only; `null` clears the rate.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub hourly_rate: Option<Option<i64>>,
}

impl TryFrom<ProfileUpdateRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        let hourly_rate = value
            .hourly_rate
            .map(|rate| {
                rate.map(|raw| {
                    u32::try_from(raw).map_err(|_| {
                        Error::invalid_field(
                            "hourlyRate",
                            "invalid_value",
                            "hourly rate must be a non-negative whole number",
                        )
                    })
                })
                .transpose()
            })
            .transpose()?;
        let draft = ProfileUpdateDraft {
            name: value.name,
            instruments: value.instruments,
            experience: value.experience,
            bio: value.bio,
            location: value.location,
            hourly_rate,
        };
        Ok(Self::try_from(draft)?)
    }
}

/// Teacher directory filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherQuery {
    pub instrument: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
}

impl From<TeacherQuery> for TeacherFilter {
    fn from(query: TeacherQuery) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };
        Self {
            instrument: clean(query.instrument),
            location: clean(query.location),
            search: clean(query.search),
        }
    }
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = RegistrationRequest::try_from(payload.into_inner())?;
    let session = state.auth.register(request).await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(session)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&email, &password)?;
    let session = state.auth.login(credentials).await?;
    Ok(web::Json(AuthResponse::from(session)))
}

/// Revoke the presented token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(state: web::Data<HttpState>, auth: BearerAuth) -> ApiResult<HttpResponse> {
    state.auth.logout(auth.token()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = UserSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getMe"
)]
#[get("/users/me")]
pub async fn get_me(state: web::Data<HttpState>, auth: BearerAuth) -> ApiResult<web::Json<User>> {
    let user = state.profiles.get_me(&auth.user().id).await?;
    Ok(web::Json(user))
}

/// Update the caller's profile.
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateMe"
)]
#[put("/users/me")]
pub async fn update_me(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<User>> {
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let user = state.profiles.update_me(&auth.user().id, update).await?;
    Ok(web::Json(user))
}

/// Browse teachers.
#[utoipa::path(
    get,
    path = "/api/teachers",
    params(TeacherQuery, PageQuery),
    responses(
        (status = 200, description = "Page of teachers"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listTeachers"
)]
#[get("/teachers")]
pub async fn list_teachers(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    filter: web::Query<TeacherQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<User>>> {
    let page = page.to_request()?;
    let teachers = state
        .profiles
        .list_teachers(TeacherFilter::from(filter.into_inner()), page)
        .await?;
    Ok(web::Json(teachers))
}

/// Fetch one teacher's public profile.
#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    params(("id" = String, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher", body = UserSchema),
        (status = 404, description = "No such teacher", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getTeacher"
)]
#[get("/teachers/{id}")]
pub async fn get_teacher(
    state: web::Data<HttpState>,
    _auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let teacher_id = parse_user_id(&path, "id")?;
    let teacher = state.profiles.get_teacher(&teacher_id).await?;
    Ok(web::Json(teacher))
}
