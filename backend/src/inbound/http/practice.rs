//! Practice log, goal, and recording handlers.
//!
//! ```text
//! POST   /api/practice/sessions        GET /api/practice/sessions?from=&to=
//! DELETE /api/practice/sessions/{id}   GET /api/practice/stats
//! POST   /api/practice/goals           GET /api/practice/goals
//! PUT    /api/practice/goals/{id}      DELETE /api/practice/goals/{id}
//! POST   /api/practice/recordings      GET /api/practice/recordings
//! GET    /api/practice/recordings/shared
//! PUT    /api/practice/recordings/{id}/feedback
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, Goal, GoalDraft, GoalUpdate, PracticeSession, PracticeSessionDraft, PracticeStats,
    Recording, RecordingDraft, Role, parse_date,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    parse_optional_timestamp, parse_user_id, parse_uuid, required,
};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub instrument: Option<String>,
    /// 1 to 600.
    pub duration_minutes: Option<i64>,
    pub focus: Option<String>,
    pub notes: Option<String>,
    /// RFC 3339; defaults to now and must not be in the future.
    pub practiced_at: Option<String>,
}

impl TryFrom<SessionRequest> for PracticeSessionDraft {
    type Error = Error;

    fn try_from(value: SessionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            instrument: required(value.instrument, "instrument")?,
            duration_minutes: required(value.duration_minutes, "durationMinutes")?,
            focus: value.focus,
            notes: value.notes,
            practiced_at: parse_optional_timestamp(value.practiced_at.as_deref(), "practicedAt")?,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionRangeQuery {
    /// RFC 3339 lower bound.
    pub from: Option<String>,
    /// RFC 3339 upper bound.
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub title: Option<String>,
    pub instrument: Option<String>,
    /// 1 to 10080.
    pub target_minutes_per_week: Option<i64>,
    #[schema(example = "2026-06-30")]
    pub due_date: Option<String>,
}

impl TryFrom<GoalRequest> for GoalDraft {
    type Error = Error;

    fn try_from(value: GoalRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required(value.title, "title")?,
            instrument: value.instrument,
            target_minutes_per_week: required(
                value.target_minutes_per_week,
                "targetMinutesPerWeek",
            )?,
            due_date: value
                .due_date
                .as_deref()
                .map(|raw| {
                    parse_date(raw).map_err(|_| {
                        Error::invalid_field("dueDate", "invalid_date", "dueDate must be YYYY-MM-DD")
                    })
                })
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdateRequest {
    pub title: Option<String>,
    pub target_minutes_per_week: Option<i64>,
    pub completed: Option<bool>,
}

impl From<GoalUpdateRequest> for GoalUpdate {
    fn from(value: GoalUpdateRequest) -> Self {
        Self {
            title: value.title,
            target_minutes_per_week: value.target_minutes_per_week,
            completed: value.completed,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRequest {
    /// Teacher the recording is shared with.
    pub teacher_id: Option<String>,
    pub title: Option<String>,
    pub file_url: Option<String>,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl TryFrom<RecordingRequest> for RecordingDraft {
    type Error = Error;

    fn try_from(value: RecordingRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            teacher_id: value
                .teacher_id
                .as_deref()
                .map(|raw| parse_user_id(raw, "teacherId"))
                .transpose()?,
            title: required(value.title, "title")?,
            file_url: required(value.file_url, "fileUrl")?,
            duration_seconds: value.duration_seconds,
            notes: value.notes,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FeedbackRequest {
    pub feedback: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/practice/sessions",
    request_body = SessionRequest,
    responses(
        (status = 201, description = "Session logged"),
        (status = 400, description = "Invalid session", body = ErrorSchema),
        (status = 403, description = "Students only", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "logPracticeSession"
)]
#[post("/practice/sessions")]
pub async fn log_session(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<SessionRequest>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let draft = PracticeSessionDraft::try_from(payload.into_inner())?;
    let session = state.practice.log_session(student, draft).await?;
    Ok(HttpResponse::Created().json(session))
}

#[utoipa::path(
    get,
    path = "/api/practice/sessions",
    params(SessionRangeQuery),
    responses(
        (status = 200, description = "Sessions, newest first"),
        (status = 400, description = "Invalid range", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "listPracticeSessions"
)]
#[get("/practice/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<SessionRangeQuery>,
) -> ApiResult<web::Json<Vec<PracticeSession>>> {
    let student = auth.require(&[Role::Student])?;
    let from = parse_optional_timestamp(query.from.as_deref(), "from")?;
    let to = parse_optional_timestamp(query.to.as_deref(), "to")?;
    Ok(web::Json(state.practice.list_sessions(student, from, to).await?))
}

#[utoipa::path(
    delete,
    path = "/api/practice/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such session", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "deletePracticeSession"
)]
#[delete("/practice/sessions/{id}")]
pub async fn delete_session(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let session_id = parse_uuid(&path, "id")?;
    state.practice.delete_session(student, &session_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/practice/stats",
    responses(
        (status = 200, description = "Totals, streak, and goal progress"),
        (status = 403, description = "Students only", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "practiceStats"
)]
#[get("/practice/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<PracticeStats>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.practice.stats(student).await?))
}

#[utoipa::path(
    post,
    path = "/api/practice/goals",
    request_body = GoalRequest,
    responses(
        (status = 201, description = "Goal created"),
        (status = 400, description = "Invalid goal", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "createGoal"
)]
#[post("/practice/goals")]
pub async fn create_goal(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<GoalRequest>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let draft = GoalDraft::try_from(payload.into_inner())?;
    let goal = state.practice.create_goal(student, draft).await?;
    Ok(HttpResponse::Created().json(goal))
}

#[utoipa::path(
    get,
    path = "/api/practice/goals",
    responses((status = 200, description = "Goals")),
    tags = ["practice"],
    operation_id = "listGoals"
)]
#[get("/practice/goals")]
pub async fn list_goals(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Goal>>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.practice.list_goals(student).await?))
}

#[utoipa::path(
    put,
    path = "/api/practice/goals/{id}",
    params(("id" = String, Path, description = "Goal id")),
    request_body = GoalUpdateRequest,
    responses(
        (status = 200, description = "Updated goal"),
        (status = 400, description = "Invalid update", body = ErrorSchema),
        (status = 404, description = "No such goal", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "updateGoal"
)]
#[put("/practice/goals/{id}")]
pub async fn update_goal(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<GoalUpdateRequest>,
) -> ApiResult<web::Json<Goal>> {
    let student = auth.require(&[Role::Student])?;
    let goal_id = parse_uuid(&path, "id")?;
    let update = GoalUpdate::from(payload.into_inner());
    Ok(web::Json(
        state.practice.update_goal(student, &goal_id, update).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/practice/goals/{id}",
    params(("id" = String, Path, description = "Goal id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such goal", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "deleteGoal"
)]
#[delete("/practice/goals/{id}")]
pub async fn delete_goal(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let goal_id = parse_uuid(&path, "id")?;
    state.practice.delete_goal(student, &goal_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/practice/recordings",
    request_body = RecordingRequest,
    responses(
        (status = 201, description = "Recording stored"),
        (status = 400, description = "Invalid recording", body = ErrorSchema),
        (status = 404, description = "Shared teacher not found", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "createRecording"
)]
#[post("/practice/recordings")]
pub async fn create_recording(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<RecordingRequest>,
) -> ApiResult<HttpResponse> {
    let student = auth.require(&[Role::Student])?;
    let draft = RecordingDraft::try_from(payload.into_inner())?;
    let recording = state.practice.create_recording(student, draft).await?;
    Ok(HttpResponse::Created().json(recording))
}

#[utoipa::path(
    get,
    path = "/api/practice/recordings",
    responses((status = 200, description = "Own recordings")),
    tags = ["practice"],
    operation_id = "listRecordings"
)]
#[get("/practice/recordings")]
pub async fn list_recordings(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Recording>>> {
    let student = auth.require(&[Role::Student])?;
    Ok(web::Json(state.practice.list_recordings(student).await?))
}

#[utoipa::path(
    get,
    path = "/api/practice/recordings/shared",
    responses(
        (status = 200, description = "Recordings shared with the caller"),
        (status = 403, description = "Teachers only", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "listSharedRecordings"
)]
#[get("/practice/recordings/shared")]
pub async fn list_shared_recordings(
    state: web::Data<HttpState>,
    auth: BearerAuth,
) -> ApiResult<web::Json<Vec<Recording>>> {
    let teacher = auth.require(&[Role::Teacher])?;
    Ok(web::Json(state.practice.list_shared_recordings(teacher).await?))
}

#[utoipa::path(
    put,
    path = "/api/practice/recordings/{id}/feedback",
    params(("id" = String, Path, description = "Recording id")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Recording with feedback"),
        (status = 403, description = "Not the shared teacher", body = ErrorSchema)
    ),
    tags = ["practice"],
    operation_id = "giveRecordingFeedback"
)]
#[put("/practice/recordings/{id}/feedback")]
pub async fn give_feedback(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<web::Json<Recording>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let recording_id = parse_uuid(&path, "id")?;
    let feedback = required(payload.into_inner().feedback, "feedback")?;
    Ok(web::Json(
        state
            .practice
            .give_feedback(teacher, &recording_id, feedback)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestPorts, api_app, bearer, json_body};
    use crate::test_support::{fixture_now, sample_user};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[actix_web::test]
    async fn log_session_parses_timestamp() {
        let student = sample_user(Role::Student, "Sam Student");
        let student_id = student.id;
        let mut ports = TestPorts::signed_in(&student);
        ports
            .practice
            .expect_log_session()
            .withf(|_, draft| {
                draft.duration_minutes == 45 && draft.practiced_at == Some(fixture_now())
            })
            .return_once(move |_, draft| {
                Ok(PracticeSession::new(student_id, draft, fixture_now()).expect("valid session"))
            });
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/practice/sessions")
                .insert_header(bearer())
                .set_json(json!({
                    "instrument": "violin",
                    "durationMinutes": 45,
                    "practicedAt": "2026-03-02T10:00:00Z"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["durationMinutes"], 45);
    }

    #[rstest]
    #[actix_web::test]
    async fn session_range_must_be_rfc3339() {
        let student = sample_user(Role::Student, "Sam Student");
        let mut ports = TestPorts::signed_in(&student);
        ports.practice.expect_list_sessions().times(0);
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/practice/sessions?from=last-week")
                .insert_header(bearer())
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "from");
    }

    #[rstest]
    #[actix_web::test]
    async fn goal_due_date_is_validated() {
        let student = sample_user(Role::Student, "Sam Student");
        let mut ports = TestPorts::signed_in(&student);
        ports.practice.expect_create_goal().times(0);
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/practice/goals")
                .insert_header(bearer())
                .set_json(json!({
                    "title": "Scales",
                    "targetMinutesPerWeek": 120,
                    "dueDate": "30/06/2026"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "dueDate");
    }

    #[rstest]
    #[actix_web::test]
    async fn shared_recordings_are_for_teachers() {
        let student = sample_user(Role::Student, "Sam Student");
        let mut ports = TestPorts::signed_in(&student);
        ports.practice.expect_list_shared_recordings().times(0);
        let app = test::init_service(api_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/practice/recordings/shared")
                .insert_header(bearer())
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
