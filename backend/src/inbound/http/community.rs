//! Community feed handlers.
//!
//! ```text
//! GET    /api/community/posts?instrument=&authorId=&mediaType=&page=&limit=
//! POST   /api/community/posts
//! GET    /api/community/posts/{id}
//! DELETE /api/community/posts/{id}
//! POST   /api/community/posts/{id}/like
//! POST   /api/community/posts/{id}/comments
//! DELETE /api/community/posts/{id}/comments/{commentId}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CommunityPost, Error, LikeState, MediaType, PostDraft, PostFilter, PostWithComments,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    PageQuery, parse_optional, parse_user_id, parse_uuid, required,
};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub media_url: Option<String>,
    /// `text` (default), `image`, `audio`, or `video`.
    pub media_type: Option<String>,
    pub instrument: Option<String>,
    /// `public` (default), `students`, or `teachers`.
    pub visibility: Option<String>,
}

impl TryFrom<PostRequest> for PostDraft {
    type Error = Error;

    fn try_from(value: PostRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required(value.title, "title")?,
            description: value.description,
            media_url: value.media_url,
            media_type: value.media_type,
            instrument: value.instrument,
            visibility: value.visibility,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PostListQuery {
    pub instrument: Option<String>,
    pub author_id: Option<String>,
    pub media_type: Option<String>,
}

impl TryFrom<PostListQuery> for PostFilter {
    type Error = Error;

    fn try_from(query: PostListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            instrument: query.instrument.filter(|value| !value.trim().is_empty()),
            author_id: query
                .author_id
                .as_deref()
                .map(|raw| parse_user_id(raw, "authorId"))
                .transpose()?,
            media_type: parse_optional::<MediaType>(query.media_type.as_deref(), "mediaType")?,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CommentRequest {
    pub text: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/community/posts",
    params(PostListQuery, PageQuery),
    responses(
        (status = 200, description = "Page of posts visible to the caller"),
        (status = 400, description = "Invalid filter", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "listPosts"
)]
#[get("/community/posts")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    query: web::Query<PostListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<CommunityPost>>> {
    let filter = PostFilter::try_from(query.into_inner())?;
    let page = page.to_request()?;
    Ok(web::Json(state.community.list(auth.user(), filter, page).await?))
}

#[utoipa::path(
    post,
    path = "/api/community/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created"),
        (status = 400, description = "Invalid post", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "createPost"
)]
#[post("/community/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: web::Json<PostRequest>,
) -> ApiResult<HttpResponse> {
    let draft = PostDraft::try_from(payload.into_inner())?;
    let post = state.community.create(auth.user(), draft).await?;
    Ok(HttpResponse::Created().json(post))
}

#[utoipa::path(
    get,
    path = "/api/community/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post with comments"),
        (status = 404, description = "Missing or not visible", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "getPost"
)]
#[get("/community/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<PostWithComments>> {
    let post_id = parse_uuid(&path, "id")?;
    Ok(web::Json(state.community.get(auth.user(), &post_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/community/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "No such post", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "deletePost"
)]
#[delete("/community/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let post_id = parse_uuid(&path, "id")?;
    state.community.delete(auth.user(), &post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/community/posts/{id}/like",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Like state after toggling"),
        (status = 404, description = "Missing or not visible", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "toggleLike"
)]
#[post("/community/posts/{id}/like")]
pub async fn toggle_like(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeState>> {
    let post_id = parse_uuid(&path, "id")?;
    Ok(web::Json(
        state.community.toggle_like(auth.user(), &post_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/community/posts/{id}/comments",
    params(("id" = String, Path, description = "Post id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added"),
        (status = 400, description = "Invalid comment", body = ErrorSchema),
        (status = 404, description = "Missing or not visible", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "addComment"
)]
#[post("/community/posts/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let post_id = parse_uuid(&path, "id")?;
    let text = required(payload.into_inner().text, "text")?;
    let comment = state
        .community
        .add_comment(auth.user(), &post_id, text)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[utoipa::path(
    delete,
    path = "/api/community/posts/{id}/comments/{commentId}",
    params(
        ("id" = String, Path, description = "Post id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the comment author", body = ErrorSchema),
        (status = 404, description = "No such comment", body = ErrorSchema)
    ),
    tags = ["community"],
    operation_id = "deleteComment"
)]
#[delete("/community/posts/{id}/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = parse_uuid(&post_id, "id")?;
    let comment_id = parse_uuid(&comment_id, "commentId")?;
    state
        .community
        .delete_comment(auth.user(), &post_id, &comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
