//! Multipart upload handlers.
//!
//! Both routes read a single `file` part. The body is buffered up to the
//! media service's byte ceiling; anything larger is refused with 413 before
//! the media host is contacted.
//!
//! ```text
//! POST /api/uploads/profile-image   multipart/form-data; file=<image>
//! POST /api/uploads/resource-file   multipart/form-data; file=<pdf|audio|video|image|text>
//! ```

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{post, web};
use futures_util::TryStreamExt;
use tracing::debug;

use crate::domain::ports::IncomingFile;
use crate::domain::{Error, Role, UploadedMedia};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerAuth;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::missing_field_error;

const FILE_FIELD: &str = "file";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

fn multipart_error(err: MultipartError) -> Error {
    Error::invalid_field(FILE_FIELD, "invalid_multipart", err.to_string())
}

fn field_name(field: &Field) -> Option<&str> {
    field.content_disposition().and_then(|cd| cd.get_name())
}

async fn drain(field: &mut Field) -> Result<(), Error> {
    while field.try_next().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

/// Buffer the `file` part, enforcing `max_bytes` while reading.
async fn read_file(mut payload: Multipart, max_bytes: usize) -> Result<IncomingFile, Error> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field_name(&field) != Some(FILE_FIELD) {
            drain(&mut field).await?;
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_owned();
        let content_type = field
            .content_type()
            .map_or_else(|| FALLBACK_CONTENT_TYPE.to_owned(), ToString::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                debug!(max_bytes, "upload exceeded limit while streaming");
                return Err(Error::payload_too_large(format!(
                    "uploaded file exceeds the {max_bytes} byte limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(IncomingFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(missing_field_error(FILE_FIELD))
}

#[utoipa::path(
    post,
    path = "/api/uploads/profile-image",
    request_body(content_type = "multipart/form-data", description = "`file` part holding a JPEG, PNG, WebP, or GIF"),
    responses(
        (status = 200, description = "Stored image; profile updated"),
        (status = 400, description = "Missing file or unsupported type", body = ErrorSchema),
        (status = 413, description = "File too large", body = ErrorSchema),
        (status = 503, description = "Media host unavailable", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "uploadProfileImage"
)]
#[post("/uploads/profile-image")]
pub async fn upload_profile_image(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: Multipart,
) -> ApiResult<web::Json<UploadedMedia>> {
    let file = read_file(payload, state.media.max_upload_bytes()).await?;
    Ok(web::Json(
        state.media.upload_profile_image(auth.user(), file).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/uploads/resource-file",
    request_body(content_type = "multipart/form-data", description = "`file` part holding the resource"),
    responses(
        (status = 200, description = "Stored file"),
        (status = 400, description = "Missing file or unsupported type", body = ErrorSchema),
        (status = 403, description = "Teachers only", body = ErrorSchema),
        (status = 413, description = "File too large", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "uploadResourceFile"
)]
#[post("/uploads/resource-file")]
pub async fn upload_resource_file(
    state: web::Data<HttpState>,
    auth: BearerAuth,
    payload: Multipart,
) -> ApiResult<web::Json<UploadedMedia>> {
    let teacher = auth.require(&[Role::Teacher])?;
    let file = read_file(payload, state.media.max_upload_bytes()).await?;
    Ok(web::Json(
        state.media.upload_resource_file(teacher, file).await?,
    ))
}
