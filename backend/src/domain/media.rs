//! Uploaded media validation before it is forwarded to the media host.

use serde::Serialize;

use super::UserId;

/// Default upload ceiling (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const PROFILE_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];
const RESOURCE_TYPE_PREFIXES: [&str; 3] = ["audio/", "video/", "image/"];
const RESOURCE_EXACT_TYPES: [&str; 2] = ["application/pdf", "text/plain"];

/// What an upload is for; decides the allow-list and host folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    ProfileImage,
    ResourceFile,
}

impl MediaKind {
    /// Resource type segment used by the media host's upload URL.
    pub const fn resource_type(self) -> &'static str {
        match self {
            Self::ProfileImage => "image",
            Self::ResourceFile => "auto",
        }
    }

    /// Sub-folder under the configured root folder.
    pub const fn folder(self) -> &'static str {
        match self {
            Self::ProfileImage => "profile-images",
            Self::ResourceFile => "resources",
        }
    }

    fn accepts(self, content_type: &str) -> bool {
        match self {
            Self::ProfileImage => PROFILE_IMAGE_TYPES.contains(&content_type),
            Self::ResourceFile => {
                RESOURCE_EXACT_TYPES.contains(&content_type)
                    || RESOURCE_TYPE_PREFIXES
                        .iter()
                        .any(|prefix| content_type.starts_with(prefix))
            }
        }
    }
}

/// Reasons an upload is refused before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaValidationError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("uploaded file exceeds the {max} byte limit")]
    TooLarge { max: usize },
    #[error("content type {content_type} is not allowed for this upload")]
    UnsupportedType { content_type: String },
}

/// A validated file ready to be sent to the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    kind: MediaKind,
    owner: UserId,
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl MediaUpload {
    /// Validate size and content type.
    pub fn new(
        kind: MediaKind,
        owner: UserId,
        file_name: impl Into<String>,
        content_type: &str,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, MediaValidationError> {
        if bytes.is_empty() {
            return Err(MediaValidationError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(MediaValidationError::TooLarge { max: max_bytes });
        }
        // Drop parameters such as `; charset=utf-8`.
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !kind.accepts(&essence) {
            return Err(MediaValidationError::UnsupportedType {
                content_type: content_type.to_owned(),
            });
        }
        let file_name = file_name.into();
        let file_name = if file_name.trim().is_empty() {
            "upload".to_owned()
        } else {
            file_name
        };
        Ok(Self {
            kind,
            owner,
            file_name,
            content_type: essence,
            bytes,
        })
    }

    /// Which allow-list the upload passed.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Uploading user.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Media host response for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub format: Option<String>,
    pub bytes: u64,
    pub resource_type: String,
}

impl From<MediaValidationError> for super::Error {
    fn from(err: MediaValidationError) -> Self {
        match err {
            MediaValidationError::TooLarge { .. } => Self::payload_too_large(err.to_string()),
            MediaValidationError::Empty => Self::invalid_field("file", "empty_file", err.to_string()),
            MediaValidationError::UnsupportedType { .. } => {
                Self::invalid_field("file", "unsupported_media_type", err.to_string())
            }
        }
    }
}
