//! Cloudinary upload response bodies.

use serde::Deserialize;

use crate::domain::UploadedMedia;

#[derive(Debug, Deserialize)]
pub(super) struct UploadResponseDto {
    pub(super) secure_url: String,
    pub(super) public_id: String,
    #[serde(default)]
    pub(super) format: Option<String>,
    #[serde(default)]
    pub(super) bytes: u64,
    pub(super) resource_type: String,
}

impl From<UploadResponseDto> for UploadedMedia {
    fn from(dto: UploadResponseDto) -> Self {
        Self {
            url: dto.secure_url,
            public_id: dto.public_id,
            format: dto.format,
            bytes: dto.bytes,
            resource_type: dto.resource_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponseDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    pub(super) message: String,
}
