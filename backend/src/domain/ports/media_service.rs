//! Driving port for file uploads.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error, UploadedMedia};

/// File as read from the request, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Largest accepted upload in bytes.
    fn max_upload_bytes(&self) -> usize;

    /// Store a profile image and point the user's profile at it.
    async fn upload_profile_image(
        &self,
        user: &AuthenticatedUser,
        file: IncomingFile,
    ) -> Result<UploadedMedia, Error>;

    /// Store a teaching resource file.
    async fn upload_resource_file(
        &self,
        teacher: &AuthenticatedUser,
        file: IncomingFile,
    ) -> Result<UploadedMedia, Error>;
}
