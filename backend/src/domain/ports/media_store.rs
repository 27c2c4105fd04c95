//! Port for the hosted media service.

use async_trait::async_trait;

use crate::domain::{MediaUpload, UploadedMedia};

use super::define_port_error;

define_port_error! {
    /// Errors raised by media store adapters.
    pub enum MediaStoreError {
        /// Credentials for the media host are absent.
        NotConfigured => ServiceUnavailable, "media uploads are not configured",
        /// The host refused the file.
        Rejected { message: String } => InvalidRequest,
            "media host rejected the upload: {message}",
        /// The host could not be reached or answered unintelligibly.
        Transport { message: String } => ServiceUnavailable, "media host unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the file and return its public location.
    async fn upload(&self, upload: &MediaUpload) -> Result<UploadedMedia, MediaStoreError>;
}

/// Media store used when no host credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredMediaStore;

#[async_trait]
impl MediaStore for UnconfiguredMediaStore {
    async fn upload(&self, _upload: &MediaUpload) -> Result<UploadedMedia, MediaStoreError> {
        Err(MediaStoreError::not_configured())
    }
}
