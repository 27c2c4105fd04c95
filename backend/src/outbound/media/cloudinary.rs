//! Reqwest-backed Cloudinary uploader.
//!
//! Uploads are signed: the signature is the SHA-1 hex digest of the sorted
//! signed parameters followed by the API secret.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use sha1::{Digest, Sha1};
use tracing::warn;
use zeroize::Zeroizing;

use super::dto::{ErrorResponseDto, UploadResponseDto};
use crate::domain::ports::{MediaStore, MediaStoreError};
use crate::domain::{MediaUpload, UploadedMedia};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1/";

/// Account credentials and the root folder uploads are filed under.
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub folder: String,
}

impl CloudinaryCredentials {
    /// Credentials when every part is present and non-blank.
    pub fn from_parts(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        folder: String,
    ) -> Option<Self> {
        let present = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        Some(Self {
            cloud_name: present(cloud_name)?,
            api_key: present(api_key)?,
            api_secret: Zeroizing::new(present(api_secret)?),
            folder,
        })
    }
}

/// [`MediaStore`] that posts signed multipart uploads to Cloudinary.
pub struct CloudinaryMediaStore {
    client: Client,
    base: String,
    credentials: CloudinaryCredentials,
    clock: Arc<dyn Clock>,
}

impl CloudinaryMediaStore {
    /// Build a store against the public Cloudinary API.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        credentials: CloudinaryCredentials,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: DEFAULT_API_BASE.to_owned(),
            credentials,
            clock,
        })
    }

    /// Point the store at another API root, e.g. a local stub server.
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base = base;
        self
    }

    fn upload_url(&self, resource_type: &str) -> Result<Url, MediaStoreError> {
        let raw = format!(
            "{}{}/{resource_type}/upload",
            self.base, self.credentials.cloud_name
        );
        Url::parse(&raw)
            .map_err(|error| MediaStoreError::transport(format!("invalid upload url: {error}")))
    }
}

fn sign(folder: &str, timestamp: i64, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("folder={folder}&timestamp={timestamp}{secret}"));
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, upload: &MediaUpload) -> Result<UploadedMedia, MediaStoreError> {
        let kind = upload.kind();
        let url = self.upload_url(kind.resource_type())?;
        let folder = format!("{}/{}", self.credentials.folder, kind.folder());
        let timestamp = self.clock.utc().timestamp();
        let signature = sign(&folder, timestamp, &self.credentials.api_secret);

        let file = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_owned())
            .mime_str(upload.content_type())
            .map_err(map_transport_error)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder)
            .text("signature", signature);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            warn!(status = status.as_u16(), error = %error, "media host rejected upload");
            return Err(error);
        }
        let decoded: UploadResponseDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            MediaStoreError::transport(format!("invalid media host response: {error}"))
        })?;
        Ok(decoded.into())
    }
}

fn map_transport_error(error: reqwest::Error) -> MediaStoreError {
    MediaStoreError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MediaStoreError {
    let message = serde_json::from_slice::<ErrorResponseDto>(body)
        .map(|dto| dto.error.message)
        .unwrap_or_else(|_| format!("status {}", status.as_u16()));
    MediaStoreError::rejected(message)
}

#[cfg(test)]
mod tests {
    //! Signing and response mapping without network access.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn signature_covers_sorted_params_and_secret() {
        assert_eq!(
            sign("musiconthego/resources", 1_700_000_000, "s3cret"),
            "8e9046c482975353b144a862a8666fe71edce91e"
        );
    }

    #[rstest]
    #[case(None, Some("key"), Some("secret"))]
    #[case(Some("cloud"), Some("  "), Some("secret"))]
    #[case(Some("cloud"), Some("key"), None)]
    fn incomplete_credentials_are_absent(
        #[case] cloud: Option<&str>,
        #[case] key: Option<&str>,
        #[case] secret: Option<&str>,
    ) {
        let credentials = CloudinaryCredentials::from_parts(
            cloud.map(str::to_owned),
            key.map(str::to_owned),
            secret.map(str::to_owned),
            "musiconthego".to_owned(),
        );
        assert!(credentials.is_none());
    }

    #[rstest]
    fn host_error_message_is_surfaced() {
        let error = map_status_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":{"message":"Invalid image file"}}"#,
        );
        assert_eq!(error, MediaStoreError::rejected("Invalid image file"));
    }

    #[rstest]
    fn opaque_error_bodies_fall_back_to_status() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(error, MediaStoreError::rejected("status 502"));
    }

    #[rstest]
    fn upload_url_nests_cloud_and_resource_type() {
        let store = CloudinaryMediaStore::new(
            CloudinaryCredentials {
                cloud_name: "demo".to_owned(),
                api_key: "key".to_owned(),
                api_secret: Zeroizing::new("secret".to_owned()),
                folder: "musiconthego".to_owned(),
            },
            Duration::from_secs(5),
            Arc::new(mockable::DefaultClock),
        )
        .expect("client builds");
        assert_eq!(
            store.upload_url("auto").expect("url joins").as_str(),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }
}
