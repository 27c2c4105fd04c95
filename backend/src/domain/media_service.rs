//! Uploads forwarded to the hosted media service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use super::profile_service::{map_user_error, require_user};
use crate::domain::ports::{IncomingFile, MediaService, MediaStore, MediaStoreError, UserRepository};
use crate::domain::{
    AuthenticatedUser, DEFAULT_MAX_UPLOAD_BYTES, Error, MediaKind, MediaUpload, Role,
    UploadedMedia,
};

fn map_store_error(error: MediaStoreError) -> Error {
    if matches!(error, MediaStoreError::Transport { .. }) {
        warn!(error = %error, "media host transport failure");
    }
    Error::from(error)
}

/// Media service implementing [`MediaService`].
#[derive(Clone)]
pub struct MediaServiceImpl<U> {
    store: Arc<dyn MediaStore>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    max_upload_bytes: usize,
}

impl<U> MediaServiceImpl<U> {
    /// Service with the default upload cap.
    pub fn new(store: Arc<dyn MediaStore>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            users,
            clock,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the upload ceiling.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    async fn forward(
        &self,
        kind: MediaKind,
        owner: &AuthenticatedUser,
        file: IncomingFile,
    ) -> Result<UploadedMedia, Error> {
        let IncomingFile {
            file_name,
            content_type,
            bytes,
        } = file;
        let upload = MediaUpload::new(
            kind,
            owner.id,
            file_name,
            &content_type,
            bytes,
            self.max_upload_bytes,
        )?;
        let media = self.store.upload(&upload).await.map_err(map_store_error)?;
        info!(
            owner = %owner.id,
            kind = ?kind,
            bytes = media.bytes,
            public_id = %media.public_id,
            "media uploaded"
        );
        Ok(media)
    }
}

#[async_trait]
impl<U> MediaService for MediaServiceImpl<U>
where
    U: UserRepository,
{
    fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    async fn upload_profile_image(
        &self,
        user: &AuthenticatedUser,
        file: IncomingFile,
    ) -> Result<UploadedMedia, Error> {
        let mut account = require_user(self.users.as_ref(), &user.id).await?;
        let media = self.forward(MediaKind::ProfileImage, user, file).await?;
        account.profile.profile_image_url = Some(media.url.clone());
        account.updated_at = self.clock.utc();
        self.users.update(&account).await.map_err(map_user_error)?;
        Ok(media)
    }

    async fn upload_resource_file(
        &self,
        teacher: &AuthenticatedUser,
        file: IncomingFile,
    ) -> Result<UploadedMedia, Error> {
        teacher.require_role(&[Role::Teacher])?;
        self.forward(MediaKind::ResourceFile, teacher, file).await
    }
}

#[cfg(test)]
mod tests {
    //! Upload validation and media host error mapping.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockMediaStore, MockUserRepository, UnconfiguredMediaStore};
    use crate::test_support::{actor, fixture_clock, sample_user};
    use rstest::rstest;

    fn png(len: usize) -> IncomingFile {
        IncomingFile {
            file_name: "avatar.png".to_owned(),
            content_type: "image/png".to_owned(),
            bytes: vec![7; len],
        }
    }

    fn uploaded() -> UploadedMedia {
        UploadedMedia {
            url: "https://res.cloudinary.com/demo/image/upload/avatar.png".to_owned(),
            public_id: "musiconthego/profile-images/avatar".to_owned(),
            format: Some("png".to_owned()),
            bytes: 16,
            resource_type: "image".to_owned(),
        }
    }

    #[tokio::test]
    async fn profile_image_upload_updates_profile() {
        let user = sample_user(Role::Student, "Sam Student");
        let who = actor(&user);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(user)));
        users
            .expect_update()
            .withf(|user| user.profile.profile_image_url.is_some())
            .times(1)
            .return_once(|_| Ok(()));
        let mut store = MockMediaStore::new();
        store
            .expect_upload()
            .withf(|upload| upload.kind() == MediaKind::ProfileImage)
            .return_once(|_| Ok(uploaded()));

        let media = MediaServiceImpl::new(Arc::new(store), Arc::new(users), fixture_clock())
            .upload_profile_image(&who, png(16))
            .await
            .expect("upload succeeds");

        assert_eq!(media.resource_type, "image");
    }

    #[tokio::test]
    async fn oversized_files_never_reach_the_host() {
        let user = sample_user(Role::Teacher, "Tess Teacher");
        let mut store = MockMediaStore::new();
        store.expect_upload().times(0);

        let err = MediaServiceImpl::new(Arc::new(store), Arc::new(MockUserRepository::new()), fixture_clock())
            .with_max_upload_bytes(8)
            .upload_resource_file(&actor(&user), png(9))
            .await
            .expect_err("too large");

        assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
    }

    #[tokio::test]
    async fn resource_files_are_teacher_only() {
        let user = sample_user(Role::Student, "Sam Student");

        let err = MediaServiceImpl::new(
            Arc::new(MockMediaStore::new()),
            Arc::new(MockUserRepository::new()),
            fixture_clock(),
        )
        .upload_resource_file(&actor(&user), png(4))
        .await
        .expect_err("students cannot upload resources");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn unconfigured_store_reports_service_unavailable() {
        let user = sample_user(Role::Teacher, "Tess Teacher");

        let err = MediaServiceImpl::new(
            Arc::new(UnconfiguredMediaStore),
            Arc::new(MockUserRepository::new()),
            fixture_clock(),
        )
        .upload_resource_file(&actor(&user), png(4))
        .await
        .expect_err("not configured");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert_eq!(err.message(), "media uploads are not configured");
    }

    #[rstest]
    #[case(MediaStoreError::rejected("Invalid image file"), ErrorCode::InvalidRequest)]
    #[case(MediaStoreError::transport("connection reset"), ErrorCode::ServiceUnavailable)]
    fn store_errors_map_to_http_codes(#[case] error: MediaStoreError, #[case] expected: ErrorCode) {
        assert_eq!(map_store_error(error).code(), expected);
    }
}
