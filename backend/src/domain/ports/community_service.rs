//! Driving port for the community feed.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::{
    AuthenticatedUser, Comment, CommunityPost, Error, LikeState, PostDraft, PostFilter,
    PostWithComments,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityService: Send + Sync {
    async fn list(
        &self,
        viewer: &AuthenticatedUser,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<CommunityPost>, Error>;

    async fn get(&self, viewer: &AuthenticatedUser, post_id: &Uuid)
    -> Result<PostWithComments, Error>;

    async fn create(&self, author: &AuthenticatedUser, draft: PostDraft)
    -> Result<CommunityPost, Error>;

    async fn delete(&self, actor: &AuthenticatedUser, post_id: &Uuid) -> Result<(), Error>;

    async fn toggle_like(&self, viewer: &AuthenticatedUser, post_id: &Uuid)
    -> Result<LikeState, Error>;

    async fn add_comment(
        &self,
        author: &AuthenticatedUser,
        post_id: &Uuid,
        text: String,
    ) -> Result<Comment, Error>;

    async fn delete_comment(
        &self,
        actor: &AuthenticatedUser,
        post_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<(), Error>;
}
