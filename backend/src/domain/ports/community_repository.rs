//! Port for community posts, likes, and comments.

use async_trait::async_trait;
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::{Comment, CommunityPost, LikeState, PostQuery, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by community repository adapters.
    pub enum CommunityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "community repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "community repository query failed: {message}",
    }
}

/// Port for the community feed.
///
/// Returned posts carry counts and the `liked_by_me` flag for `viewer`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    async fn insert_post(&self, post: &CommunityPost) -> Result<(), CommunityRepositoryError>;

    /// Posts in `query.audiences` plus the viewer's own, newest first.
    async fn list_posts(
        &self,
        query: &PostQuery,
        page: &PageRequest,
    ) -> Result<(Vec<CommunityPost>, u64), CommunityRepositoryError>;

    async fn find_post(
        &self,
        id: &Uuid,
        viewer: &UserId,
    ) -> Result<Option<CommunityPost>, CommunityRepositoryError>;

    async fn delete_post(&self, id: &Uuid) -> Result<bool, CommunityRepositoryError>;

    /// Flip the viewer's like atomically and report the new state.
    async fn toggle_like(
        &self,
        post_id: &Uuid,
        user_id: &UserId,
    ) -> Result<LikeState, CommunityRepositoryError>;

    async fn insert_comment(&self, comment: &Comment) -> Result<(), CommunityRepositoryError>;

    /// Comments oldest first.
    async fn list_comments(&self, post_id: &Uuid) -> Result<Vec<Comment>, CommunityRepositoryError>;

    async fn find_comment(&self, id: &Uuid) -> Result<Option<Comment>, CommunityRepositoryError>;

    async fn delete_comment(&self, id: &Uuid) -> Result<bool, CommunityRepositoryError>;
}
