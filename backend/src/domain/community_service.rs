//! Community feed: posts, likes, and comments.
//!
//! Posts the viewer may not read are reported as missing rather than
//! forbidden so their existence does not leak.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{CommunityRepository, CommunityService};
use crate::domain::{
    AuthenticatedUser, Comment, CommunityPost, Error, LikeState, PostDraft, PostFilter, PostQuery,
    PostWithComments,
};

/// Community service implementing [`CommunityService`].
#[derive(Clone)]
pub struct CommunityServiceImpl<R> {
    posts: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> CommunityServiceImpl<R> {
    /// Wire the service to its repository and clock.
    pub fn new(posts: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }
}

impl<R> CommunityServiceImpl<R>
where
    R: CommunityRepository,
{
    async fn visible_post(
        &self,
        viewer: &AuthenticatedUser,
        post_id: &Uuid,
    ) -> Result<CommunityPost, Error> {
        self.posts
            .find_post(post_id, &viewer.id)
            .await
            .map_err(Error::from)?
            .filter(|post| post.is_visible_to(viewer))
            .ok_or_else(|| Error::not_found(format!("post {post_id} not found")))
    }
}

#[async_trait]
impl<R> CommunityService for CommunityServiceImpl<R>
where
    R: CommunityRepository,
{
    async fn list(
        &self,
        viewer: &AuthenticatedUser,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<CommunityPost>, Error> {
        let query = PostQuery::for_viewer(viewer, filter);
        let (posts, total) = self
            .posts
            .list_posts(&query, &page)
            .await
            .map_err(Error::from)?;
        Ok(Paginated::new(posts, page, total))
    }

    async fn get(
        &self,
        viewer: &AuthenticatedUser,
        post_id: &Uuid,
    ) -> Result<PostWithComments, Error> {
        let post = self.visible_post(viewer, post_id).await?;
        let comments = self
            .posts
            .list_comments(post_id)
            .await
            .map_err(Error::from)?;
        Ok(PostWithComments { post, comments })
    }

    async fn create(
        &self,
        author: &AuthenticatedUser,
        draft: PostDraft,
    ) -> Result<CommunityPost, Error> {
        let post = CommunityPost::new(author, draft, self.clock.utc())?;
        self.posts
            .insert_post(&post)
            .await
            .map_err(Error::from)?;
        info!(post_id = %post.id, author_id = %author.id, visibility = %post.visibility, "post created");
        Ok(post)
    }

    async fn delete(&self, actor: &AuthenticatedUser, post_id: &Uuid) -> Result<(), Error> {
        let post = self.visible_post(actor, post_id).await?;
        if !post.is_removable_by(actor) {
            return Err(Error::forbidden("only the author or an admin may delete this post"));
        }
        self.posts
            .delete_post(post_id)
            .await
            .map_err(Error::from)?;
        info!(post_id = %post_id, actor = %actor.id, "post deleted");
        Ok(())
    }

    async fn toggle_like(
        &self,
        viewer: &AuthenticatedUser,
        post_id: &Uuid,
    ) -> Result<LikeState, Error> {
        self.visible_post(viewer, post_id).await?;
        self.posts
            .toggle_like(post_id, &viewer.id)
            .await
            .map_err(Error::from)
    }

    async fn add_comment(
        &self,
        author: &AuthenticatedUser,
        post_id: &Uuid,
        text: String,
    ) -> Result<Comment, Error> {
        self.visible_post(author, post_id).await?;
        let comment = Comment::new(*post_id, author, &text, self.clock.utc())?;
        self.posts
            .insert_comment(&comment)
            .await
            .map_err(Error::from)?;
        Ok(comment)
    }

    async fn delete_comment(
        &self,
        actor: &AuthenticatedUser,
        post_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<(), Error> {
        let post = self.visible_post(actor, post_id).await?;
        let comment = self
            .posts
            .find_comment(comment_id)
            .await
            .map_err(Error::from)?
            .filter(|comment| comment.post_id == *post_id)
            .ok_or_else(|| Error::not_found(format!("comment {comment_id} not found")))?;
        let allowed = actor.is_admin() || comment.author_id == actor.id || post.author_id == actor.id;
        if !allowed {
            return Err(Error::forbidden(
                "only the comment author, post author, or an admin may delete this comment",
            ));
        }
        self.posts
            .delete_comment(comment_id)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Feed visibility and moderation rules.
    use super::*;
    use crate::domain::ports::MockCommunityRepository;
    use crate::domain::{ErrorCode, Role, User, Visibility};
    use crate::test_support::{actor, fixture_clock, fixture_now, sample_user};
    use rstest::rstest;

    fn post_by(author: &User, visibility: Visibility) -> CommunityPost {
        CommunityPost::new(
            &actor(author),
            PostDraft {
                title: "Practice tips".to_owned(),
                visibility: Some(visibility.to_string()),
                ..PostDraft::default()
            },
            fixture_now(),
        )
        .expect("valid post")
    }

    fn service(repo: MockCommunityRepository) -> CommunityServiceImpl<MockCommunityRepository> {
        CommunityServiceImpl::new(Arc::new(repo), fixture_clock())
    }

    #[rstest]
    #[case(Role::Student, Visibility::Teachers, false)]
    #[case(Role::Teacher, Visibility::Teachers, true)]
    #[case(Role::Teacher, Visibility::Students, false)]
    #[case(Role::Admin, Visibility::Students, true)]
    #[case(Role::Student, Visibility::Public, true)]
    #[tokio::test]
    async fn get_respects_visibility(
        #[case] viewer_role: Role,
        #[case] visibility: Visibility,
        #[case] visible: bool,
    ) {
        let author = sample_user(Role::Teacher, "Tess Teacher");
        let viewer = sample_user(viewer_role, "Vera Viewer");
        let post = post_by(&author, visibility);
        let id = post.id;
        let mut repo = MockCommunityRepository::new();
        repo.expect_find_post()
            .return_once(move |_, _| Ok(Some(post)));
        repo.expect_list_comments().returning(|_| Ok(Vec::new()));

        let result = service(repo).get(&actor(&viewer), &id).await;

        match result {
            Ok(found) => {
                assert!(visible);
                assert_eq!(found.post.id, id);
            }
            Err(err) => {
                assert!(!visible);
                assert_eq!(err.code(), ErrorCode::NotFound);
            }
        }
    }

    #[tokio::test]
    async fn list_scopes_query_to_viewer_audiences() {
        let viewer = sample_user(Role::Student, "Sam Student");
        let viewer_id = viewer.id;
        let mut repo = MockCommunityRepository::new();
        repo.expect_list_posts()
            .withf(move |query, _| {
                query.viewer == viewer_id
                    && query.audiences == vec![Visibility::Public, Visibility::Students]
            })
            .return_once(|_, _| Ok((Vec::new(), 0)));

        let page = service(repo)
            .list(&actor(&viewer), PostFilter::default(), PageRequest::default())
            .await
            .expect("list succeeds");

        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn post_authors_may_remove_comments() {
        let author = sample_user(Role::Teacher, "Tess Teacher");
        let commenter = sample_user(Role::Student, "Sam Student");
        let post = post_by(&author, Visibility::Public);
        let post_id = post.id;
        let comment = Comment::new(post_id, &actor(&commenter), "Thanks!", fixture_now())
            .expect("valid comment");
        let comment_id = comment.id;
        let mut repo = MockCommunityRepository::new();
        repo.expect_find_post()
            .return_once(move |_, _| Ok(Some(post)));
        repo.expect_find_comment()
            .return_once(move |_| Ok(Some(comment)));
        repo.expect_delete_comment()
            .times(1)
            .return_once(|_| Ok(true));

        service(repo)
            .delete_comment(&actor(&author), &post_id, &comment_id)
            .await
            .expect("post author may delete");
    }

    #[tokio::test]
    async fn strangers_cannot_delete_posts() {
        let author = sample_user(Role::Teacher, "Tess Teacher");
        let stranger = sample_user(Role::Teacher, "Other Teacher");
        let post = post_by(&author, Visibility::Public);
        let id = post.id;
        let mut repo = MockCommunityRepository::new();
        repo.expect_find_post()
            .return_once(move |_, _| Ok(Some(post)));
        repo.expect_delete_post().times(0);

        let err = service(repo)
            .delete(&actor(&stranger), &id)
            .await
            .expect_err("stranger");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
