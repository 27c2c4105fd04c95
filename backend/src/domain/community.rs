//! Community feed: posts, likes, comments, and visibility rules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::validate_http_url;
use super::{AuthenticatedUser, Role, UserId};

pub const POST_TITLE_MAX: usize = 200;
pub const POST_DESCRIPTION_MAX: usize = 2000;
pub const COMMENT_MAX: usize = 1000;

/// Validation failures for posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommunityValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("mediaUrl is required for {media_type} posts")]
    MissingMedia { media_type: MediaType },
    #[error("mediaUrl must be an http or https URL")]
    InvalidMediaUrl,
    #[error("mediaType must be one of text, image, audio, or video")]
    InvalidMediaType,
    #[error("visibility must be one of public, students, or teachers")]
    InvalidVisibility,
}

impl CommunityValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
            Self::MissingMedia { .. } | Self::InvalidMediaUrl => "mediaUrl",
            Self::InvalidMediaType => "mediaType",
            Self::InvalidVisibility => "visibility",
        }
    }
}

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Audio,
    Video,
}

impl MediaType {
    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CommunityValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(CommunityValidationError::InvalidMediaType),
        }
    }
}

/// Audience a post is shown to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Students,
    Teachers,
}

impl Visibility {
    /// Wire and column form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Students => "students",
            Self::Teachers => "teachers",
        }
    }

    /// Audiences a viewer with `role` may read, excluding their own posts.
    pub fn readable_by(role: Role) -> Vec<Self> {
        match role {
            Role::Admin => vec![Self::Public, Self::Students, Self::Teachers],
            Role::Student => vec![Self::Public, Self::Students],
            Role::Teacher => vec![Self::Public, Self::Teachers],
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CommunityValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "students" => Ok(Self::Students),
            "teachers" => Ok(Self::Teachers),
            _ => Err(CommunityValidationError::InvalidVisibility),
        }
    }
}

fn required(value: &str, field: &'static str, max: usize) -> Result<String, CommunityValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommunityValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(CommunityValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Feed entry with viewer-specific like state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: Uuid,
    pub author_id: UserId,
    pub author_name: String,
    pub author_role: Role,
    pub title: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub instrument: Option<String>,
    pub visibility: Visibility,
    pub like_count: u64,
    pub comment_count: u64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

impl CommunityPost {
    /// True when `viewer` may read this post.
    pub fn is_visible_to(&self, viewer: &AuthenticatedUser) -> bool {
        self.author_id == viewer.id || Visibility::readable_by(viewer.role).contains(&self.visibility)
    }

    /// Authors and admins may delete a post.
    pub fn is_removable_by(&self, actor: &AuthenticatedUser) -> bool {
        actor.is_admin() || self.author_id == actor.id
    }
}

/// Raw post fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub instrument: Option<String>,
    pub visibility: Option<String>,
}

impl CommunityPost {
    /// Validate a draft into a new post authored by `author`.
    pub fn new(
        author: &AuthenticatedUser,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, CommunityValidationError> {
        let media_type = draft
            .media_type
            .as_deref()
            .map(str::parse::<MediaType>)
            .transpose()?
            .unwrap_or(MediaType::Text);
        let media_url = draft
            .media_url
            .filter(|url| !url.trim().is_empty())
            .map(|url| validate_http_url(&url).map_err(|_| CommunityValidationError::InvalidMediaUrl))
            .transpose()?;
        if media_type != MediaType::Text && media_url.is_none() {
            return Err(CommunityValidationError::MissingMedia { media_type });
        }
        let visibility = draft
            .visibility
            .as_deref()
            .map(str::parse::<Visibility>)
            .transpose()?
            .unwrap_or(Visibility::Public);
        Ok(Self {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            title: required(&draft.title, "title", POST_TITLE_MAX)?,
            description: draft
                .description
                .filter(|text| !text.trim().is_empty())
                .map(|text| required(&text, "description", POST_DESCRIPTION_MAX))
                .transpose()?,
            media_url,
            media_type,
            instrument: draft
                .instrument
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            visibility,
            like_count: 0,
            comment_count: 0,
            liked_by_me: false,
            created_at: now,
        })
    }
}

/// Comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        post_id: Uuid,
        author: &AuthenticatedUser,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, CommunityValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            post_id,
            author_id: author.id,
            author_name: author.name.clone(),
            text: required(text, "text", COMMENT_MAX)?,
            created_at: now,
        })
    }
}

/// Post together with its comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: CommunityPost,
    pub comments: Vec<Comment>,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

/// Filter for browsing the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub instrument: Option<String>,
    pub author_id: Option<UserId>,
    pub media_type: Option<MediaType>,
}

/// Feed query scoped to what one viewer may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub viewer: UserId,
    pub audiences: Vec<Visibility>,
    pub filter: PostFilter,
}

impl PostQuery {
    /// Scope `filter` to the audiences `viewer` may read.
    pub fn for_viewer(viewer: &AuthenticatedUser, filter: PostFilter) -> Self {
        Self {
            viewer: viewer.id,
            audiences: Visibility::readable_by(viewer.role),
            filter,
        }
    }
}

impl From<CommunityValidationError> for super::Error {
    fn from(err: CommunityValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Visibility and post validation rules.
    use super::*;
    use rstest::rstest;

    fn viewer(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::random(),
            role,
            name: "Viewer".to_owned(),
        }
    }

    fn post_with(visibility: Visibility, author: &AuthenticatedUser) -> CommunityPost {
        CommunityPost::new(
            author,
            PostDraft {
                title: "Recital".to_owned(),
                visibility: Some(visibility.as_str().to_owned()),
                ..PostDraft::default()
            },
            Utc::now(),
        )
        .expect("valid post")
    }

    #[rstest]
    #[case(Visibility::Public, Role::Student, true)]
    #[case(Visibility::Public, Role::Teacher, true)]
    #[case(Visibility::Students, Role::Student, true)]
    #[case(Visibility::Students, Role::Teacher, false)]
    #[case(Visibility::Teachers, Role::Student, false)]
    #[case(Visibility::Teachers, Role::Teacher, true)]
    #[case(Visibility::Teachers, Role::Admin, true)]
    fn visibility_matrix(#[case] visibility: Visibility, #[case] role: Role, #[case] visible: bool) {
        let author = viewer(Role::Teacher);
        let post = post_with(visibility, &author);
        assert_eq!(post.is_visible_to(&viewer(role)), visible);
    }

    #[rstest]
    fn authors_always_see_their_posts() {
        let author = viewer(Role::Student);
        let post = post_with(Visibility::Teachers, &author);
        assert!(post.is_visible_to(&author));
        assert!(post.is_removable_by(&author));
        assert!(!post.is_removable_by(&viewer(Role::Teacher)));
        assert!(post.is_removable_by(&viewer(Role::Admin)));
    }

    #[rstest]
    fn media_posts_require_url() {
        let author = viewer(Role::Student);
        let err = CommunityPost::new(
            &author,
            PostDraft {
                title: "Listen".to_owned(),
                media_type: Some("audio".to_owned()),
                ..PostDraft::default()
            },
            Utc::now(),
        )
        .expect_err("missing media");
        assert_eq!(
            err,
            CommunityValidationError::MissingMedia {
                media_type: MediaType::Audio
            }
        );
    }

    #[rstest]
    fn comments_are_trimmed_and_bounded() {
        let author = viewer(Role::Student);
        let comment =
            Comment::new(Uuid::new_v4(), &author, "  Bravo! ", Utc::now()).expect("valid");
        assert_eq!(comment.text, "Bravo!");
        let err = Comment::new(Uuid::new_v4(), &author, &"x".repeat(COMMENT_MAX + 1), Utc::now())
            .expect_err("too long");
        assert_eq!(err.field(), "text");
    }
}
