use async_trait::async_trait;
use chronik_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CreateComment},
    group::{CreateGroup, Group, GroupMarker, Slug},
    post::{CreatePost, Post, PostMarker, PostPatch},
    session::{Session, SessionTokenHash},
    user::{CreateUser, User, UserMarker, Username},
};

use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Predicate over the post collection. Every query returns posts
/// ordered newest first (created_at descending, id descending as
/// tie-break), so callers can slice pages deterministically.
///
/// `followed_by` is the subscription join: posts whose author has a
/// follow edge from the given user.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostQuery {
    pub author: Option<Id<UserMarker>>,
    pub group: Option<Id<GroupMarker>>,
    pub followed_by: Option<Id<UserMarker>>,
}

impl PostQuery {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by_author(author: Id<UserMarker>) -> Self {
        Self {
            author: Some(author),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_group(group: Id<GroupMarker>) -> Self {
        Self {
            group: Some(group),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn followed_by(follower: Id<UserMarker>) -> Self {
        Self {
            followed_by: Some(follower),
            ..Self::default()
        }
    }
}

/// The persistent-store collaborator: relational collections for
/// users, groups, posts, comments, follows and sessions.
///
/// Absence is `Option`, never an error; the caller decides whether a
/// missing row is Not-Found. `insert_follow` is atomic with respect to
/// the follow uniqueness invariant, so concurrent calls for the same
/// pair cannot produce duplicate edges.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>>;
    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>>;
    async fn create_group(&self, group: &CreateGroup) -> Result<Group>;

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;
    async fn fetch_post(&self, id: Id<PostMarker>) -> Result<Option<Post>>;
    async fn create_post(&self, post: &CreatePost) -> Result<Post>;
    /// Replaces text, group and image. The author can never change.
    /// `None` if the post does not exist.
    async fn update_post(&self, id: Id<PostMarker>, patch: &PostPatch) -> Result<Option<Post>>;

    /// `None` if the referenced post does not exist.
    async fn create_comment(&self, comment: &CreateComment) -> Result<Option<Comment>>;
    /// Comments under a post, oldest first.
    async fn list_comments(&self, post: Id<PostMarker>) -> Result<Vec<Comment>>;

    /// Idempotent. Returns whether a new edge was inserted.
    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool>;
    /// Idempotent. Returns whether an edge was removed.
    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool>;
    async fn follow_exists(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool>;

    async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>>;
    async fn create_session(&self, session: &Session) -> Result<()>;
}
