//! In-memory store used by tests and local development.
//!
//! Keeps the same contract as the Postgres store: ordering newest
//! first with id as tie-break, idempotent follow edges, `None` for
//! absent rows. All mutation happens under one mutex, which stands in
//! for the transactional check-then-insert of the relational store.

use crate::store::{DbError, PostQuery, Result, Store};
use async_trait::async_trait;
use chronik_common::model::{
    Id,
    comment::{Comment, CommentMarker, CommentText, CreateComment},
    group::{CreateGroup, Group, Slug},
    post::{CreatePost, ImageRef, Post, PostMarker, PostPatch, PostText},
    session::{Session, SessionTokenHash},
    user::{CreateUser, User, UserMarker, Username},
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::UtcDateTime;

#[derive(Clone, Eq, PartialEq, Debug)]
struct StoredPost {
    id: Id<PostMarker>,
    author: User,
    group: Option<Group>,
    text: PostText,
    created_at: UtcDateTime,
    image: Option<ImageRef>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct StoredComment {
    id: Id<CommentMarker>,
    post: Id<PostMarker>,
    author: User,
    text: CommentText,
    created_at: UtcDateTime,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<StoredPost>,
    comments: Vec<StoredComment>,
    follows: Vec<(Id<UserMarker>, Id<UserMarker>)>,
    sessions: Vec<Session>,
    // One sequence for all collections keeps every id strictly
    // increasing, which is all the ordering tie-break needs.
    next_id: u64,
}

impl Inner {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: Id<UserMarker>) -> Option<User> {
        self.users.iter().find(|user| user.id == id).cloned()
    }
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&StoredPost> for Post {
    fn from(value: &StoredPost) -> Self {
        Post {
            id: value.id,
            author: value.author.clone(),
            group: value.group.clone(),
            text: value.text.clone(),
            created_at: value.created_at,
            image: value.image.clone(),
        }
    }
}

impl From<&StoredComment> for Comment {
    fn from(value: &StoredComment) -> Self {
        Comment {
            id: value.id,
            post: value.post,
            author: value.author.clone(),
            text: value.text.clone(),
            created_at: value.created_at,
        }
    }
}

#[async_trait]
impl Store for MemStore {
    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let inner = self.lock();
        Ok(inner
            .users
            .iter()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut inner = self.lock();
        let id = inner.alloc();
        let user = User {
            id: id.into(),
            username: user.username.clone(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>> {
        let inner = self.lock();
        Ok(inner
            .groups
            .iter()
            .find(|group| &group.slug == slug)
            .cloned())
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let mut inner = self.lock();
        let id = inner.alloc();
        let group = Group {
            id: id.into(),
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        };
        inner.groups.push(group.clone());
        Ok(group)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let inner = self.lock();

        let mut posts: Vec<Post> = inner
            .posts
            .iter()
            .filter(|post| match query.author {
                Some(author) => post.author.id == author,
                None => true,
            })
            .filter(|post| match query.group {
                Some(group) => post.group.as_ref().is_some_and(|g| g.id == group),
                None => true,
            })
            .filter(|post| match query.followed_by {
                Some(follower) => inner.follows.contains(&(follower, post.author.id)),
                None => true,
            })
            .map(Post::from)
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn fetch_post(&self, id: Id<PostMarker>) -> Result<Option<Post>> {
        let inner = self.lock();
        Ok(inner
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(Post::from))
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut inner = self.lock();

        let author = inner
            .user(post.author)
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?;
        let group = match post.group {
            Some(group_id) => Some(
                inner
                    .groups
                    .iter()
                    .find(|group| group.id == group_id)
                    .cloned()
                    .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?,
            ),
            None => None,
        };

        let id = inner.alloc();
        let stored = StoredPost {
            id: id.into(),
            author,
            group,
            text: post.text.clone(),
            created_at: UtcDateTime::now(),
            image: post.image.clone(),
        };
        let created = Post::from(&stored);
        inner.posts.push(stored);
        Ok(created)
    }

    async fn update_post(&self, id: Id<PostMarker>, patch: &PostPatch) -> Result<Option<Post>> {
        let mut inner = self.lock();

        let group = match patch.group {
            Some(group_id) => Some(
                inner
                    .groups
                    .iter()
                    .find(|group| group.id == group_id)
                    .cloned()
                    .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?,
            ),
            None => None,
        };

        let Some(stored) = inner.posts.iter_mut().find(|post| post.id == id) else {
            return Ok(None);
        };
        stored.text = patch.text.clone();
        stored.group = group;
        stored.image = patch.image.clone();
        Ok(Some(Post::from(&*stored)))
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Option<Comment>> {
        let mut inner = self.lock();

        if !inner.posts.iter().any(|post| post.id == comment.post) {
            return Ok(None);
        }
        let author = inner
            .user(comment.author)
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?;

        let id = inner.alloc();
        let stored = StoredComment {
            id: id.into(),
            post: comment.post,
            author,
            text: comment.text.clone(),
            created_at: UtcDateTime::now(),
        };
        let created = Comment::from(&stored);
        inner.comments.push(stored);
        Ok(Some(created))
    }

    async fn list_comments(&self, post: Id<PostMarker>) -> Result<Vec<Comment>> {
        let inner = self.lock();
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|comment| comment.post == post)
            .map(Comment::from)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let mut inner = self.lock();
        if inner.follows.contains(&(follower, author)) {
            return Ok(false);
        }
        inner.follows.push((follower, author));
        Ok(true)
    }

    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.follows.len();
        inner.follows.retain(|edge| edge != &(follower, author));
        Ok(inner.follows.len() < before)
    }

    async fn follow_exists(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        Ok(self.lock().follows.contains(&(follower, author)))
    }

    async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .iter()
            .find(|session| &session.token_hash == token_hash)
            .cloned())
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        self.lock().sessions.push(session.clone());
        Ok(())
    }
}
