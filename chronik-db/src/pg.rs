//! Postgres-backed store.
//!
//! Queries are bound at runtime so the crate builds without a live
//! database; the schema lives in `migrations/`.

use crate::record::{FullCommentRecord, FullPostRecord, GroupRecord, SessionRecord, UserRecord};
use crate::store::{DbError, PostQuery, Result, Store};
use async_trait::async_trait;
use chronik_common::model::{
    Id,
    comment::{Comment, CreateComment},
    group::{CreateGroup, Group, Slug},
    post::{CreatePost, Post, PostMarker, PostPatch},
    session::{Session, SessionTokenHash},
    user::{CreateUser, User, UserMarker, Username},
};
use sqlx::PgPool;
use time::OffsetDateTime;

const POST_SELECT: &str = "
    SELECT
        p.post_id, p.text, p.created_at, p.image,
        u.user_id AS author_id, u.username,
        g.group_id, g.title AS group_title,
        g.slug AS group_slug, g.description AS group_description
    FROM posts p
    JOIN users u ON u.user_id = p.author_id
    LEFT JOIN groups g ON g.group_id = p.group_id";

const POST_ORDER: &str = " ORDER BY p.created_at DESC, p.post_id DESC";

const COMMENT_SELECT: &str = "
    SELECT
        c.comment_id, c.post_id, c.text, c.created_at,
        u.user_id AS author_id, u.username
    FROM comments c
    JOIN users u ON u.user_id = c.author_id";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_created_post(&self, id: Id<PostMarker>) -> Result<Post> {
        self.fetch_post(id)
            .await?
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record: Option<UserRecord> =
            sqlx::query_as("SELECT user_id, username FROM users WHERE username = $1")
                .bind(username.get())
                .fetch_optional(&self.pool)
                .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let user_id: i64 =
            sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING user_id")
                .bind(user.username.get())
                .fetch_one(&self.pool)
                .await?;

        Ok(User {
            id: user_id.cast_unsigned().into(),
            username: user.username.clone(),
        })
    }

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>> {
        let record: Option<GroupRecord> = sqlx::query_as(
            "SELECT group_id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let group_id: i64 = sqlx::query_scalar(
            "INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3) RETURNING group_id",
        )
        .bind(&group.title)
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Group {
            id: group_id.cast_unsigned().into(),
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        })
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let mut sql = String::from(POST_SELECT);
        let mut binds: Vec<i64> = Vec::new();
        let mut conditions: Vec<String> = Vec::new();

        if let Some(follower) = query.followed_by {
            sql.push_str(" JOIN follows f ON f.author_id = p.author_id");
            binds.push(follower.get().cast_signed());
            conditions.push(format!("f.follower_id = ${}", binds.len()));
        }
        if let Some(author) = query.author {
            binds.push(author.get().cast_signed());
            conditions.push(format!("p.author_id = ${}", binds.len()));
        }
        if let Some(group) = query.group {
            binds.push(group.get().cast_signed());
            conditions.push(format!("p.group_id = ${}", binds.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(POST_ORDER);

        let mut db_query = sqlx::query_as::<_, FullPostRecord>(&sql);
        for bind in binds {
            db_query = db_query.bind(bind);
        }
        let records = db_query.fetch_all(&self.pool).await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, id: Id<PostMarker>) -> Result<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.post_id = $1");
        let record: Option<FullPostRecord> = sqlx::query_as(&sql)
            .bind(id.get().cast_signed())
            .fetch_optional(&self.pool)
            .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO posts (author_id, group_id, text, image)
            VALUES ($1, $2, $3, $4)
            RETURNING post_id
            ",
        )
        .bind(post.author.get().cast_signed())
        .bind(post.group.map(|group| group.get().cast_signed()))
        .bind(post.text.get())
        .bind(post.image.as_ref().map(|image| image.get().to_owned()))
        .fetch_one(&self.pool)
        .await?;

        self.fetch_created_post(post_id.cast_unsigned().into()).await
    }

    async fn update_post(&self, id: Id<PostMarker>, patch: &PostPatch) -> Result<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            "
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE post_id = $1
            RETURNING post_id
            ",
        )
        .bind(id.get().cast_signed())
        .bind(patch.text.get())
        .bind(patch.group.map(|group| group.get().cast_signed()))
        .bind(patch.image.as_ref().map(|image| image.get().to_owned()))
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(_) => Ok(Some(self.fetch_created_post(id).await?)),
            None => Ok(None),
        }
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Option<Comment>> {
        // The EXISTS guard keeps "post is gone" an Option, not a
        // foreign key violation.
        let comment_id: Option<i64> = sqlx::query_scalar(
            "
            INSERT INTO comments (post_id, author_id, text)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM posts WHERE post_id = $1)
            RETURNING comment_id
            ",
        )
        .bind(comment.post.get().cast_signed())
        .bind(comment.author.get().cast_signed())
        .bind(comment.text.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(comment_id) = comment_id else {
            return Ok(None);
        };

        let sql = format!("{COMMENT_SELECT} WHERE c.comment_id = $1");
        let record: FullCommentRecord = sqlx::query_as(&sql)
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(Comment::try_from(record)?))
    }

    async fn list_comments(&self, post: Id<PostMarker>) -> Result<Vec<Comment>> {
        let sql =
            format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at, c.comment_id");
        let records: Vec<FullCommentRecord> = sqlx::query_as(&sql)
            .bind(post.get().cast_signed())
            .fetch_all(&self.pool)
            .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        // The unique constraint makes concurrent inserts for the same
        // pair race down to exactly one edge.
        let inserted: Option<i64> = sqlx::query_scalar(
            "
            INSERT INTO follows (follower_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, author_id) DO NOTHING
            RETURNING follow_id
            ",
        )
        .bind(follower.get().cast_signed())
        .bind(author.get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND author_id = $2")
            .bind(follower.get().cast_signed())
            .bind(author.get().cast_signed())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn follow_exists(
        &self,
        follower: Id<UserMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND author_id = $2)",
        )
        .bind(follower.get().cast_signed())
        .bind(author.get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>> {
        let record: Option<SessionRecord> = sqlx::query_as(
            "
            SELECT user_id, token_hash, created_at, expires_after_seconds
            FROM sessions
            WHERE token_hash = $1
            ",
        )
        .bind(token_hash.0.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(Session::try_from).transpose()?;
        Ok(session)
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO sessions (token_hash, user_id, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(session.token_hash.0.to_vec())
        .bind(session.user.get().cast_signed())
        .bind(OffsetDateTime::from(session.created_at))
        .bind(
            session
                .expires_after
                .map(|duration| duration.get().whole_seconds()),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
