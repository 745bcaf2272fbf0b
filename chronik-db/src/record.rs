//! Raw row shapes as they come out of Postgres, and their fallible
//! conversion into model types.

use chronik_common::model::{
    ModelValidationError,
    comment::{Comment, CommentText},
    group::{Group, Slug},
    post::{ImageRef, Post, PostText},
    session::{Session, SessionTokenHash},
    user::{User, Username},
};
use chronik_common::util::PositiveDuration;
use time::{Duration, OffsetDateTime};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, sqlx::FromRow)]
pub struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with its author and (optional) group.
#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub struct FullPostRecord {
    pub post_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub image: Option<String>,
    pub author_id: i64,
    pub username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub struct FullCommentRecord {
    pub comment_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub author_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub struct SessionRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            username: Username::new(value.username)?,
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_id.cast_unsigned().into(),
            title: value.title,
            slug: Slug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        let group = match value.group_id {
            Some(group_id) => Some(Group {
                id: group_id.cast_unsigned().into(),
                title: value.group_title.unwrap_or_default(),
                slug: Slug::new(value.group_slug.unwrap_or_default())?,
                description: value.group_description.unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            author: User {
                id: value.author_id.cast_unsigned().into(),
                username: Username::new(value.username)?,
            },
            group,
            text: PostText::new(value.text)?,
            created_at: value.created_at.to_utc(),
            image: value.image.map(ImageRef::new),
        })
    }
}

impl TryFrom<FullCommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: FullCommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            post: value.post_id.cast_unsigned().into(),
            author: User {
                id: value.author_id.cast_unsigned().into(),
                username: Username::new(value.username)?,
            },
            text: CommentText::new(value.text)?,
            created_at: value.created_at.to_utc(),
        })
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = ModelValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        let expires_after = value
            .expires_after_seconds
            .map(|seconds| PositiveDuration::try_from(Duration::seconds(seconds)))
            .transpose()?;

        Ok(Self {
            user: value.user_id.cast_unsigned().into(),
            token_hash: SessionTokenHash::try_from(value.token_hash.into_boxed_slice())?,
            created_at: value.created_at.to_utc(),
            expires_after,
        })
    }
}
