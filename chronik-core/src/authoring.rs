//! Post and comment authoring.

use crate::error::{CoreError, Result};
use chronik_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CommentText, CreateComment},
    group::{GroupMarker, Slug},
    post::{CreatePost, ImageRef, Post, PostMarker, PostPatch, PostText},
    user::UserMarker,
};
use chronik_db::store::Store;
use std::sync::Arc;
use tracing::warn;

/// What a post form submits: raw text, an optional group slug and an
/// optional already-uploaded image reference.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostInput {
    pub text: String,
    pub group: Option<Slug>,
    pub image: Option<ImageRef>,
}

/// Result of an edit attempt. `applied` is false when the editor was
/// not the author; the post then comes back unchanged. That refusal is
/// an authorization boundary, not an error.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct EditOutcome {
    pub post: Post,
    pub applied: bool,
}

pub struct Authoring {
    store: Arc<dyn Store>,
}

impl Authoring {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn resolve_group(&self, slug: Option<&Slug>) -> Result<Option<Id<GroupMarker>>> {
        match slug {
            Some(slug) => {
                let group = self
                    .store
                    .fetch_group_by_slug(slug)
                    .await?
                    .ok_or_else(|| CoreError::GroupNotFound(slug.clone()))?;
                Ok(Some(group.id))
            }
            None => Ok(None),
        }
    }

    pub async fn create_post(&self, author: Id<UserMarker>, input: PostInput) -> Result<Post> {
        let text = PostText::new(input.text).map_err(ModelValidationError::from)?;
        let group = self.resolve_group(input.group.as_ref()).await?;

        let post = self
            .store
            .create_post(&CreatePost {
                author,
                group,
                text,
                image: input.image,
            })
            .await?;
        Ok(post)
    }

    pub async fn edit_post(
        &self,
        editor: Id<UserMarker>,
        post_id: Id<PostMarker>,
        input: PostInput,
    ) -> Result<EditOutcome> {
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .ok_or(CoreError::PostNotFound(post_id))?;

        if post.author.id != editor {
            warn!(%editor, %post_id, "Refusing edit by non-author");
            return Ok(EditOutcome {
                post,
                applied: false,
            });
        }

        let text = PostText::new(input.text).map_err(ModelValidationError::from)?;
        let group = self.resolve_group(input.group.as_ref()).await?;

        let updated = self
            .store
            .update_post(
                post_id,
                &PostPatch {
                    group,
                    text,
                    image: input.image,
                },
            )
            .await?
            .ok_or(CoreError::PostNotFound(post_id))?;

        Ok(EditOutcome {
            post: updated,
            applied: true,
        })
    }

    pub async fn add_comment(
        &self,
        author: Id<UserMarker>,
        post_id: Id<PostMarker>,
        text: String,
    ) -> Result<Comment> {
        let text = CommentText::new(text).map_err(ModelValidationError::from)?;

        let comment = self
            .store
            .create_comment(&CreateComment {
                post: post_id,
                author,
                text,
            })
            .await?
            .ok_or(CoreError::PostNotFound(post_id))?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::{Authoring, PostInput};
    use crate::{
        error::CoreError,
        testutil::{create_group, create_post, create_user, slug},
    };
    use chronik_db::{memory::MemStore, store::PostQuery, store::Store};
    use std::sync::Arc;

    fn input(text: &str) -> PostInput {
        PostInput {
            text: text.to_owned(),
            group: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_post_adds_exactly_one_post_by_the_caller() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        create_group(&store, "slug").await;
        let authoring = Authoring::new(store.clone());

        let before = store.list_posts(&PostQuery::all()).await.unwrap().len();
        let post = authoring
            .create_post(
                author.id,
                PostInput {
                    text: "Текст нового поста".to_owned(),
                    group: Some(slug("slug")),
                    image: None,
                },
            )
            .await
            .unwrap();
        let after = store.list_posts(&PostQuery::all()).await.unwrap().len();

        assert_eq!(after, before + 1);
        assert_eq!(post.author.id, author.id);
        assert_eq!(post.text.get(), "Текст нового поста");
        assert_eq!(post.group.unwrap().slug, slug("slug"));
    }

    #[tokio::test]
    async fn empty_post_text_is_a_validation_error() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let authoring = Authoring::new(store.clone());

        let err = authoring
            .create_post(author.id, input("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.list_posts(&PostQuery::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_group_slug_fails_post_creation() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let authoring = Authoring::new(store.clone());

        let err = authoring
            .create_post(
                author.id,
                PostInput {
                    text: "text".to_owned(),
                    group: Some(slug("missing")),
                    image: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn edit_by_the_author_stores_the_submitted_text() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let post = create_post(&store, &author, "original", None).await;
        let authoring = Authoring::new(store.clone());

        let outcome = authoring
            .edit_post(author.id, post.id, input("rewritten"))
            .await
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.post.text.get(), "rewritten");
        assert_eq!(outcome.post.author.id, author.id);

        let stored = store.fetch_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.text.get(), "rewritten");
    }

    #[tokio::test]
    async fn edit_by_a_non_author_changes_nothing() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let intruder = create_user(&store, "intruder").await;
        let post = create_post(&store, &author, "original", None).await;
        let authoring = Authoring::new(store.clone());

        let outcome = authoring
            .edit_post(intruder.id, post.id, input("hijacked"))
            .await
            .unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.post.text.get(), "original");

        let stored = store.fetch_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.text.get(), "original");
    }

    #[tokio::test]
    async fn edit_of_a_missing_post_is_not_found() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let authoring = Authoring::new(store.clone());

        let err = authoring
            .edit_post(author.id, 999.into(), input("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn comments_attach_to_their_post() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let reader = create_user(&store, "reader").await;
        let post = create_post(&store, &author, "a post", None).await;
        let authoring = Authoring::new(store.clone());

        let comment = authoring
            .add_comment(reader.id, post.id, "nice one".to_owned())
            .await
            .unwrap();
        assert_eq!(comment.post, post.id);
        assert_eq!(comment.author.id, reader.id);

        let err = authoring
            .add_comment(reader.id, 999.into(), "into the void".to_owned())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PostNotFound(_)));

        let err = authoring
            .add_comment(reader.id, post.id, "  ".to_owned())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
