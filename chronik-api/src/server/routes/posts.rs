use crate::server::{Result, ServerError, ServerRouter, auth::SessionUser, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use chronik_common::model::{
    Id,
    comment::Comment,
    group::Slug,
    post::{ImageRef, Post, PostMarker},
};
use chronik_core::{
    authoring::{Authoring, PostInput},
    feed::{FeedAssembler, PostDetail},
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_post)
        .typed_post(create_post)
        .typed_put(edit_post)
        .typed_post(create_comment)
}

/// Submitted post form: raw text, an optional group slug and an
/// optional reference from a prior image upload.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct PostForm {
    text: String,
    #[serde(default)]
    group: Option<Slug>,
    #[serde(default)]
    image: Option<ImageRef>,
}

impl From<PostForm> for PostInput {
    fn from(form: PostForm) -> Self {
        Self {
            text: form.text,
            group: form.group,
            image: form.image,
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct GetPostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    GetPostPath { id }: GetPostPath,
    State(feeds): State<Arc<FeedAssembler>>,
) -> Result<Json<PostDetail>> {
    let detail = feeds.post_detail(id).await?;

    Ok(Json(detail))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(authoring): State<Arc<Authoring>>,
    user: SessionUser,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = authoring.create_post(user.user_id(), form.into()).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct EditPostPath {
    id: Id<PostMarker>,
}

/// Only the author's edits are applied. Anyone else gets the post back
/// unchanged, same as a fresh read.
async fn edit_post(
    EditPostPath { id }: EditPostPath,
    State(authoring): State<Arc<Authoring>>,
    user: SessionUser,
    Json(form): Json<PostForm>,
) -> Result<Json<Post>> {
    let outcome = authoring.edit_post(user.user_id(), id, form.into()).await?;

    Ok(Json(outcome.post))
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct CommentForm {
    text: String,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct CreateCommentPath {
    id: Id<PostMarker>,
}

async fn create_comment(
    CreateCommentPath { id }: CreateCommentPath,
    State(authoring): State<Arc<Authoring>>,
    user: SessionUser,
    Json(form): Json<CommentForm>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = authoring.add_comment(user.user_id(), id, form.text).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
