use crate::server::{Result, ServerError, ServerRouter, auth::SessionUser};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use chronik_common::model::user::Username;
use chronik_core::follow::FollowManager;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(follow_user)
        .typed_delete(unfollow_user)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}/follow", rejection(ServerError))]
struct FollowPath {
    username: Username,
}

/// Both directions land back on the profile so the caller sees the
/// updated follow state.
async fn follow_user(
    FollowPath { username }: FollowPath,
    State(follows): State<Arc<FollowManager>>,
    user: SessionUser,
) -> Result<Redirect> {
    follows.follow(user.user_id(), &username).await?;

    Ok(Redirect::to(&format!("/users/{username}")))
}

async fn unfollow_user(
    FollowPath { username }: FollowPath,
    State(follows): State<Arc<FollowManager>>,
    user: SessionUser,
) -> Result<Redirect> {
    follows.unfollow(user.user_id(), &username).await?;

    Ok(Redirect::to(&format!("/users/{username}")))
}
