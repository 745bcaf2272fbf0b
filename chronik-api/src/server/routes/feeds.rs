use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{MaybeSessionUser, SessionUser},
    json::Json,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::{
    TypedHeader,
    routing::{RouterExt, TypedPath},
};
use chronik_common::{
    model::{group::Slug, post::Post, user::Username},
    page::{Page, PageNumber},
};
use chronik_core::feed::{FeedAssembler, GroupFeed, ProfileFeed};
use headers::ContentType;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_index)
        .typed_get(get_group_feed)
        .typed_get(get_profile)
        .typed_get(get_follow_feed)
}

/// Lenient page selector shared by all feed views. Garbage input means
/// page 1, never a 4xx.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> PageNumber {
        PageNumber::lenient(self.page.as_deref())
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct IndexPath();

/// The only cached view. The body is rendered once per page and TTL
/// and served verbatim until it expires.
async fn get_index(
    IndexPath(): IndexPath,
    State(feeds): State<Arc<FeedAssembler>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.number();
    let cache_key = format!("/?page={}", page.get());
    let body = feeds.global_feed_body(&cache_key, page).await?;

    Ok((TypedHeader(ContentType::json()), body))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/{slug}", rejection(ServerError))]
struct GetGroupFeedPath {
    slug: Slug,
}

async fn get_group_feed(
    GetGroupFeedPath { slug }: GetGroupFeedPath,
    State(feeds): State<Arc<FeedAssembler>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupFeed>> {
    let feed = feeds.group_feed(&slug, query.number()).await?;

    Ok(Json(feed))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}", rejection(ServerError))]
struct GetProfilePath {
    username: Username,
}

async fn get_profile(
    GetProfilePath { username }: GetProfilePath,
    State(feeds): State<Arc<FeedAssembler>>,
    viewer: MaybeSessionUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfileFeed>> {
    let feed = feeds
        .profile_feed(&username, viewer.user_id(), query.number())
        .await?;

    Ok(Json(feed))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feed", rejection(ServerError))]
struct GetFollowFeedPath();

async fn get_follow_feed(
    GetFollowFeedPath(): GetFollowFeedPath,
    State(feeds): State<Arc<FeedAssembler>>,
    viewer: SessionUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Post>>> {
    let feed = feeds.follow_feed(viewer.user_id(), query.number()).await?;

    Ok(Json(feed))
}
