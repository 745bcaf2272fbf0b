use crate::server::ServerRouter;
use axum::Router;

mod feeds;
mod follows;
mod media;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(feeds::routes())
        .merge(follows::routes())
        .merge(media::routes())
        .merge(posts::routes())
}
