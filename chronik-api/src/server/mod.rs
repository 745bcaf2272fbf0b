use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use chronik_common::model::session::{SessionTokenDecodeError, SessionTokenHashError};
use chronik_core::{
    authoring::Authoring, blob::BlobError, blob::BlobStore, error::CoreError, feed::FeedAssembler,
    follow::FollowManager,
};
use chronik_db::store::{DbError, Store};
use json::Json;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error};

mod auth;
mod json;
mod routes;

pub const LOGIN_PATH: &str = "/auth/login";

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub store: Arc<dyn Store>,
    pub feeds: Arc<FeedAssembler>,
    pub follows: Arc<FollowManager>,
    pub authoring: Arc<Authoring>,
    pub blobs: Arc<dyn BlobStore>,
}

impl ServerState {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        feed_cache_ttl: Duration,
        page_size: usize,
    ) -> Self {
        Self {
            feeds: Arc::new(FeedAssembler::new(store.clone(), feed_cache_ttl, page_size)),
            follows: Arc::new(FollowManager::new(store.clone())),
            authoring: Arc::new(Authoring::new(store.clone())),
            store,
            blobs,
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided session token could not be decoded: {0}")]
    InvalidSessionToken(#[from] SessionTokenDecodeError),
    #[error("The session token could not be hashed: {0}")]
    SessionTokenHash(#[from] SessionTokenHashError),
    #[error("No valid session; redirecting to login")]
    NotLoggedIn,
    #[error("The uploaded blob was rejected: {0}")]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::NotLoggedIn => StatusCode::SEE_OTHER,
            ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidSessionToken(_)
            | ServerError::Blob(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::SessionTokenHash(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Core(core) => {
                if core.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if matches!(core, CoreError::Validation(_)) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Anonymous mutation attempts are not errors: the caller is
        // sent to the identity provider and nothing was mutated.
        if matches!(self, ServerError::NotLoggedIn) {
            debug!("Redirecting anonymous caller to login");
            return (StatusCode::SEE_OTHER, [(header::LOCATION, LOGIN_PATH)]).into_response();
        }

        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
        };
        (status, Json(error_response)).into_response()
    }
}
