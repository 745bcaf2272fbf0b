use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use chronik_common::model::{Id, session::SessionToken, user::UserMarker};
use chronik_db::store::Store;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The authenticated caller, resolved from the bearer session token.
///
/// Extraction fails with the redirect-to-login outcome when the header
/// is missing or the session is unknown or expired; mutation handlers
/// therefore never run for anonymous callers.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct SessionUser {
    id: Id<UserMarker>,
}

impl SessionUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> FromRequestParts<S> for SessionUser
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    ServerError::NotLoggedIn
                } else {
                    ServerError::InvalidAuthorizationHeader(rejection)
                }
            })?;

        let token: SessionToken = header.token().parse()?;
        let token_hash = token.hash()?;

        let session = Arc::<dyn Store>::from_ref(state)
            .fetch_session(&token_hash)
            .await?
            .ok_or(ServerError::NotLoggedIn)?;

        if session.is_expired_at(UtcDateTime::now()) {
            return Err(ServerError::NotLoggedIn);
        }

        Ok(Self { id: session.user })
    }
}

/// Optional variant for views that render for anonymous callers too,
/// like the profile page with its `following` flag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct MaybeSessionUser(pub Option<SessionUser>);

impl MaybeSessionUser {
    #[must_use]
    pub fn user_id(self) -> Option<Id<UserMarker>> {
        self.0.map(SessionUser::user_id)
    }
}

impl<S> FromRequestParts<S> for MaybeSessionUser
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match SessionUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(ServerError::NotLoggedIn) => Ok(Self(None)),
            Err(other) => Err(other),
        }
    }
}
