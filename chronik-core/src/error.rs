use chronik_common::model::{
    Id, ModelValidationError, group::Slug, post::PostMarker, user::Username,
};
use chronik_db::store::DbError;
use thiserror::Error;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Per-request outcome of a core operation. None of these are fatal to
/// the process.
///
/// Authorization refusal is deliberately not here: a non-author edit
/// returns the unchanged post, it does not error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No group with slug {0} exists.")]
    GroupNotFound(Slug),
    #[error("No user with username {0} exists.")]
    UserNotFound(Username),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Store(#[from] DbError),
    #[error("Feed body could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::GroupNotFound(_) | CoreError::UserNotFound(_) | CoreError::PostNotFound(_)
        )
    }
}
