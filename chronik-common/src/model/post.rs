use crate::model::{
    Id,
    group::{Group, GroupMarker},
    user::{User, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// Read model of a post, with author and group resolved.
///
/// The author is fixed at creation; edits may replace text, group and
/// image but never the author. Posts are never hard-deleted.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub group: Option<Group>,
    pub text: PostText,
    pub created_at: UtcDateTime,
    pub image: Option<ImageRef>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub group: Option<Id<GroupMarker>>,
    pub text: PostText,
    pub image: Option<ImageRef>,
}

/// Full replacement of a post's mutable fields. The author is absent
/// on purpose.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostPatch {
    pub group: Option<Id<GroupMarker>>,
    pub text: PostText,
    pub image: Option<ImageRef>,
}

/// Post body. Required to contain at least one non-whitespace
/// character.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PostText(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post text is empty")]
pub struct InvalidPostTextError;

impl PostText {
    pub fn new(text: String) -> Result<Self, InvalidPostTextError> {
        if text.trim().is_empty() {
            Err(InvalidPostTextError)
        } else {
            Ok(PostText(text))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostText::new(inner).map_err(|_| Error::invalid_value(Unexpected::Str(""), &"PostText"))
    }
}

/// Stable reference into the blob store, as returned by an image
/// upload. Stored verbatim on the post.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    #[must_use]
    pub fn new(reference: String) -> Self {
        Self(reference)
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::PostText;

    #[test]
    fn post_text_requires_content() {
        assert!(PostText::new(String::new()).is_err());
        assert!(PostText::new("   \n".to_owned()).is_err());
        assert!(PostText::new("Текст нового поста".to_owned()).is_ok());
    }
}
