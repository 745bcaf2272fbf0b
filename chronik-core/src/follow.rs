//! Creates and removes follow edges.

use crate::error::{CoreError, Result};
use chronik_common::model::{
    Id,
    user::{UserMarker, Username},
};
use chronik_db::store::Store;
use std::sync::Arc;
use tracing::debug;

pub struct FollowManager {
    store: Arc<dyn Store>,
}

impl FollowManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Subscribes `follower` to the author named `target`.
    ///
    /// Idempotent: repeated calls leave exactly one edge. Following
    /// yourself is a silent no-op, not an error.
    pub async fn follow(&self, follower: Id<UserMarker>, target: &Username) -> Result<()> {
        let author = self
            .store
            .fetch_user_by_username(target)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(target.clone()))?;

        if author.id == follower {
            debug!(%target, "Ignoring self-follow");
            return Ok(());
        }

        let inserted = self.store.insert_follow(follower, author.id).await?;
        debug!(%follower, %target, inserted, "Follow");
        Ok(())
    }

    /// Removes the edge if present; a no-op otherwise.
    pub async fn unfollow(&self, follower: Id<UserMarker>, target: &Username) -> Result<()> {
        let author = self
            .store
            .fetch_user_by_username(target)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(target.clone()))?;

        let removed = self.store.delete_follow(follower, author.id).await?;
        debug!(%follower, %target, removed, "Unfollow");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FollowManager;
    use crate::{
        error::CoreError,
        testutil::{create_user, username},
    };
    use chronik_db::{memory::MemStore, store::Store};
    use std::sync::Arc;

    #[tokio::test]
    async fn follow_is_idempotent() {
        let store = Arc::new(MemStore::new());
        let reader = create_user(&store, "reader").await;
        let writer = create_user(&store, "writer").await;
        let follows = FollowManager::new(store.clone());

        follows.follow(reader.id, &username("writer")).await.unwrap();
        follows.follow(reader.id, &username("writer")).await.unwrap();

        assert!(store.follow_exists(reader.id, writer.id).await.unwrap());
    }

    #[tokio::test]
    async fn self_follow_never_creates_an_edge() {
        let store = Arc::new(MemStore::new());
        let reader = create_user(&store, "reader").await;
        let follows = FollowManager::new(store.clone());

        follows.follow(reader.id, &username("reader")).await.unwrap();
        assert!(!store.follow_exists(reader.id, reader.id).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_after_follow_leaves_no_edge() {
        let store = Arc::new(MemStore::new());
        let reader = create_user(&store, "reader").await;
        let writer = create_user(&store, "writer").await;
        let follows = FollowManager::new(store.clone());

        follows.follow(reader.id, &username("writer")).await.unwrap();
        follows
            .unfollow(reader.id, &username("writer"))
            .await
            .unwrap();
        assert!(!store.follow_exists(reader.id, writer.id).await.unwrap());

        // Unfollowing again stays a no-op.
        follows
            .unfollow(reader.id, &username("writer"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let store = Arc::new(MemStore::new());
        let reader = create_user(&store, "reader").await;
        let follows = FollowManager::new(store.clone());

        let err = follows
            .follow(reader.id, &username("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserNotFound(_)));

        let err = follows
            .unfollow(reader.id, &username("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserNotFound(_)));
    }
}
