//! Builds the four paginated post views: global, group, profile and
//! personalized.

use crate::{
    cache::ResponseCache,
    error::{CoreError, Result},
};
use chronik_common::{
    model::{
        Id,
        comment::Comment,
        group::{Group, Slug},
        post::{Post, PostMarker},
        user::{User, UserMarker, Username},
    },
    page::{Page, PageNumber, paginate},
};
use chronik_db::store::{PostQuery, Store};
use serde::Serialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::debug;

/// Group view: the board itself plus one page of its posts.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

/// Profile view: one page of the author's posts, their total post
/// count, and whether the current viewer already follows them
/// (`false` for anonymous viewers).
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<Post>,
    pub post_count: usize,
    pub following: bool,
}

/// Post page: the post, how many posts its author has in total, and
/// the comments underneath, oldest first.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: usize,
    pub comments: Vec<Comment>,
}

pub struct FeedAssembler {
    store: Arc<dyn Store>,
    cache: ResponseCache,
    page_size: usize,
}

impl FeedAssembler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, cache_ttl: Duration, page_size: usize) -> Self {
        Self {
            store,
            cache: ResponseCache::new(cache_ttl),
            page_size,
        }
    }

    /// All posts, newest first.
    pub async fn global_feed(&self, page: PageNumber) -> Result<Page<Post>> {
        let posts = self.store.list_posts(&PostQuery::all()).await?;
        Ok(paginate(posts, page, self.page_size))
    }

    /// Global feed as a serialized response body, cached under the
    /// canonicalized request key. Within the TTL two reads return
    /// byte-identical bodies no matter what was written in between.
    pub async fn global_feed_body(&self, cache_key: &str, page: PageNumber) -> Result<String> {
        self.global_feed_body_at(Instant::now(), cache_key, page)
            .await
    }

    pub async fn global_feed_body_at(
        &self,
        now: Instant,
        cache_key: &str,
        page: PageNumber,
    ) -> Result<String> {
        if let Some(body) = self.cache.get_at(now, cache_key) {
            debug!(cache_key, "Serving global feed from cache");
            return Ok(body);
        }

        let feed = self.global_feed(page).await?;
        let body = serde_json::to_string(&feed)?;
        Ok(self.cache.put_at(now, cache_key, body))
    }

    pub async fn group_feed(&self, slug: &Slug, page: PageNumber) -> Result<GroupFeed> {
        let group = self
            .store
            .fetch_group_by_slug(slug)
            .await?
            .ok_or_else(|| CoreError::GroupNotFound(slug.clone()))?;

        let posts = self.store.list_posts(&PostQuery::in_group(group.id)).await?;
        Ok(GroupFeed {
            page: paginate(posts, page, self.page_size),
            group,
        })
    }

    pub async fn profile_feed(
        &self,
        username: &Username,
        viewer: Option<Id<UserMarker>>,
        page: PageNumber,
    ) -> Result<ProfileFeed> {
        let author = self
            .store
            .fetch_user_by_username(username)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(username.clone()))?;

        let posts = self
            .store
            .list_posts(&PostQuery::by_author(author.id))
            .await?;
        let post_count = posts.len();

        let following = match viewer {
            Some(viewer) => self.store.follow_exists(viewer, author.id).await?,
            None => false,
        };

        Ok(ProfileFeed {
            author,
            page: paginate(posts, page, self.page_size),
            post_count,
            following,
        })
    }

    /// Posts by authors the viewer follows. Empty if they follow
    /// nobody.
    pub async fn follow_feed(
        &self,
        viewer: Id<UserMarker>,
        page: PageNumber,
    ) -> Result<Page<Post>> {
        let posts = self
            .store
            .list_posts(&PostQuery::followed_by(viewer))
            .await?;
        Ok(paginate(posts, page, self.page_size))
    }

    pub async fn post_detail(&self, id: Id<PostMarker>) -> Result<PostDetail> {
        let post = self
            .store
            .fetch_post(id)
            .await?
            .ok_or(CoreError::PostNotFound(id))?;

        let author_post_count = self
            .store
            .list_posts(&PostQuery::by_author(post.author.id))
            .await?
            .len();
        let comments = self.store.list_comments(post.id).await?;

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FeedAssembler;
    use crate::{
        error::CoreError,
        testutil::{create_group, create_post, create_user, slug, username},
    };
    use chronik_common::page::{DEFAULT_PAGE_SIZE, PageNumber};
    use chronik_db::{memory::MemStore, store::Store};
    use std::{
        sync::Arc,
        time::{Duration, Instant},
    };

    fn assembler(store: &Arc<MemStore>) -> FeedAssembler {
        FeedAssembler::new(store.clone(), Duration::from_secs(20), DEFAULT_PAGE_SIZE)
    }

    fn page(number: u32) -> PageNumber {
        PageNumber::new(number).unwrap()
    }

    #[tokio::test]
    async fn global_feed_paginates_thirteen_posts() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "test_name").await;
        for n in 1..=13 {
            create_post(&store, &author, &format!("post {n}"), None).await;
        }
        let feeds = assembler(&store);

        let first = feeds.global_feed(page(1)).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items[0].text.get(), "post 13");

        let second = feeds.global_feed(page(2)).await.unwrap();
        assert_eq!(second.items.len(), 3);

        let third = feeds.global_feed(page(3)).await.unwrap();
        assert!(third.items.is_empty());
    }

    #[tokio::test]
    async fn group_feed_filters_by_slug() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let group = create_group(&store, "test_slug").await;
        create_post(&store, &author, "in group", Some(&group)).await;
        create_post(&store, &author, "ungrouped", None).await;
        let feeds = assembler(&store);

        let feed = feeds.group_feed(&slug("test_slug"), page(1)).await.unwrap();
        assert_eq!(feed.group.slug, slug("test_slug"));
        assert_eq!(feed.page.items.len(), 1);
        assert_eq!(feed.page.items[0].text.get(), "in group");
    }

    #[tokio::test]
    async fn unknown_group_slug_is_not_found() {
        let store = Arc::new(MemStore::new());
        let feeds = assembler(&store);

        let err = feeds
            .group_feed(&slug("missing"), PageNumber::FIRST)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn profile_feed_reports_count_and_follow_state() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "author").await;
        let viewer = create_user(&store, "viewer").await;
        create_post(&store, &author, "one", None).await;
        create_post(&store, &author, "two", None).await;
        let feeds = assembler(&store);

        let anonymous = feeds
            .profile_feed(&username("author"), None, PageNumber::FIRST)
            .await
            .unwrap();
        assert_eq!(anonymous.post_count, 2);
        assert!(!anonymous.following);

        store.insert_follow(viewer.id, author.id).await.unwrap();
        let as_viewer = feeds
            .profile_feed(&username("author"), Some(viewer.id), PageNumber::FIRST)
            .await
            .unwrap();
        assert!(as_viewer.following);

        let err = feeds
            .profile_feed(&username("nobody"), None, PageNumber::FIRST)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn follow_feed_contains_exactly_followed_authors() {
        let store = Arc::new(MemStore::new());
        let viewer = create_user(&store, "viewer").await;
        let followed = create_user(&store, "followed").await;
        let stranger = create_user(&store, "stranger").await;
        create_post(&store, &followed, "from followed", None).await;
        create_post(&store, &stranger, "from stranger", None).await;
        let feeds = assembler(&store);

        let empty = feeds.follow_feed(viewer.id, PageNumber::FIRST).await.unwrap();
        assert!(empty.items.is_empty());

        store.insert_follow(viewer.id, followed.id).await.unwrap();
        let feed = feeds.follow_feed(viewer.id, PageNumber::FIRST).await.unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].author.id, followed.id);
    }

    #[tokio::test]
    async fn post_detail_counts_author_posts_and_lists_comments() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        let post = create_post(&store, &author, "commented", None).await;
        create_post(&store, &author, "other", None).await;
        let feeds = assembler(&store);

        let detail = feeds.post_detail(post.id).await.unwrap();
        assert_eq!(detail.post.id, post.id);
        assert_eq!(detail.author_post_count, 2);
        assert!(detail.comments.is_empty());

        let err = feeds.post_detail(999.into()).await.unwrap_err();
        assert!(matches!(err, CoreError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn cached_global_feed_bodies_are_byte_identical_within_the_ttl() {
        let store = Arc::new(MemStore::new());
        let author = create_user(&store, "auth").await;
        create_post(&store, &author, "visible", None).await;
        let feeds = assembler(&store);

        let start = Instant::now();
        let first = feeds
            .global_feed_body_at(start, "/?page=1", PageNumber::FIRST)
            .await
            .unwrap();

        // A write lands between the two reads.
        create_post(&store, &author, "too fresh", None).await;

        let within_ttl = start + Duration::from_secs(19);
        let second = feeds
            .global_feed_body_at(within_ttl, "/?page=1", PageNumber::FIRST)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(!second.contains("too fresh"));

        let past_ttl = start + Duration::from_secs(21);
        let third = feeds
            .global_feed_body_at(past_ttl, "/?page=1", PageNumber::FIRST)
            .await
            .unwrap();
        assert!(third.contains("too fresh"));
    }
}
