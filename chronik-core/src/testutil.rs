use chronik_common::model::{
    group::{CreateGroup, Group, Slug},
    post::{CreatePost, Post, PostText},
    user::{CreateUser, User, Username},
};
use chronik_db::{memory::MemStore, store::Store};
use std::sync::Arc;

pub(crate) fn username(name: &str) -> Username {
    Username::new(name.to_owned()).unwrap()
}

pub(crate) fn slug(slug: &str) -> Slug {
    Slug::new(slug.to_owned()).unwrap()
}

pub(crate) async fn create_user(store: &Arc<MemStore>, name: &str) -> User {
    store
        .create_user(&CreateUser {
            username: username(name),
        })
        .await
        .unwrap()
}

pub(crate) async fn create_group(store: &Arc<MemStore>, group_slug: &str) -> Group {
    store
        .create_group(&CreateGroup {
            title: format!("Board {group_slug}"),
            slug: slug(group_slug),
            description: String::new(),
        })
        .await
        .unwrap()
}

pub(crate) async fn create_post(
    store: &Arc<MemStore>,
    author: &User,
    text: &str,
    group: Option<&Group>,
) -> Post {
    store
        .create_post(&CreatePost {
            author: author.id,
            group: group.map(|group| group.id),
            text: PostText::new(text.to_owned()).unwrap(),
            image: None,
        })
        .await
        .unwrap()
}
