//! The feed, follow and authoring operations behind the web adapter.
//!
//! Everything here is generic over the [`chronik_db::store::Store`]
//! collaborator; the adapter decides which implementation backs it.

pub mod authoring;
pub mod blob;
pub mod cache;
pub mod error;
pub mod feed;
pub mod follow;

#[cfg(test)]
pub(crate) mod testutil;
