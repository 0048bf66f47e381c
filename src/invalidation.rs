//! Invalidation keys and the notifier that submits them after writes
//!
//! Keys follow the live-query resource identifier format:
//!
//! - `Post:1` identifies one entity instance
//! - `Query.posts` identifies an unparameterized query result
//! - `Query.post(id:1)` identifies a parameterized query result
//!
//! Writes invalidate coarsely: create and delete invalidate the whole
//! collection query, update invalidates the instance and its single-item query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::live_query::LiveQueryStore;
use crate::post::{Post, PostId};

/// GraphQL type name of the post entity
pub const POST_TYPE: &str = "Post";
/// Collection query over posts
pub const POSTS_QUERY: &str = "posts";
/// Single-post query
pub const POST_QUERY: &str = "post";

/// Opaque token naming an entity instance or a cached query result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvalidationKey(String);

impl InvalidationKey {
    /// `<Type>:<id>`
    pub fn entity(type_name: &str, id: impl fmt::Display) -> Self {
        Self(format!("{}:{}", type_name, id))
    }

    /// `Query.<name>`
    pub fn collection(query: &str) -> Self {
        Self(format!("Query.{}", query))
    }

    /// `Query.<name>(<args>)`
    pub fn query(query: &str, args: &str) -> Self {
        Self(format!("Query.{}({})", query, args))
    }

}

impl fmt::Display for InvalidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys invalidated when a single post changes
pub fn single_post_keys(id: PostId) -> Vec<InvalidationKey> {
    vec![
        InvalidationKey::entity(POST_TYPE, id),
        InvalidationKey::query(POST_QUERY, &format!("id:{}", id)),
    ]
}

/// Keys invalidated when post list membership changes
pub fn post_collection_keys() -> Vec<InvalidationKey> {
    vec![InvalidationKey::collection(POSTS_QUERY)]
}

/// Keys a live `posts` result depends on
///
/// Besides the collection key the result depends on every member, so an
/// update of any listed post refreshes the list without a collection key.
pub fn post_list_dependencies(posts: &[Post]) -> Vec<InvalidationKey> {
    let mut keys = post_collection_keys();
    keys.extend(posts.iter().map(|post| InvalidationKey::entity(POST_TYPE, post.id)));
    keys
}

/// Submits invalidation keys to an optional live-query store
///
/// Without a store every call is a no-op. Store failures are logged and
/// swallowed: the write they follow has already been committed.
#[derive(Clone, Default)]
pub struct Notifier {
    store: Option<Arc<dyn LiveQueryStore>>,
}

impl Notifier {
    pub fn new(store: Option<Arc<dyn LiveQueryStore>>) -> Self {
        Self { store }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Invalidate one post after an update
    pub async fn invalidate_single(&self, id: PostId) {
        self.submit(single_post_keys(id)).await;
    }

    /// Invalidate the post list after a create or delete
    pub async fn invalidate_collection(&self) {
        self.submit(post_collection_keys()).await;
    }

    async fn submit(&self, keys: Vec<InvalidationKey>) {
        let Some(store) = &self.store else {
            tracing::debug!(keys = ?keys, "no live query store, skipping invalidation");
            return;
        };

        if let Err(e) = store.invalidate(&keys).await {
            tracing::warn!(error = %e, keys = ?keys, "live query invalidation failed");
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
