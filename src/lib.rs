//! # live-posts
//!
//! GraphQL backend for a single post entity with live-query invalidation.
//!
//! ## Features
//!
//! - **CRUD Resolvers** - List, get, create, update and delete posts
//! - **Invalidation** - Writes derive invalidation keys and notify the live-query store
//! - **Live Queries** - `livePosts` / `livePost` subscriptions re-run on invalidation
//! - **Pluggable Collaborators** - Persistence and live-query store behind traits
//! - **HTTP Server** - axum router with GraphiQL and WebSocket subscriptions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use live_posts::{build_schema, InMemoryLiveQueryStore, InMemoryPostRepository};
//!
//! let schema = build_schema(
//!     Arc::new(InMemoryPostRepository::new()),
//!     Some(Arc::new(InMemoryLiveQueryStore::default())),
//! );
//! ```

pub mod config;
pub mod context;
pub mod invalidation;
pub mod live_query;
pub mod persistence;
pub mod post;
pub mod resolver;
pub mod schema;
pub mod server;
pub mod types;

pub use config::ServerConfig;
pub use context::RequestContext;
pub use invalidation::{InvalidationKey, Notifier};
pub use live_query::{InMemoryLiveQueryStore, LiveQueryError, LiveQueryStore, LiveQueryWatch};
pub use persistence::{InMemoryPostRepository, PersistenceError, PostRepository};
pub use post::{CreatePostInput, Post, PostId, UpdatePostInput};
pub use resolver::PostResolver;
pub use schema::{build_schema, PostSchema};
pub use server::{app, graphql_handler, router, serve, ServerError};
pub use types::DateTime;

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Errors returned by post operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(PostId),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Live queries are disabled")]
    LiveQueriesDisabled,
}

impl PostError {
    /// Machine-readable code exposed in GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            PostError::NotFound(_) => "NOT_FOUND",
            PostError::Persistence(_) => "PERSISTENCE_ERROR",
            PostError::Validation(_) => "VALIDATION_ERROR",
            PostError::LiveQueriesDisabled => "LIVE_QUERIES_DISABLED",
        }
    }
}

impl From<PersistenceError> for PostError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { id } => PostError::NotFound(id),
            PersistenceError::Backend(message) => PostError::Persistence(message),
        }
    }
}

impl ErrorExtensions for PostError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.code()))
    }
}

/// Result type for post operations
pub type Result<T> = std::result::Result<T, PostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_errors_map_to_post_errors() {
        assert_eq!(
            PostError::from(PersistenceError::NotFound { id: 4 }),
            PostError::NotFound(4)
        );
        assert_eq!(
            PostError::from(PersistenceError::Backend("connection refused".to_string())),
            PostError::Persistence("connection refused".to_string())
        );
    }

    #[test]
    fn test_error_extension_code() {
        let err = PostError::NotFound(9).extend();
        assert_eq!(err.message, "Post not found: 9");
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("NOT_FOUND")));
    }
}
