//! Persistence collaborator for posts
//!
//! [`PostRepository`] is the narrow create/read/update/delete surface the
//! resolver consumes. [`InMemoryPostRepository`] is the process-local
//! implementation used by the server binary and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::post::{CreatePostInput, Post, PostId, UpdatePostInput};
use crate::types::DateTime;

/// Errors raised by a persistence backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Record not found: Post {id}")]
    NotFound { id: PostId },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Persistence operations for the post entity
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Load every post
    async fn find_many(&self) -> PersistenceResult<Vec<Post>>;

    /// Load one post, `None` if the id is unknown
    async fn find_unique(&self, id: PostId) -> PersistenceResult<Option<Post>>;

    /// Insert a post and return it with its assigned id
    async fn create(&self, data: CreatePostInput) -> PersistenceResult<Post>;

    /// Apply `data` to an existing post
    ///
    /// Fails with [`PersistenceError::NotFound`] if `id` does not exist.
    async fn update(&self, id: PostId, data: UpdatePostInput) -> PersistenceResult<Post>;

    /// Remove a post and return its last value
    ///
    /// Fails with [`PersistenceError::NotFound`] if `id` does not exist.
    async fn delete(&self, id: PostId) -> PersistenceResult<Post>;
}

/// In-memory post table with auto-incrementing ids
///
/// Ids start at 1 and are never reused after a delete.
pub struct InMemoryPostRepository {
    rows: RwLock<BTreeMap<PostId, Post>>,
    next_id: AtomicI32,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_many(&self) -> PersistenceResult<Vec<Post>> {
        let rows = self.rows.read().await;
        Ok(rows.values().cloned().collect())
    }

    async fn find_unique(&self, id: PostId) -> PersistenceResult<Option<Post>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }

    async fn create(&self, data: CreatePostInput) -> PersistenceResult<Post> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if id <= 0 {
            return Err(PersistenceError::Backend("post id space exhausted".to_string()));
        }

        let post = Post {
            id,
            title: data.title,
            body: data.body,
            created_at: DateTime::now(),
        };

        let mut rows = self.rows.write().await;
        rows.insert(id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: PostId, data: UpdatePostInput) -> PersistenceResult<Post> {
        let mut rows = self.rows.write().await;
        let post = rows.get_mut(&id).ok_or(PersistenceError::NotFound { id })?;
        data.apply_to(post);
        Ok(post.clone())
    }

    async fn delete(&self, id: PostId) -> PersistenceResult<Post> {
        let mut rows = self.rows.write().await;
        rows.remove(&id).ok_or(PersistenceError::NotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            body: format!("body of {}", title),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryPostRepository::new();

        let a = repo.create(input("A")).await.unwrap();
        let b = repo.create(input("B")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.find_many().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let repo = InMemoryPostRepository::new();

        let a = repo.create(input("A")).await.unwrap();
        repo.delete(a.id).await.unwrap();
        let b = repo.create(input("B")).await.unwrap();

        assert_eq!(b.id, 2);
        assert!(repo.find_unique(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_many_ordered_by_id() {
        let repo = InMemoryPostRepository::new();
        for title in ["A", "B", "C"] {
            repo.create(input(title)).await.unwrap();
        }

        let ids: Vec<PostId> = repo
            .find_many()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let err = repo.update(42, UpdatePostInput::default()).await.unwrap_err();
        assert_eq!(err, PersistenceError::NotFound { id: 42 });
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let err = repo.delete(42).await.unwrap_err();
        assert_eq!(err, PersistenceError::NotFound { id: 42 });
    }
}
