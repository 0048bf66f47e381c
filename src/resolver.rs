//! Post resolver
//!
//! Each operation maps onto one [`PostRepository`] call. Writes that succeed
//! are followed by an invalidation through the request context's notifier;
//! reads never invalidate.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::persistence::PostRepository;
use crate::post::{CreatePostInput, Post, PostId, UpdatePostInput};

/// Read and write operations over posts
#[derive(Clone)]
pub struct PostResolver {
    repository: Arc<dyn PostRepository>,
}

impl PostResolver {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }

    /// All posts
    pub async fn list(&self) -> crate::Result<Vec<Post>> {
        tracing::debug!("listing posts");
        Ok(self.repository.find_many().await?)
    }

    /// One post, `None` if `id` is unknown
    pub async fn get(&self, id: PostId) -> crate::Result<Option<Post>> {
        tracing::debug!(post_id = id, "loading post");
        Ok(self.repository.find_unique(id).await?)
    }

    /// Create a post and invalidate the post list
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreatePostInput,
    ) -> crate::Result<Post> {
        let created = self.repository.create(input).await?;
        tracing::debug!(post_id = created.id, "post created");
        ctx.notifier().invalidate_collection().await;
        Ok(created)
    }

    /// Update a post and invalidate that post
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: PostId,
        input: UpdatePostInput,
    ) -> crate::Result<Post> {
        let updated = self.repository.update(id, input).await?;
        tracing::debug!(post_id = id, "post updated");
        ctx.notifier().invalidate_single(id).await;
        Ok(updated)
    }

    /// Delete a post, returning its last value, and invalidate the post list
    pub async fn delete(&self, ctx: &RequestContext, id: PostId) -> crate::Result<Post> {
        let deleted = self.repository.delete(id).await?;
        tracing::debug!(post_id = id, "post deleted");
        ctx.notifier().invalidate_collection().await;
        Ok(deleted)
    }
}
