//! GraphQL schema for posts
//!
//! - [`QueryRoot`]: `posts`, `post(id)`
//! - [`MutationRoot`]: `createPost`, `updatePost`, `deletePost`
//! - [`SubscriptionRoot`]: `livePosts`, `livePost(id)` live queries

use async_graphql::{Context, ErrorExtensions, Object, Result, Schema, Subscription};
use futures::stream::{self, Stream};
use std::future::Future;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::invalidation::{
    post_collection_keys, post_list_dependencies, single_post_keys, InvalidationKey,
};
use crate::live_query::{InMemoryLiveQueryStore, LiveQueryStore, LiveQueryWatch};
use crate::persistence::PostRepository;
use crate::post::{CreatePostInput, Post, PostId, UpdatePostInput};
use crate::resolver::PostResolver;
use crate::PostError;

/// Post schema with live-query subscriptions
pub type PostSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the schema
///
/// When `live_queries` is `None` writes skip invalidation and live
/// subscriptions are rejected.
pub fn build_schema(
    repository: Arc<dyn PostRepository>,
    live_queries: Option<Arc<InMemoryLiveQueryStore>>,
) -> PostSchema {
    let mut builder = Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(PostResolver::new(repository));

    if let Some(store) = live_queries {
        let shared: Arc<dyn LiveQueryStore> = store.clone();
        builder = builder
            .data(RequestContext::with_store(shared))
            .data(store);
    }

    builder.finish()
}

/// Request context from request data, falling back to schema data, then to a storeless default
pub fn request_context(ctx: &Context<'_>) -> RequestContext {
    ctx.data_opt::<RequestContext>().cloned().unwrap_or_default()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All posts
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let resolver = ctx.data::<PostResolver>()?;
        resolver.list().await.map_err(|e| e.extend())
    }

    /// A single post by id
    async fn post(&self, ctx: &Context<'_>, id: PostId) -> Result<Option<Post>> {
        let resolver = ctx.data::<PostResolver>()?;
        resolver.get(id).await.map_err(|e| e.extend())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a new post
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let resolver = ctx.data::<PostResolver>()?;
        resolver
            .create(&request_context(ctx), input)
            .await
            .map_err(|e| e.extend())
    }

    /// Update an existing post
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: PostId,
        input: UpdatePostInput,
    ) -> Result<Post> {
        let resolver = ctx.data::<PostResolver>()?;
        resolver
            .update(&request_context(ctx), id, input)
            .await
            .map_err(|e| e.extend())
    }

    /// Delete a post, returning its last value
    async fn delete_post(&self, ctx: &Context<'_>, id: PostId) -> Result<Post> {
        let resolver = ctx.data::<PostResolver>()?;
        resolver
            .delete(&request_context(ctx), id)
            .await
            .map_err(|e| e.extend())
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Live `posts`: emits the list now and again whenever it is invalidated
    async fn live_posts(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = Result<Vec<Post>>>> {
        let resolver = ctx.data::<PostResolver>()?.clone();
        let watch = live_store(ctx)?.watch(post_collection_keys());

        Ok(live_results(watch, move || {
            let resolver = resolver.clone();
            async move {
                let posts = resolver.list().await?;
                let keys = post_list_dependencies(&posts);
                Ok((posts, keys))
            }
        }))
    }

    /// Live `post(id)`: emits the post now and again whenever it is invalidated
    async fn live_post(
        &self,
        ctx: &Context<'_>,
        id: PostId,
    ) -> Result<impl Stream<Item = Result<Option<Post>>>> {
        let resolver = ctx.data::<PostResolver>()?.clone();
        let watch = live_store(ctx)?.watch(single_post_keys(id));

        Ok(live_results(watch, move || {
            let resolver = resolver.clone();
            async move {
                let post = resolver.get(id).await?;
                Ok((post, single_post_keys(id)))
            }
        }))
    }
}

fn live_store<'a>(ctx: &'a Context<'_>) -> Result<&'a Arc<InMemoryLiveQueryStore>> {
    ctx.data_opt::<Arc<InMemoryLiveQueryStore>>()
        .ok_or_else(|| PostError::LiveQueriesDisabled.extend())
}

/// Run `query` once, then again after every invalidation of its dependency keys
///
/// Each run returns the result together with the keys it depends on; the
/// watch is retargeted to those keys before the result is emitted. Keys first
/// seen by a run and invalidated while it executed trigger another run.
fn live_results<T, F, Fut>(watch: LiveQueryWatch, query: F) -> impl Stream<Item = Result<T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Result<(T, Vec<InvalidationKey>)>> + Send,
{
    stream::unfold((watch, query, true), |(mut watch, query, first)| async move {
        if !first && !watch.changed().await {
            return None;
        }

        let since = watch.generation();
        let item = match query().await {
            Ok((value, keys)) => {
                watch.retarget(keys, since);
                Ok(value)
            }
            Err(e) => Err(e.extend()),
        };

        Some((item, (watch, query, false)))
    })
}
