//! HTTP server
//!
//! - `POST /graphql` executes queries and mutations
//! - `GET /graphql` serves GraphiQL
//! - `/ws` carries GraphQL subscriptions, including live queries
//! - `GET /health` liveness probe

use async_graphql::http::GraphiQLSource;
use async_graphql::{Request, Response};
use async_graphql_axum::GraphQLSubscription;
use axum::{
    extract::Extension,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::live_query::{InMemoryLiveQueryStore, LiveQueryStore};
use crate::persistence::InMemoryPostRepository;
use crate::schema::{build_schema, PostSchema};

/// Errors raised while running the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// GraphQL handler injecting a per-request [`RequestContext`]
///
/// # Example
///
/// ```rust,no_run
/// use axum::{extract::Extension, routing::post, Router};
/// use live_posts::{graphql_handler, PostSchema, RequestContext};
///
/// # fn example(schema: PostSchema) {
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler))
///     .layer(Extension(schema))
///     .layer(Extension(RequestContext::default()));
/// # }
/// ```
pub async fn graphql_handler(
    Extension(schema): Extension<PostSchema>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<Request>,
) -> Json<Response> {
    let request = request.data(context);
    Json(schema.execute(request).await)
}

async fn graphiql() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/ws")
            .finish(),
    )
}

async fn health() -> &'static str {
    "OK"
}

/// Router serving `schema`, with `context` cloned into every HTTP request
pub fn router(schema: PostSchema, context: RequestContext) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler).get(graphiql))
        .route_service("/ws", GraphQLSubscription::new(schema.clone()))
        .route("/health", get(health))
        .layer(Extension(schema))
        .layer(Extension(context))
}

/// Build the schema and router for `config`
pub fn app(config: &ServerConfig) -> Router {
    let repository = Arc::new(InMemoryPostRepository::new());

    if config.disable_live_queries {
        tracing::warn!("live queries disabled, writes will not invalidate");
        return router(build_schema(repository, None), RequestContext::default());
    }

    let store = Arc::new(InMemoryLiveQueryStore::new(usize::from(config.live_query_buffer)));
    let shared: Arc<dyn LiveQueryStore> = store.clone();
    router(
        build_schema(repository, Some(store)),
        RequestContext::with_store(shared),
    )
}

/// Bind and serve until ctrl-c
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_address();
    let service = app(&config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!("GraphQL server listening on http://{}/graphql", addr);
    tracing::info!("WebSocket subscriptions at ws://{}/ws", addr);

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invalidation::InvalidationKey;
    use serde_json::json;

    #[tokio::test]
    async fn test_handler_invalidates_through_request_context() {
        let store = Arc::new(InMemoryLiveQueryStore::default());
        let schema = build_schema(Arc::new(InMemoryPostRepository::new()), None);
        let shared: Arc<dyn LiveQueryStore> = store.clone();
        let mut watch = store.watch([InvalidationKey::collection("posts")]);

        let Json(response) = graphql_handler(
            Extension(schema),
            Extension(RequestContext::with_store(shared)),
            Json(Request::new(
                r#"mutation { createPost(input: { title: "A", body: "" }) { id title } }"#,
            )),
        )
        .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "createPost": { "id": 1, "title": "A" } })
        );
        assert!(watch.changed().await);
    }

    #[tokio::test]
    async fn test_handler_without_store() {
        let schema = build_schema(Arc::new(InMemoryPostRepository::new()), None);

        let Json(response) = graphql_handler(
            Extension(schema),
            Extension(RequestContext::default()),
            Json(Request::new("{ posts { id } }")),
        )
        .await;

        assert_eq!(response.data.into_json().unwrap(), json!({ "posts": [] }));
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "OK");
    }

    #[test]
    fn test_app_builds_for_both_modes() {
        let _ = app(&ServerConfig::default());
        let _ = app(&ServerConfig {
            disable_live_queries: true,
            ..ServerConfig::default()
        });
    }
}
