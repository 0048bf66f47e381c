//! Per-request context handed to write resolvers

use std::sync::Arc;

use crate::invalidation::Notifier;
use crate::live_query::LiveQueryStore;

/// Request context that may carry the live-query store
///
/// The default context has no store, so writes made through it skip
/// invalidation.
#[derive(Clone, Default)]
pub struct RequestContext {
    live_query_store: Option<Arc<dyn LiveQueryStore>>,
}

impl RequestContext {
    /// Context carrying `store`
    pub fn with_store(store: Arc<dyn LiveQueryStore>) -> Self {
        Self {
            live_query_store: Some(store),
        }
    }

    /// Notifier bound to this context's store
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.live_query_store.clone())
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("live_queries", &self.live_query_store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_query::InMemoryLiveQueryStore;

    #[test]
    fn test_default_context_has_no_store() {
        let ctx = RequestContext::default();
        assert!(!ctx.notifier().is_enabled());
    }

    #[test]
    fn test_context_with_store() {
        let ctx = RequestContext::with_store(Arc::new(InMemoryLiveQueryStore::default()));
        assert!(ctx.notifier().is_enabled());
    }
}
