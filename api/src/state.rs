use std::sync::Arc;

use recollect_mcp_runtime::{Backend, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<Backend>,
    /// Local store, exposed on the inspection routes. Empty when the
    /// subprocess backend answers tool calls.
    pub store: MemoryStore,
    pub public_base_url: Option<String>,
    pub fallback_base_url: String,
}

impl AppState {
    pub fn new(
        backend: Backend,
        store: MemoryStore,
        public_base_url: Option<String>,
        fallback_base_url: String,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            store,
            public_base_url,
            fallback_base_url,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self::new(
            Backend::memory(store.clone()),
            store,
            None,
            "http://127.0.0.1:3000".to_string(),
        )
    }
}
