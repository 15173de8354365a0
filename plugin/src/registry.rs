//! Registry of embedders available to the host.
//!
//! Embedders are registered once at startup under their plugin id and looked
//! up by name by whatever component needs vectors.

use std::collections::HashMap;
use std::sync::Arc;

use rag2f_openai_embedder::Embedder;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Runtime registry of embedders keyed by plugin id.
#[derive(Default)]
pub struct EmbedderRegistry {
    embedders: RwLock<HashMap<String, Arc<dyn Embedder>>>,
}

impl EmbedderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `embedder` under `id`, returning the embedder it replaced.
    pub async fn register(
        &self,
        id: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Option<Arc<dyn Embedder>> {
        let id = id.into();
        let previous = self.embedders.write().await.insert(id.clone(), embedder);
        if previous.is_some() {
            warn!("Replaced embedder already registered as '{id}'");
        } else {
            debug!("Registered embedder: {id}");
        }
        previous
    }

    /// Get an embedder by id.
    pub async fn get(&self, id: &str) -> Option<Arc<dyn Embedder>> {
        self.embedders.read().await.get(id).cloned()
    }

    pub async fn has(&self, id: &str) -> bool {
        self.embedders.read().await.contains_key(id)
    }

    /// Ids of all registered embedders, sorted.
    pub async fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.embedders.read().await.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Remove an embedder.
    pub async fn unregister(&self, id: &str) -> Option<Arc<dyn Embedder>> {
        let removed = self.embedders.write().await.remove(id);
        if removed.is_some() {
            debug!("Unregistered embedder: {id}");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.embedders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.embedders.read().await.is_empty()
    }
}
