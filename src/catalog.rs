//! Catalog snapshots and the shared store.
//!
//! A snapshot is immutable once published. The store hands out `Arc` clones
//! under a read lock and replaces the whole snapshot under the write lock, so
//! a reader keeps a consistent view even while a reload swaps underneath it.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::{Config, ToolConfig, WorkflowConfig};

/// One published snapshot of the tool and workflow definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tools: Vec<ToolConfig>,
    pub workflows: Vec<WorkflowConfig>,
}

/// A named catalog entry, captured by value at dispatch time so in-flight
/// calls are unaffected by a concurrent snapshot swap.
#[derive(Debug, Clone)]
pub enum Entity {
    Tool(ToolConfig),
    Workflow(WorkflowConfig),
}

impl Catalog {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tools: config.tools.clone(),
            workflows: config.workflows.clone(),
        }
    }

    /// Resolve a name, scanning tools before workflows. On duplicate names
    /// the first declaration wins.
    pub fn find(&self, name: &str) -> Option<Entity> {
        if let Some(tool) = self.tools.iter().find(|t| t.name == name) {
            return Some(Entity::Tool(tool.clone()));
        }
        self.workflows
            .iter()
            .find(|w| w.name == name)
            .map(|w| Entity::Workflow(w.clone()))
    }
}

/// Shared cell holding the current snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Current snapshot. The returned reference stays valid across swaps.
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Publish a new snapshot, replacing the old one wholesale.
    pub async fn swap(&self, catalog: Catalog) {
        *self.current.write().await = Arc::new(catalog);
    }
}
