//! Hot reload of the catalog when the config file changes on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::catalog::{Catalog, CatalogStore};
use crate::config::Config;

/// Watch the config file and swap the store on every write event. Watcher
/// failures are logged and leave the server running without hot reload.
/// The returned handle must be kept alive for events to keep flowing.
pub fn watch_config(path: impl Into<PathBuf>, store: Arc<CatalogStore>) -> Option<RecommendedWatcher> {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return None;
    }

    // notify delivers events on its own thread; bridge them into the runtime.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = match notify::recommended_watcher(move |event: notify::Result<Event>| {
        let _ = tx.send(event);
    }) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Failed to create file watcher: {e}");
            return None;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        error!("Failed to watch config file: {e}");
        return None;
    }
    info!("Watching config file: {}", path.display());

    tokio::spawn(async move {
        // Channel closure ends the task silently.
        while let Some(event) = rx.recv().await {
            match event {
                Ok(event) if matches!(event.kind, EventKind::Modify(_)) => {
                    info!("Config file modified. Reloading...");
                    reload(&path, &store).await;
                }
                Ok(_) => {}
                Err(e) => error!("Watcher error: {e}"),
            }
        }
    });

    Some(watcher)
}

/// Re-read the catalog source and publish a new snapshot. A failed parse
/// keeps the previous snapshot in place.
async fn reload(path: &Path, store: &CatalogStore) {
    match Config::load(path) {
        Ok(config) => {
            store.swap(Catalog::from_config(&config)).await;
            info!("Configuration reloaded successfully.");
        }
        Err(e) => error!("Failed to reload config: {e:#}"),
    }
}
