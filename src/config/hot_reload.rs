//! Configuration hot-reload from a local override file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, RwLock};

use super::model::ConfigDocument;
use crate::error::WatcherError;
use crate::validation::validate_document;

/// Watches a local config.json and swaps the shared document on changes.
pub struct ConfigWatcher {
    config: Arc<RwLock<ConfigDocument>>,
    config_path: std::path::PathBuf,
    reload_tx: mpsc::Sender<ConfigReloadEvent>,
}

/// Events emitted by the configuration watcher.
#[derive(Debug, Clone)]
pub enum ConfigReloadEvent {
    /// Configuration was successfully reloaded.
    Reloaded,
    /// Configuration reload failed validation or parsing.
    ReloadFailed { error_count: usize },
}

impl ConfigWatcher {
    pub fn new(
        config: Arc<RwLock<ConfigDocument>>,
        config_path: &Path,
        reload_tx: mpsc::Sender<ConfigReloadEvent>,
    ) -> Self {
        Self {
            config,
            config_path: config_path.to_path_buf(),
            reload_tx,
        }
    }

    /// Starts watching the configuration file for changes.
    ///
    /// The notify callback runs on the watcher's own thread; events are
    /// bridged into a tokio channel so the async handler never blocks an
    /// executor thread waiting for the next one.
    pub async fn start(self) -> Result<(), WatcherError> {
        let (tx, rx) = mpsc::channel(16);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                if let Ok(event) = res {
                    let _ = tx.blocking_send(event);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&self.config_path, RecursiveMode::NonRecursive)?;

        tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of the handler.
            let _watcher = watcher;
            self.handle_changes(rx).await;
        });

        Ok(())
    }

    /// Handles file change events with debouncing.
    async fn handle_changes(self, mut rx: mpsc::Receiver<notify::Event>) {
        let debounce_duration = Duration::from_millis(500);
        let mut last_reload = std::time::Instant::now();

        while let Some(event) = rx.recv().await {
            if !event.kind.is_modify() {
                continue;
            }

            if last_reload.elapsed() < debounce_duration {
                continue;
            }

            // Wait a bit for the file to be fully written
            tokio::time::sleep(debounce_duration).await;

            match self.try_reload().await {
                Ok(()) => {
                    tracing::info!("Configuration reloaded from local file");
                    let _ = self.reload_tx.send(ConfigReloadEvent::Reloaded).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Configuration reload failed");
                    let _ = self
                        .reload_tx
                        .send(ConfigReloadEvent::ReloadFailed { error_count: 1 })
                        .await;
                }
            }

            last_reload = std::time::Instant::now();
        }

        tracing::warn!("Config watcher channel closed");
    }

    /// Parses, validates and swaps in the new document.
    async fn try_reload(&self) -> anyhow::Result<()> {
        let raw = tokio::fs::read_to_string(&self.config_path).await?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        let result = validate_document(&value);
        if !result.is_valid() {
            anyhow::bail!(
                "document failed validation with {} errors",
                result.error_count()
            );
        }

        let new_config: ConfigDocument = serde_json::from_value(value)?;

        let mut config = self.config.write().await;
        *config = new_config;

        Ok(())
    }
}
