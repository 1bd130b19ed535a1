//! Configuration loading with a layered fallback chain.

use tracing::{info, warn};

use super::backup::{BackupCache, BackupStore};
use super::merge::deep_merge;
use super::model::ConfigDocument;
use crate::error::RemoteError;

/// Source of the canonical remote document, as raw JSON. The loader merges
/// it over the hardcoded defaults before typing it, so a partially
/// populated remote document inherits defaults for everything it omits.
pub trait RemoteSource: Send + Sync {
    fn fetch(
        &self,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, RemoteError>> + Send;
}

/// Which tier of the fallback chain satisfied a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTier {
    Remote,
    Backup,
    Defaults,
}

impl std::fmt::Display for LoadTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Backup => write!(f, "backup"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// A loaded document and the tier that produced it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub document: ConfigDocument,
    pub tier: LoadTier,
}

/// Resolves the current document: remote source, then backup snapshot,
/// then hardcoded defaults.
pub struct ConfigLoader<R: RemoteSource, S: BackupStore> {
    remote: R,
    backup: BackupCache<S>,
}

impl<R: RemoteSource, S: BackupStore> ConfigLoader<R, S> {
    pub fn new(remote: R, backup: BackupCache<S>) -> Self {
        Self { remote, backup }
    }

    /// Loads the current document. Never fails: every tier failure falls
    /// through to the next, and the final tier is synthesized in memory.
    ///
    /// No retries happen here; re-loading is the reconciliation loop's
    /// responsibility. The satisfying tier is logged but does not alter
    /// control flow for the caller.
    pub async fn load(&self) -> LoadedConfig {
        match self.remote.fetch().await {
            Ok(raw) => match merge_over_defaults(&raw) {
                Ok(document) => {
                    info!(tier = %LoadTier::Remote, "Configuration loaded");

                    // Keep the backup slot fresh for the next outage. Failure
                    // here must not degrade a successful load.
                    if let Err(e) = self.backup.save(&document).await {
                        warn!(error = %e, "Failed to write backup snapshot");
                    }

                    return LoadedConfig {
                        document,
                        tier: LoadTier::Remote,
                    };
                }
                Err(e) => {
                    warn!(error = %e, "Remote document is unusable, trying backup snapshot");
                }
            },
            Err(e) => {
                warn!(error = %e, "Remote source unavailable, trying backup snapshot");
            }
        }

        match self.backup.restore().await {
            Ok(Some(document)) => {
                info!(tier = %LoadTier::Backup, "Configuration loaded");
                return LoadedConfig {
                    document,
                    tier: LoadTier::Backup,
                };
            }
            Ok(None) => {
                warn!("No backup snapshot available, falling back to defaults");
            }
            Err(e) => {
                warn!(error = %e, "Backup store unavailable, falling back to defaults");
            }
        }

        info!(tier = %LoadTier::Defaults, "Configuration loaded");
        LoadedConfig {
            document: ConfigDocument::default_document(),
            tier: LoadTier::Defaults,
        }
    }
}

/// Merges a raw remote document over the hardcoded defaults and types it.
fn merge_over_defaults(raw: &serde_json::Value) -> Result<ConfigDocument, serde_json::Error> {
    let defaults = serde_json::to_value(ConfigDocument::default_document())?;
    serde_json::from_value(deep_merge(&defaults, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::backup::MemoryStore;
    use serde_json::json;

    struct StaticRemote(serde_json::Value);

    impl RemoteSource for StaticRemote {
        async fn fetch(&self) -> Result<serde_json::Value, RemoteError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRemote;

    impl RemoteSource for FailingRemote {
        async fn fetch(&self) -> Result<serde_json::Value, RemoteError> {
            Err(RemoteError::FetchFailed {
                url: "http://localhost:3001/config.json".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    fn partial_remote() -> StaticRemote {
        StaticRemote(json!({"site": {"title": "Remoto"}}))
    }

    #[tokio::test]
    async fn remote_tier_wins_when_available() {
        let loader = ConfigLoader::new(partial_remote(), BackupCache::new(MemoryStore::new()));

        let loaded = loader.load().await;

        assert_eq!(loaded.tier, LoadTier::Remote);
        assert_eq!(loaded.document.site.title, "Remoto");
    }

    #[tokio::test]
    async fn partial_remote_document_inherits_defaults() {
        let loader = ConfigLoader::new(partial_remote(), BackupCache::new(MemoryStore::new()));

        let loaded = loader.load().await;

        // Sections the remote omitted come from the defaults.
        assert_eq!(loaded.document.site.tagline, "Arte que vive contigo");
        assert_eq!(loaded.document.artist.name, "Alejandro Morales");
        assert_eq!(loaded.document.categories.len(), 4);
    }

    #[tokio::test]
    async fn successful_load_refreshes_backup() {
        let store = MemoryStore::new();
        let loader = ConfigLoader::new(partial_remote(), BackupCache::new(store.clone()));
        loader.load().await;

        // A second loader with a dead remote must find the snapshot.
        let loader = ConfigLoader::new(FailingRemote, BackupCache::new(store));
        let loaded = loader.load().await;

        assert_eq!(loaded.tier, LoadTier::Backup);
        assert_eq!(loaded.document.site.title, "Remoto");
    }

    #[tokio::test]
    async fn unusable_remote_document_falls_through_to_backup() {
        let store = MemoryStore::new();
        let cache = BackupCache::new(store.clone());
        let mut snapshot = ConfigDocument::default_document();
        snapshot.artist.name = "Desde Backup".to_string();
        cache.save(&snapshot).await.expect("save failed");

        // An array can't be merged into a document.
        let loader = ConfigLoader::new(StaticRemote(json!([1, 2, 3])), BackupCache::new(store));
        let loaded = loader.load().await;

        assert_eq!(loaded.tier, LoadTier::Backup);
        assert_eq!(loaded.document, snapshot);
    }

    #[tokio::test]
    async fn defaults_tier_when_remote_and_backup_fail() {
        let loader = ConfigLoader::new(FailingRemote, BackupCache::new(MemoryStore::new()));

        let loaded = loader.load().await;

        assert_eq!(loaded.tier, LoadTier::Defaults);
        assert_eq!(loaded.document.site.title, "InkMaster Portfolio");
    }
}
