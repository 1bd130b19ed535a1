//! Backup snapshot cache over an opaque key-value store.
//!
//! A single slot holds the last successfully loaded or saved document;
//! every write fully overwrites it. A secondary metadata key records the
//! content hash and write time for diagnostics.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::model::{ConfigDocument, SCHEMA_VERSION};
use crate::error::StoreError;

const BACKUP_KEY: &str = "portfolio:config:backup";
const META_KEY: &str = "portfolio:config:meta";

/// A timestamped, single-slot persisted copy of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub config: ConfigDocument,
    pub timestamp: DateTime<Utc>,
    pub schema_version: String,
}

/// Diagnostics metadata stored alongside the snapshot. The document lives
/// only in the snapshot slot; the metadata key carries a SHA-256 of it
/// instead of a second copy, so staleness checks never deserialize the
/// whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Opaque persistent key-value store behind the backup cache.
pub trait BackupStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Redis-backed store.
#[derive(Clone)]
pub struct RedisStore {
    connection: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connects to the given Redis URL.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(|e| StoreError::ConnectionFailed {
            url: redis_url.to_string(),
            message: e.to_string(),
        })?;

        let connection =
            client
                .get_connection_manager()
                .await
                .map_err(|e| StoreError::ConnectionFailed {
                    url: redis_url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self { connection })
    }
}

impl BackupStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(|e| StoreError::ReadFailed {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

/// In-memory store used in tests and for single-shot CLI invocations that
/// run without a Redis instance.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a key, bypassing the cache.
    #[cfg(test)]
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

impl BackupStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .map_err(|e| StoreError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Single-slot backup cache for the configuration document.
pub struct BackupCache<S: BackupStore> {
    store: S,
}

impl<S: BackupStore> BackupCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a snapshot of the document, overwriting any prior snapshot.
    pub async fn save(&self, config: &ConfigDocument) -> Result<(), StoreError> {
        let snapshot = BackupSnapshot {
            config: config.clone(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION.to_string(),
        };

        let json = serde_json::to_string(&snapshot)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let meta = SnapshotMeta {
            hash: compute_hash(&json),
            timestamp: snapshot.timestamp,
            version: SCHEMA_VERSION.to_string(),
        };
        let meta_json = serde_json::to_string(&meta)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        self.store.set(BACKUP_KEY, &json).await?;
        self.store.set(META_KEY, &meta_json).await?;

        Ok(())
    }

    /// Reads the stored snapshot, if any.
    ///
    /// An unparsable snapshot is a cache miss, not an error: the slot may
    /// hold a document written by an older deployment.
    pub async fn restore(&self) -> Result<Option<ConfigDocument>, StoreError> {
        let json = match self.store.get(BACKUP_KEY).await? {
            Some(json) => json,
            None => return Ok(None),
        };

        match serde_json::from_str::<BackupSnapshot>(&json) {
            Ok(snapshot) => Ok(Some(snapshot.config)),
            Err(e) => {
                warn!(error = %e, "Stored snapshot is unparsable, treating as cache miss");
                Ok(None)
            }
        }
    }

    /// Reads the diagnostics metadata, if present and parsable.
    pub async fn meta(&self) -> Result<Option<SnapshotMeta>, StoreError> {
        let json = match self.store.get(META_KEY).await? {
            Some(json) => json,
            None => return Ok(None),
        };

        Ok(serde_json::from_str(&json).ok())
    }
}

/// Computes the SHA256 hash of the given content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
