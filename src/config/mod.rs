//! Configuration model, merging, loading and backup caching.

pub mod backup;
pub mod hot_reload;
pub mod loader;
pub mod merge;
pub mod model;
pub mod paths;

pub use backup::{BackupCache, BackupStore, MemoryStore, RedisStore};
pub use loader::{ConfigLoader, LoadTier, LoadedConfig, RemoteSource};
pub use merge::deep_merge;
pub use model::{Category, Complexity, ConfigDocument, ThemeColors, SCHEMA_VERSION};
pub use paths::{is_valid_image_path, normalize_image_path, PageLocation};
