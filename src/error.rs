//! Error types for the portfolio sync engine.

use thiserror::Error;

/// Top-level application errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote source error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Backup store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote configuration source errors.
///
/// All of these are recovered through the loader's fallback chain and never
/// surface to the end user.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to fetch '{url}': {message}")]
    FetchFailed { url: String, message: String },

    #[error("Remote returned status {status} for '{url}'")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to parse remote document: {0}")]
    ParseFailed(String),

    #[error("Remote rejected the request: {0}")]
    Rejected(String),

    #[error("HTTP request failed: {0}")]
    HttpFailed(#[from] reqwest::Error),
}

/// Backup snapshot store errors.
///
/// A snapshot that cannot be parsed is *not* an error at this level; the
/// cache treats it as a miss and the loader falls through to defaults.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to store at '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("Failed to read key '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Failed to write key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Failed to serialize snapshot: {0}")]
    SerializationFailed(String),
}

/// Document validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Document validation failed with {error_count} error(s)")]
    Failed { error_count: usize },
}

/// Image upload rejections, raised client-side before any bytes are sent.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File '{filename}' is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    #[error("File type '{extension}' is not allowed for {kind} uploads")]
    TypeNotAllowed { extension: String, kind: String },

    #[error("Failed to read file '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("Upload request failed: {0}")]
    RequestFailed(String),
}

/// Local config file watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to watch '{path}': {message}")]
    WatchFailed { path: String, message: String },

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Metrics export errors.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus metrics export failed: {0}")]
    PrometheusFailed(String),
}
