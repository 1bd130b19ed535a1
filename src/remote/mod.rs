//! HTTP clients for the configuration server.

pub mod client;
pub mod upload;

pub use client::{HealthStatus, HttpRemote, RemoteClient};
pub use upload::{ImageKind, UploadData, MAX_UPLOAD_BYTES};
