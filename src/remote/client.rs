//! HTTP clients for fetching and publishing the configuration document.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::loader::RemoteSource;
use crate::config::ConfigDocument;
use crate::error::RemoteError;

/// Response envelope the configuration server wraps every API reply in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Health report from the configuration server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthStatus {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    /// Existence of each expected image folder.
    #[serde(default)]
    pub folders: BTreeMap<String, bool>,
}

/// Read-only source for the published document, served as a static file.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_base(base_url.into()),
        }
    }
}

impl RemoteSource for HttpRemote {
    /// Fetches the published document as raw JSON. A millisecond
    /// cache-buster defeats intermediary caches that ignore cache-control
    /// on static files.
    async fn fetch(&self) -> Result<serde_json::Value, RemoteError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let url = format!("{}/config.json?_={}", self.base_url, millis);

        debug!(url = %url, "Fetching published configuration");

        let response = self
            .client
            .get(&url)
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| RemoteError::FetchFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RemoteError::BadStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| RemoteError::ParseFailed(e.to_string()))
    }
}

/// Read-write client for the server's management API.
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_base(base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetches the current document through the management API.
    pub async fn get_config(&self) -> Result<ConfigDocument, RemoteError> {
        let url = format!("{}/api/config", self.base_url);

        let envelope: ApiEnvelope<ConfigDocument> =
            self.client.get(&url).send().await?.json().await?;

        if !envelope.success {
            return Err(RemoteError::Rejected(rejection_message(
                envelope.error,
                envelope.message,
            )));
        }

        envelope
            .data
            .ok_or_else(|| RemoteError::ParseFailed("envelope carried no data".to_string()))
    }

    /// Publishes a document, returning the server's confirmation message.
    pub async fn save_config(&self, config: &ConfigDocument) -> Result<String, RemoteError> {
        let url = format!("{}/api/save-config", self.base_url);

        let envelope: ApiEnvelope<serde_json::Value> = self
            .client
            .post(&url)
            .json(config)
            .send()
            .await?
            .json()
            .await?;

        if !envelope.success {
            return Err(RemoteError::Rejected(rejection_message(
                envelope.error,
                envelope.message,
            )));
        }

        Ok(envelope
            .message
            .unwrap_or_else(|| "Configuración guardada".to_string()))
    }

    /// Checks the server's health and storage folders.
    pub async fn health(&self) -> Result<HealthStatus, RemoteError> {
        let url = format!("{}/api/health", self.base_url);

        let status: HealthStatus = self.client.get(&url).send().await?.json().await?;

        Ok(status)
    }
}

fn rejection_message(error: Option<String>, message: Option<String>) -> String {
    error
        .or(message)
        .unwrap_or_else(|| "unspecified server error".to_string())
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = RemoteClient::new("http://localhost:3001///");
        assert_eq!(client.base_url(), "http://localhost:3001");
    }

    #[test]
    fn envelope_rejection_prefers_the_error_field() {
        assert_eq!(
            rejection_message(Some("rota".to_string()), Some("ok".to_string())),
            "rota"
        );
        assert_eq!(rejection_message(None, Some("ok".to_string())), "ok");
        assert_eq!(rejection_message(None, None), "unspecified server error");
    }

    #[test]
    fn health_report_parses_with_missing_fields() {
        let status: HealthStatus =
            serde_json::from_str(r#"{"success": true}"#).expect("parse failed");

        assert!(status.success);
        assert!(status.folders.is_empty());
    }

    #[test]
    fn health_report_parses_folder_map() {
        let status: HealthStatus = serde_json::from_str(
            r#"{
                "success": true,
                "message": "Servidor funcionando correctamente",
                "timestamp": "2025-01-01T00:00:00Z",
                "folders": {"homepage": true, "artist": true, "portfolio": false}
            }"#,
        )
        .expect("parse failed");

        assert_eq!(status.folders.get("portfolio"), Some(&false));
    }
}
