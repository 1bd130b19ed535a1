//! Image uploads to the configuration server.
//!
//! Constraints are enforced client-side before any bytes leave the machine;
//! the server applies the same limits independently.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::client::RemoteClient;
use crate::error::{RemoteError, UploadError};

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Destination slot for an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Homepage,
    Artist,
    Logo,
    Portfolio,
}

impl ImageKind {
    /// Extensions accepted for this slot. Logos additionally accept SVG.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Logo => &["jpg", "jpeg", "png", "gif", "webp", "svg"],
            _ => &IMAGE_EXTENSIONS,
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Homepage => "homepage",
            Self::Artist => "artist",
            Self::Logo => "logo",
            Self::Portfolio => "portfolio",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ImageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "homepage" => Ok(Self::Homepage),
            "artist" => Ok(Self::Artist),
            "logo" => Ok(Self::Logo),
            "portfolio" => Ok(Self::Portfolio),
            other => Err(format!(
                "unknown image kind '{}', expected homepage, artist, logo or portfolio",
                other
            )),
        }
    }
}

/// Server record for a stored upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub filename: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub relative_path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<UploadData>,
    #[serde(default)]
    error: Option<String>,
}

/// Validates a candidate upload against size and type constraints.
pub fn validate_upload(filename: &str, size: u64, kind: ImageKind) -> Result<(), UploadError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            filename: filename.to_string(),
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !kind.allowed_extensions().contains(&extension.as_str()) {
        return Err(UploadError::TypeNotAllowed {
            extension,
            kind: kind.to_string(),
        });
    }

    Ok(())
}

/// Uploads an image file to its destination slot.
pub async fn upload_image(
    client: &RemoteClient,
    kind: ImageKind,
    path: &Path,
) -> Result<UploadData, UploadError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let bytes = tokio::fs::read(path).await.map_err(|e| UploadError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    validate_upload(&filename, bytes.len() as u64, kind)?;

    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
    let form = reqwest::multipart::Form::new()
        .part("image", part)
        .text("type", kind.to_string());

    let url = format!("{}/api/upload/{}", client.base_url(), kind);
    let envelope: UploadEnvelope = client
        .http()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| UploadError::RequestFailed(RemoteError::HttpFailed(e).to_string()))?
        .json()
        .await
        .map_err(|e| UploadError::RequestFailed(e.to_string()))?;

    if !envelope.success {
        return Err(UploadError::RequestFailed(
            envelope
                .error
                .unwrap_or_else(|| "unspecified server error".to_string()),
        ));
    }

    let data = envelope
        .data
        .ok_or_else(|| UploadError::RequestFailed("envelope carried no data".to_string()))?;

    info!(filename = %filename, kind = %kind, stored = %data.relative_path, "Image uploaded");

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_images_within_the_size_limit() {
        assert!(validate_upload("hero.jpg", 1024, ImageKind::Homepage).is_ok());
        assert!(validate_upload("perfil.webp", MAX_UPLOAD_BYTES, ImageKind::Artist).is_ok());
    }

    #[test]
    fn rejects_oversized_files() {
        let err = validate_upload("enorme.png", MAX_UPLOAD_BYTES + 1, ImageKind::Portfolio)
            .expect_err("should reject");
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn svg_is_logo_only() {
        assert!(validate_upload("marca.svg", 100, ImageKind::Logo).is_ok());

        let err = validate_upload("marca.svg", 100, ImageKind::Homepage).expect_err("should reject");
        assert!(matches!(err, UploadError::TypeNotAllowed { .. }));
    }

    #[test]
    fn rejects_unknown_extensions() {
        let err = validate_upload("script.exe", 100, ImageKind::Artist).expect_err("should reject");
        assert!(matches!(
            err,
            UploadError::TypeNotAllowed { extension, .. } if extension == "exe"
        ));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_upload("FOTO.JPG", 100, ImageKind::Portfolio).is_ok());
    }

    #[test]
    fn kind_parses_from_cli_strings() {
        assert_eq!("homepage".parse::<ImageKind>(), Ok(ImageKind::Homepage));
        assert_eq!("LOGO".parse::<ImageKind>(), Ok(ImageKind::Logo));
        assert!("banner".parse::<ImageKind>().is_err());
    }
}
