use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Annotated image returned by the service, decoded from its data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LabeledImage {
    /// Decode `data:<mime>;base64,<payload>`; anything else yields `None`
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.trim().strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;

        let bytes = match STANDARD.decode(payload.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Labeled image payload is not valid base64: {}", e);
                return None;
            }
        };

        Some(Self {
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type.to_string()
            },
            bytes,
        })
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }

    /// Write the image as `labeled-<timestamp>.<ext>` inside `dir`
    pub async fn save_in<P: AsRef<Path>>(&self, dir: P, at: DateTime<Utc>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(format!(
            "labeled-{}.{}",
            at.format("%Y%m%dT%H%M%S%3fZ"),
            self.extension()
        ));
        tokio::fs::write(&path, &self.bytes).await?;

        info!("Saved labeled image to {}", path.display());
        Ok(path)
    }
}
