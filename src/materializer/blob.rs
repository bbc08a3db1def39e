use crate::error::{Result, TrashSightError};
use bytes::Bytes;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// Canonical transmissible image: the bytes uploaded to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Bytes,
    mime_type: String,
    file_name: String,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// A JPEG still, as produced by camera capture
    pub fn jpeg(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Self::new(bytes, "image/jpeg", file_name)
    }

    /// Read an image file, detecting its MIME type.
    ///
    /// Files that are not images in a format we recognise are rejected.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let bytes = tokio::fs::read(path).await?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let format = image::guess_format(&bytes)
            .or_else(|_| ImageFormat::from_path(path))
            .map_err(|_| {
                TrashSightError::invalid_image(file_name.clone(), "not a recognised image format".to_string())
            })?;

        Ok(Self::new(bytes, mime_for_format(format), file_name))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn mime_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Tga => "image/x-tga",
        ImageFormat::Pnm => "image/x-portable-anymap",
        _ => "application/octet-stream",
    }
}
