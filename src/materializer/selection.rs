use super::blob::ImageBlob;
use super::preview::{InMemoryPreviewStore, PreviewInfo, PreviewRef, PreviewStats, PreviewStore};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{info, warn};

/// Identity of one selection; a new selection always gets a new id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    File,
    Camera,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::File => "file",
            ImageSource::Camera => "camera",
        }
    }
}

/// The image to be classified along with its preview
#[derive(Debug)]
pub struct SelectedImage {
    id: ImageId,
    blob: ImageBlob,
    preview: PreviewRef,
    source: ImageSource,
    selected_at: DateTime<Utc>,
}

impl SelectedImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn blob(&self) -> &ImageBlob {
        &self.blob
    }

    pub fn preview(&self) -> &PreviewRef {
        &self.preview
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }

    pub fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }
}

/// Holds at most one selected image and the preview derived from it
pub struct ImageMaterializer {
    store: Box<dyn PreviewStore>,
    current: Option<SelectedImage>,
    next_id: u64,
    advisory_max_bytes: u64,
}

impl ImageMaterializer {
    pub fn new(advisory_max_bytes: u64) -> Self {
        Self::with_store(Box::new(InMemoryPreviewStore::new()), advisory_max_bytes)
    }

    pub fn with_store(store: Box<dyn PreviewStore>, advisory_max_bytes: u64) -> Self {
        Self {
            store,
            current: None,
            next_id: 0,
            advisory_max_bytes,
        }
    }

    /// Select a user-chosen file, replacing any prior selection
    pub fn select_file(&mut self, blob: ImageBlob) -> ImageId {
        if blob.len() as u64 > self.advisory_max_bytes {
            warn!(
                "{} is {} bytes, above the advised {} bytes; uploading anyway",
                blob.file_name(),
                blob.len(),
                self.advisory_max_bytes
            );
        }
        self.replace(blob, ImageSource::File)
    }

    /// Select a frame captured from the camera, replacing any prior selection
    pub fn select_captured(&mut self, blob: ImageBlob) -> ImageId {
        self.replace(blob, ImageSource::Camera)
    }

    /// Discard the selection and release its preview. Returns whether one existed.
    pub fn clear(&mut self) -> bool {
        match self.current.take() {
            Some(image) => {
                info!("Cleared {}", image.id);
                self.store.release(image.preview);
                true
            }
            None => false,
        }
    }

    fn replace(&mut self, blob: ImageBlob, source: ImageSource) -> ImageId {
        // The old preview goes before the new one exists
        self.clear();

        self.next_id += 1;
        let id = ImageId(self.next_id);
        let preview = self.store.create(&blob);

        info!(
            "Selected {} from {} ({}, {}, {} bytes)",
            id,
            source.as_str(),
            blob.file_name(),
            blob.mime_type(),
            blob.len()
        );

        self.current = Some(SelectedImage {
            id,
            blob,
            preview,
            source,
            selected_at: Utc::now(),
        });

        id
    }

    pub fn current(&self) -> Option<&SelectedImage> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<ImageId> {
        self.current.as_ref().map(|image| image.id)
    }

    pub fn preview_info(&self) -> Option<PreviewInfo> {
        self.current
            .as_ref()
            .and_then(|image| self.store.describe(&image.preview))
    }

    pub fn live_previews(&self) -> usize {
        self.store.live_count()
    }

    pub fn preview_stats(&self) -> PreviewStats {
        self.store.stats()
    }
}

impl Drop for ImageMaterializer {
    fn drop(&mut self) {
        self.clear();
    }
}
