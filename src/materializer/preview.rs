use super::blob::ImageBlob;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(pub u64);

/// Display-only handle derived from an image payload.
///
/// Deliberately neither `Clone` nor `Copy`: handing it to
/// [`PreviewStore::release`] consumes it, so it can be released once only.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewRef {
    id: PreviewId,
}

impl PreviewRef {
    pub fn new(id: PreviewId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }
}

/// What the presentation layer needs to show a preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInfo {
    pub id: PreviewId,
    pub file_name: String,
    pub mime_type: String,
    pub byte_len: usize,
    pub dimensions: Option<(u32, u32)>,
}

/// Owner of live preview resources
pub trait PreviewStore: Send {
    fn create(&mut self, blob: &ImageBlob) -> PreviewRef;

    fn release(&mut self, preview: PreviewRef);

    fn describe(&self, preview: &PreviewRef) -> Option<PreviewInfo>;

    fn live_count(&self) -> usize;

    fn stats(&self) -> PreviewStats;
}

/// Lifetime counters for previews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub created: u64,
    pub released: u64,
}

/// Keeps preview metadata in memory, decoding only the image header
#[derive(Debug, Default)]
pub struct InMemoryPreviewStore {
    next_id: u64,
    live: HashMap<PreviewId, PreviewInfo>,
    stats: PreviewStats,
}

impl InMemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewStore for InMemoryPreviewStore {
    fn create(&mut self, blob: &ImageBlob) -> PreviewRef {
        self.next_id += 1;
        let id = PreviewId(self.next_id);

        let dimensions = image::io::Reader::new(Cursor::new(blob.bytes().as_ref()))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        self.live.insert(
            id,
            PreviewInfo {
                id,
                file_name: blob.file_name().to_string(),
                mime_type: blob.mime_type().to_string(),
                byte_len: blob.len(),
                dimensions,
            },
        );
        self.stats.created += 1;
        debug!("Created preview {:?} for {}", id, blob.file_name());

        PreviewRef::new(id)
    }

    fn release(&mut self, preview: PreviewRef) {
        if self.live.remove(&preview.id).is_some() {
            self.stats.released += 1;
            debug!("Released preview {:?}", preview.id);
        } else {
            warn!("Release of unknown preview {:?}", preview.id);
        }
    }

    fn describe(&self, preview: &PreviewRef) -> Option<PreviewInfo> {
        self.live.get(&preview.id).cloned()
    }

    fn live_count(&self) -> usize {
        self.live.len()
    }

    fn stats(&self) -> PreviewStats {
        self.stats
    }
}
