mod blob;
mod preview;
mod selection;

pub use blob::{mime_for_format, ImageBlob};
pub use preview::{InMemoryPreviewStore, PreviewId, PreviewInfo, PreviewRef, PreviewStats, PreviewStore};
pub use selection::{ImageId, ImageMaterializer, ImageSource, SelectedImage};
