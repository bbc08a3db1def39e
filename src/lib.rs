pub mod camera;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod materializer;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use camera::{
    CameraDevice, CaptureSession, CaptureSourceManager, CaptureSourceManagerBuilder, MockBehavior,
    MockCamera, StreamConstraints, VideoStream,
};
pub use classify::{
    BinKind, ClassificationClient, ClassificationController, ClassificationResult,
    HttpClassificationClient, LabeledImage, RequestState, RequestStatus, RequestTicket,
};
pub use config::TrashSightConfig;
pub use error::{CaptureError, ClassifyError, Result, TrashSightError};
pub use events::{EventBus, SessionEvent, UserCommand};
pub use frame::{FrameData, BYTES_PER_PIXEL};
pub use materializer::{ImageBlob, ImageId, ImageMaterializer, PreviewInfo, SelectedImage};
pub use session::{KeyboardInputHandler, Session, SessionBuilder, ShutdownReason, TerminalRenderer};
pub use view::{derive_view, ViewMode, ViewState};
