mod builder;
mod device;
mod manager;
mod mock;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod v4l2;

pub use builder::{default_device, CaptureSourceManagerBuilder};
pub use device::{CameraDevice, StreamConstraints, VideoStream};
pub use manager::{CaptureSession, CaptureSourceManager};
pub use mock::{MockBehavior, MockCamera, MockCameraStats};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use v4l2::GstCameraDevice;
