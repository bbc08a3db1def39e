use crate::config::{CameraConfig, FacingMode};
use crate::error::CaptureError;
use crate::frame::FrameData;
use async_trait::async_trait;

/// What a caller asks of a camera when opening a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
    /// Ideal (width, height); devices may deliver something else
    pub ideal_resolution: (u32, u32),
}

impl StreamConstraints {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            facing_mode: config.facing_mode,
            ideal_resolution: config.resolution,
        }
    }
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_resolution: (640, 480),
        }
    }
}

/// A source of live video streams.
///
/// Opening may suspend while the device is acquired. Permission and
/// availability problems come back as [`CaptureError::PermissionDenied`] or
/// [`CaptureError::DeviceUnavailable`] and never leave a stream behind.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Human readable device name used in logs
    fn name(&self) -> String;

    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// An open stream owning the underlying device tracks.
///
/// `stop` must be idempotent: the owning session calls it on explicit stop
/// and again when it is dropped.
pub trait VideoStream: Send {
    /// Whether the stream is delivering frames
    fn is_ready(&self) -> bool;

    /// Pull the most recent frame at the stream's native dimensions
    fn grab_frame(&mut self) -> Result<FrameData, CaptureError>;

    /// Halt all tracks and release the device
    fn stop(&mut self);
}
