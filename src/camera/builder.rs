use super::device::CameraDevice;
use super::manager::CaptureSourceManager;
use crate::config::CameraConfig;
use crate::error::{Result, TrashSightError};
use std::sync::Arc;

/// Builder for the capture source manager
pub struct CaptureSourceManagerBuilder {
    config: Option<CameraConfig>,
    device: Option<Arc<dyn CameraDevice>>,
}

impl CaptureSourceManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            device: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn device(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn build(self) -> Result<CaptureSourceManager> {
        let config = self
            .config
            .ok_or_else(|| TrashSightError::system("Camera configuration must be specified"))?;

        let device = match self.device {
            Some(device) => device,
            None => default_device(&config),
        };

        Ok(CaptureSourceManager::new(device, &config))
    }
}

impl Default for CaptureSourceManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The platform camera when compiled in, otherwise the synthetic one
#[cfg(all(target_os = "linux", feature = "camera"))]
pub fn default_device(config: &CameraConfig) -> Arc<dyn CameraDevice> {
    Arc::new(super::v4l2::GstCameraDevice::new(config.index))
}

/// The platform camera when compiled in, otherwise the synthetic one
#[cfg(not(all(target_os = "linux", feature = "camera")))]
pub fn default_device(config: &CameraConfig) -> Arc<dyn CameraDevice> {
    tracing::warn!(
        "GStreamer camera support is only available on Linux with the camera feature; \
         using mock camera instead of device {}",
        config.index
    );
    Arc::new(super::mock::MockCamera::healthy())
}
