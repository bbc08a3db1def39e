use super::device::{CameraDevice, StreamConstraints, VideoStream};
use crate::error::CaptureError;
use crate::frame::FrameData;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, trace};

/// How the mock camera behaves when opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Streams gradient frames
    Healthy,
    /// Refuses access as if the user declined the permission prompt
    PermissionDenied,
    /// Reports that no device exists
    NoDevice,
    /// Opens but never becomes ready
    NeverReady,
    /// Opens but delivers frames too short for their dimensions
    CorruptFrames,
}

/// Counters shared between a mock camera and the streams it opens
#[derive(Debug, Default)]
pub struct MockCameraStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
}

impl MockCameraStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped
    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.stopped())
    }
}

/// Synthetic camera for tests and machines without capture hardware
pub struct MockCamera {
    behavior: MockBehavior,
    resolution: Option<(u32, u32)>,
    stats: Arc<MockCameraStats>,
}

impl MockCamera {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            resolution: None,
            stats: Arc::new(MockCameraStats::default()),
        }
    }

    pub fn healthy() -> Self {
        Self::new(MockBehavior::Healthy)
    }

    /// Deliver frames at this resolution regardless of the requested one
    pub fn with_native_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    pub fn stats(&self) -> Arc<MockCameraStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    fn name(&self) -> String {
        "mock-camera".to_string()
    }

    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError> {
        match self.behavior {
            MockBehavior::PermissionDenied => {
                return Err(CaptureError::PermissionDenied {
                    device: self.name(),
                })
            }
            MockBehavior::NoDevice => {
                return Err(CaptureError::DeviceUnavailable {
                    details: "no mock device attached".to_string(),
                })
            }
            _ => {}
        }

        let (width, height) = self.resolution.unwrap_or(constraints.ideal_resolution);
        info!(
            "Mock camera opened ({}x{}, facing {})",
            width,
            height,
            constraints.facing_mode.as_str()
        );
        self.stats.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockVideoStream {
            width,
            height,
            frame_counter: 0,
            ready: self.behavior != MockBehavior::NeverReady,
            corrupt: self.behavior == MockBehavior::CorruptFrames,
            stopped: false,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockVideoStream {
    width: u32,
    height: u32,
    frame_counter: u64,
    ready: bool,
    corrupt: bool,
    stopped: bool,
    stats: Arc<MockCameraStats>,
}

impl MockVideoStream {
    /// Diagonal gradient that shifts a little with every frame
    fn gradient(&self) -> Vec<u8> {
        let (width, height) = (self.width.max(1), self.height.max(1));
        let shift = (self.frame_counter % 256) as u32;
        let mut data = Vec::with_capacity((width * height * 3) as usize);

        for y in 0..height {
            for x in 0..width {
                data.push(((x * 255) / width) as u8);
                data.push(((y * 255) / height) as u8);
                data.push((((x + y) * 255) / (width + height) + shift) as u8);
            }
        }

        data
    }
}

impl VideoStream for MockVideoStream {
    fn is_ready(&self) -> bool {
        self.ready && !self.stopped
    }

    fn grab_frame(&mut self) -> Result<FrameData, CaptureError> {
        if !self.is_ready() {
            return Err(CaptureError::SourceNotReady);
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        let mut data = self.gradient();
        if self.corrupt {
            data.truncate(data.len() / 2);
        }

        trace!(
            "Generated mock frame {} ({}x{}, {} bytes)",
            frame_id,
            self.width,
            self.height,
            data.len()
        );

        Ok(FrameData::new(
            frame_id,
            SystemTime::now(),
            data,
            self.width,
            self.height,
        ))
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.stats.stopped.fetch_add(1, Ordering::SeqCst);
        debug!("Mock camera stream stopped");
    }
}
