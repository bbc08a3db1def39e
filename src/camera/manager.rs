use super::device::{CameraDevice, StreamConstraints, VideoStream};
use crate::config::CameraConfig;
use crate::error::CaptureError;
use crate::materializer::ImageBlob;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// An active camera acquisition holding the device stream exclusively
pub struct CaptureSession {
    stream: Box<dyn VideoStream>,
    device: String,
    started_at: SystemTime,
}

impl CaptureSession {
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn is_ready(&self) -> bool {
        self.stream.is_ready()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

/// Owns the live camera and turns its current frame into a JPEG still
pub struct CaptureSourceManager {
    device: Arc<dyn CameraDevice>,
    constraints: StreamConstraints,
    jpeg_quality: u8,
    capture_file_name: String,
    warmup_frames: u32,
    session: Option<CaptureSession>,
}

impl CaptureSourceManager {
    pub fn new(device: Arc<dyn CameraDevice>, config: &CameraConfig) -> Self {
        Self {
            device,
            constraints: StreamConstraints::from_config(config),
            jpeg_quality: config.jpeg_quality,
            capture_file_name: config.capture_file_name.clone(),
            warmup_frames: config.warmup_frames,
            session: None,
        }
    }

    /// Acquire the camera. A failed acquisition leaves no session behind.
    pub async fn start_camera(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            debug!("Camera already active");
            return Ok(());
        }

        let device = self.device.name();
        info!(
            "Starting camera {} ({}x{}, facing {})",
            device,
            self.constraints.ideal_resolution.0,
            self.constraints.ideal_resolution.1,
            self.constraints.facing_mode.as_str()
        );

        let mut stream = match self.device.open(&self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera {} unavailable: {}", device, e);
                return Err(e);
            }
        };

        for _ in 0..self.warmup_frames {
            if stream.grab_frame().is_err() {
                break;
            }
        }

        self.session = Some(CaptureSession {
            stream,
            device,
            started_at: SystemTime::now(),
        });

        Ok(())
    }

    /// Halt the stream and drop the session; no-op when idle
    pub fn stop_camera(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stream.stop();
            info!("Camera {} stopped", session.device);
        }
    }

    /// Take a still frame, or nothing when no ready session exists.
    ///
    /// The session is left running; on success the caller stops it.
    pub fn capture_frame(&mut self) -> Option<ImageBlob> {
        match self.try_capture_frame() {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!("Frame capture skipped: {}", e);
                None
            }
        }
    }

    pub fn try_capture_frame(&mut self) -> Result<ImageBlob, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NotActive)?;
        if !session.stream.is_ready() {
            return Err(CaptureError::SourceNotReady);
        }

        let frame = session.stream.grab_frame()?;
        let jpeg = frame.encode_jpeg(self.jpeg_quality)?;

        info!(
            "Captured frame {} from {} ({}x{}, {} JPEG bytes)",
            frame.id,
            session.device,
            frame.width,
            frame.height,
            jpeg.len()
        );

        Ok(ImageBlob::jpeg(jpeg, self.capture_file_name.clone()))
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }
}

impl Drop for CaptureSourceManager {
    fn drop(&mut self) {
        self.stop_camera();
    }
}
