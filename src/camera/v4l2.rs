use super::device::{CameraDevice, StreamConstraints, VideoStream};
use crate::error::CaptureError;
use crate::frame::FrameData;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::io::ErrorKind;
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

const STATE_CHANGE_TIMEOUT_SECONDS: u64 = 5;
const PULL_TIMEOUT_MS: u64 = 500;

/// V4L2 camera opened through a GStreamer pipeline
pub struct GstCameraDevice {
    index: u32,
}

impl GstCameraDevice {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    fn device_path(&self) -> String {
        format!("/dev/video{}", self.index)
    }

    /// Build GStreamer pipeline string delivering RGB frames at the ideal size
    fn build_pipeline_string(&self, constraints: &StreamConstraints) -> String {
        let (width, height) = constraints.ideal_resolution;

        format!(
            "v4l2src device={} ! \
             videoconvert ! videoscale ! \
             video/x-raw,format=RGB,width={},height={} ! \
             appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false",
            self.device_path(),
            width,
            height
        )
    }

    /// Distinguish a missing device from one we may not open
    fn check_device(&self) -> Result<(), CaptureError> {
        let path = self.device_path();
        match std::fs::OpenOptions::new().read(true).write(true).open(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(CaptureError::PermissionDenied { device: path })
            }
            Err(e) => Err(CaptureError::DeviceUnavailable {
                details: format!("{}: {}", path, e),
            }),
        }
    }

    fn open_blocking(&self, constraints: &StreamConstraints) -> Result<GstVideoStream, CaptureError> {
        self.check_device()?;

        gstreamer::init().map_err(|e| CaptureError::DeviceUnavailable {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        let pipeline_desc = self.build_pipeline_string(constraints);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CaptureError::DeviceUnavailable {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CaptureError::DeviceUnavailable {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CaptureError::DeviceUnavailable {
                details: "Failed to get appsink".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CaptureError::DeviceUnavailable {
                details: "Failed to downcast to AppSink".to_string(),
            })?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(CaptureError::DeviceUnavailable {
                details: format!("Failed to start pipeline: {}", e),
            });
        }

        let (result, _, _) = pipeline.state(gstreamer::ClockTime::from_seconds(
            STATE_CHANGE_TIMEOUT_SECONDS,
        ));
        if let Err(e) = result {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(CaptureError::DeviceUnavailable {
                details: format!("Pipeline did not reach PLAYING: {}", e),
            });
        }

        info!(
            "GStreamer camera {} streaming (facing {} requested)",
            self.device_path(),
            constraints.facing_mode.as_str()
        );

        Ok(GstVideoStream {
            pipeline,
            appsink,
            frame_counter: 0,
            stopped: false,
        })
    }
}

#[async_trait]
impl CameraDevice for GstCameraDevice {
    fn name(&self) -> String {
        self.device_path()
    }

    async fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn VideoStream>, CaptureError> {
        let device = GstCameraDevice::new(self.index);
        let constraints = constraints.clone();

        let stream = tokio::task::spawn_blocking(move || device.open_blocking(&constraints))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable {
                details: format!("Camera open task failed: {}", e),
            })??;

        Ok(Box::new(stream))
    }
}

struct GstVideoStream {
    pipeline: Pipeline,
    appsink: AppSink,
    frame_counter: u64,
    stopped: bool,
}

impl VideoStream for GstVideoStream {
    fn is_ready(&self) -> bool {
        !self.stopped && self.pipeline.current_state() == gstreamer::State::Playing
    }

    fn grab_frame(&mut self) -> Result<FrameData, CaptureError> {
        if !self.is_ready() {
            return Err(CaptureError::SourceNotReady);
        }

        let sample = self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_mseconds(PULL_TIMEOUT_MS))
            .ok_or(CaptureError::SourceNotReady)?;

        let buffer = sample.buffer().ok_or_else(|| CaptureError::RasterUnavailable {
            details: "No buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CaptureError::RasterUnavailable {
            details: "No caps in sample".to_string(),
        })?;
        let video_info =
            VideoInfo::from_caps(caps).map_err(|e| CaptureError::RasterUnavailable {
                details: format!("Failed to get video info: {}", e),
            })?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0].max(0) as usize;

        let map = buffer
            .map_readable()
            .map_err(|e| CaptureError::RasterUnavailable {
                details: format!("Failed to map buffer: {}", e),
            })?;

        let frame = FrameData::from_strided(
            self.frame_counter,
            SystemTime::now(),
            map.as_slice(),
            width,
            height,
            stride,
        )?;
        self.frame_counter += 1;
        trace!("Pulled RGB frame {} ({}x{})", frame.id, width, height);

        Ok(frame)
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop GStreamer pipeline: {}", e);
        }
        debug!("GStreamer camera stream stopped");
    }
}
