use crate::error::CaptureError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

/// Frames are packed RGB24
pub const BYTES_PER_PIXEL: usize = 3;

/// A single frame grabbed from a live stream
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Frame sequence number within its stream
    pub id: u64,
    /// Timestamp when frame was grabbed
    pub timestamp: SystemTime,
    /// Packed RGB24 pixels, row-major
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl FrameData {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
        }
    }

    /// Pack rows that may carry padding out to `stride` bytes
    pub fn from_strided(
        id: u64,
        timestamp: SystemTime,
        buffer: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, CaptureError> {
        let row_len = width as usize * BYTES_PER_PIXEL;
        if row_len == 0 || height == 0 {
            return Err(CaptureError::RasterUnavailable {
                details: format!("frame {} reports an empty {}x{} raster", id, width, height),
            });
        }

        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in buffer.chunks(stride.max(row_len)).take(height as usize) {
            if row.len() < row_len {
                warn!("Short row in camera buffer ({} < {})", row.len(), row_len);
                break;
            }
            data.extend_from_slice(&row[..row_len]);
        }

        Ok(Self::new(id, timestamp, data, width, height))
    }

    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    /// Draw the frame into an RGB raster at its native dimensions
    pub fn to_raster(&self) -> Result<RgbImage, CaptureError> {
        if self.width == 0 || self.height == 0 || !self.validate_size() {
            return Err(CaptureError::RasterUnavailable {
                details: format!(
                    "frame {} has {} bytes for {}x{}",
                    self.id,
                    self.data.len(),
                    self.width,
                    self.height
                ),
            });
        }

        RgbImage::from_raw(self.width, self.height, self.data.to_vec()).ok_or_else(|| {
            CaptureError::RasterUnavailable {
                details: format!("frame {} does not fit its raster", self.id),
            }
        })
    }

    /// Encode the frame as a JPEG still at the given quality
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let raster = self.to_raster()?;

        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder
            .encode_image(&raster)
            .map_err(|e| CaptureError::Encoding {
                details: e.to_string(),
            })?;

        Ok(buf)
    }
}
