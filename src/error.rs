use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrashSightError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Invalid image {name}: {details}")]
    InvalidImage { name: String, details: String },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl TrashSightError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn invalid_image<S: Into<String>>(name: S, details: S) -> Self {
        Self::InvalidImage {
            name: name.into(),
            details: details.into(),
        }
    }
}

/// Camera acquisition and frame capture failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission denied for {device}")]
    PermissionDenied { device: String },

    #[error("Camera device unavailable: {details}")]
    DeviceUnavailable { details: String },

    #[error("No active capture session")]
    NotActive,

    #[error("Video source not ready")]
    SourceNotReady,

    #[error("Raster buffer unavailable: {details}")]
    RasterUnavailable { details: String },

    #[error("JPEG encoding failed: {details}")]
    Encoding { details: String },
}

impl CaptureError {
    /// Errors that mean the camera could not be acquired at all
    pub fn is_capture_unavailable(&self) -> bool {
        matches!(
            self,
            CaptureError::PermissionDenied { .. } | CaptureError::DeviceUnavailable { .. }
        )
    }
}

/// Outcomes of the classification request cycle that are not a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("No image selected")]
    NoImageSelected,

    #[error("A classification request is already in flight")]
    RequestInFlight,

    #[error("Transport failure: {details}")]
    TransportFailure { details: String },

    #[error("Service error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    ServiceError {
        status: Option<u16>,
        message: String,
    },

    #[error("Stale response for request {request_id}")]
    StaleResponse { request_id: u64 },
}

pub type Result<T> = std::result::Result<T, TrashSightError>;
