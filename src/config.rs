use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrashSightConfig {
    pub service: ServiceConfig,
    pub camera: CameraConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Classification endpoint receiving the multipart upload
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u64,

    /// Message shown when the service gives no error text of its own
    #[serde(default = "default_fallback_error_message")]
    pub fallback_error_message: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Ideal camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Which way the requested camera should face
    #[serde(default)]
    pub facing_mode: FacingMode,

    /// JPEG quality for captured frames (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// File name given to captured frames
    #[serde(default = "default_capture_file_name")]
    pub capture_file_name: String,

    /// Frames discarded before the stream counts as ready
    #[serde(default)]
    pub warmup_frames: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    /// Size above which a selected file triggers a warning (never enforced)
    #[serde(default = "default_advisory_max_bytes")]
    pub advisory_max_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OutputConfig {
    /// Directory where labeled images returned by the service are written
    pub labeled_image_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

impl TrashSightConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("trash-sight.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("service.url", default_service_url())?
            .set_default("service.timeout_seconds", default_service_timeout())?
            .set_default(
                "service.fallback_error_message",
                default_fallback_error_message(),
            )?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.facing_mode", FacingMode::default().as_str())?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default("camera.capture_file_name", default_capture_file_name())?
            .set_default("camera.warmup_frames", 0u64)?
            .set_default("upload.advisory_max_bytes", default_advisory_max_bytes())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // Double underscore keeps snake_case keys intact, e.g. TRASHSIGHT_SERVICE__TIMEOUT_SECONDS
            .add_source(
                Environment::with_prefix("TRASHSIGHT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: TrashSightConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Service url must not be empty".to_string(),
            ));
        }

        if self.service.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Service timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.camera.capture_file_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Camera capture_file_name must not be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for TrashSightConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            camera: CameraConfig::default(),
            upload: UploadConfig {
                advisory_max_bytes: default_advisory_max_bytes(),
            },
            output: OutputConfig::default(),
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_seconds: default_service_timeout(),
            fallback_error_message: default_fallback_error_message(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: default_camera_index(),
            resolution: default_camera_resolution(),
            facing_mode: FacingMode::default(),
            jpeg_quality: default_jpeg_quality(),
            capture_file_name: default_capture_file_name(),
            warmup_frames: 0,
        }
    }
}

// Default value functions
fn default_service_url() -> String {
    "https://refathex-trash-sight.hf.space/classify_image".to_string()
}
fn default_service_timeout() -> u64 {
    60
}
fn default_fallback_error_message() -> String {
    "Failed to analyze image. Please try again.".to_string()
}

fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_capture_file_name() -> String {
    "camera-capture.jpg".to_string()
}

fn default_advisory_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_event_bus_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TrashSightConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.camera.resolution, (640, 480));
        assert_eq!(config.camera.facing_mode, FacingMode::Environment);
        assert_eq!(config.camera.jpeg_quality, 90);
        assert_eq!(config.camera.capture_file_name, "camera-capture.jpg");
        assert_eq!(config.upload.advisory_max_bytes, 10 * 1024 * 1024);
        assert!(config.output.labeled_image_dir.is_none());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[service]
url = "http://127.0.0.1:9000/classify_image"
timeout_seconds = 5

[camera]
resolution = [1280, 720]
facing_mode = "user"

[output]
labeled_image_dir = "./labeled"
"#
        )
        .unwrap();

        let config = TrashSightConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.service.url, "http://127.0.0.1:9000/classify_image");
        assert_eq!(config.service.timeout_seconds, 5);
        assert_eq!(
            config.service.fallback_error_message,
            "Failed to analyze image. Please try again."
        );
        assert_eq!(config.camera.resolution, (1280, 720));
        assert_eq!(config.camera.facing_mode, FacingMode::User);
        assert_eq!(config.camera.jpeg_quality, 90);
        assert_eq!(config.output.labeled_image_dir.as_deref(), Some("./labeled"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = TrashSightConfig::load_from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.service.timeout_seconds, 60);
        assert_eq!(config.system.event_bus_capacity, 100);
        assert!(config.output.labeled_image_dir.is_none());
    }

    #[test]
    fn test_file_without_output_table_loads() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[camera]\njpeg_quality = 75").unwrap();

        let config = TrashSightConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.jpeg_quality, 75);
        assert!(config.output.labeled_image_dir.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TrashSightConfig::default();

        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());
        config.camera.resolution = (640, 480);

        config.camera.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.camera.jpeg_quality = 90;

        config.service.url = "  ".to_string();
        assert!(config.validate().is_err());
        config.service.url = default_service_url();

        config.service.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.service.timeout_seconds = 30;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_serializes_to_toml() {
        let rendered = toml::to_string_pretty(&TrashSightConfig::default()).unwrap();
        assert!(rendered.contains("[service]"));
        assert!(rendered.contains("facing_mode = \"environment\""));
    }
}
