use super::pipeline::Session;
use crate::camera::{CameraDevice, CaptureSourceManagerBuilder};
use crate::classify::{ClassificationClient, ClassificationController, HttpClassificationClient};
use crate::config::TrashSightConfig;
use crate::error::{Result, TrashSightError};
use crate::events::EventBus;
use crate::materializer::ImageMaterializer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Builder wiring a session from configuration, with overridable collaborators
pub struct SessionBuilder {
    config: Option<TrashSightConfig>,
    device: Option<Arc<dyn CameraDevice>>,
    client: Option<Arc<dyn ClassificationClient>>,
    event_bus: Option<Arc<EventBus>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            device: None,
            client: None,
            event_bus: None,
        }
    }

    pub fn config(mut self, config: TrashSightConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn device(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn client(mut self, client: Arc<dyn ClassificationClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<Session> {
        let config = self
            .config
            .ok_or_else(|| TrashSightError::system("Session configuration must be specified"))?;

        let mut camera = CaptureSourceManagerBuilder::new().config(config.camera.clone());
        if let Some(device) = self.device {
            camera = camera.device(device);
        }
        let camera = camera.build()?;

        let client = match self.client {
            Some(client) => client,
            None => {
                let client = HttpClassificationClient::new(&config.service)?;
                info!("Classification service: {}", client.url());
                Arc::new(client)
            }
        };

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(EventBus::new(config.system.event_bus_capacity)));

        let session = Session::new(
            camera,
            ImageMaterializer::new(config.upload.advisory_max_bytes),
            ClassificationController::new(client, config.service.fallback_error_message.clone()),
            event_bus,
        )
        .with_labeled_image_dir(config.output.labeled_image_dir.as_ref().map(PathBuf::from));

        Ok(session)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// A session talking to the configured service through the platform camera
    pub fn from_config(config: TrashSightConfig) -> Result<Session> {
        SessionBuilder::new().config(config).build()
    }
}
