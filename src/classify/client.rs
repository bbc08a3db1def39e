use super::response::{interpret_response, ClassificationResult};
use crate::config::ServiceConfig;
use crate::error::{ClassifyError, Result};
use crate::materializer::ImageBlob;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Sends one image to the classification service
#[async_trait]
pub trait ClassificationClient: Send + Sync {
    async fn classify(&self, image: &ImageBlob) -> std::result::Result<ClassificationResult, ClassifyError>;
}

/// reqwest-backed client for the remote classification endpoint
pub struct HttpClassificationClient {
    client: reqwest::Client,
    url: String,
    fallback_message: String,
}

impl HttpClassificationClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            fallback_message: config.fallback_error_message.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_form(image: &ImageBlob) -> std::result::Result<Form, ClassifyError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| ClassifyError::TransportFailure {
                details: format!("invalid MIME type {}: {}", image.mime_type(), e),
            })?;

        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

#[async_trait]
impl ClassificationClient for HttpClassificationClient {
    async fn classify(&self, image: &ImageBlob) -> std::result::Result<ClassificationResult, ClassifyError> {
        let form = Self::build_form(image)?;

        info!(
            "Sending {} ({} bytes) to {}",
            image.file_name(),
            image.len(),
            self.url
        );

        let resp = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Classification request failed: {}", e);
                ClassifyError::TransportFailure {
                    details: e.to_string(),
                }
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            warn!("Failed to read classification response: {}", e);
            ClassifyError::TransportFailure {
                details: e.to_string(),
            }
        })?;

        debug!("Response received: {} ({} bytes)", status, body.len());

        interpret_response(status.as_u16(), &body, &self.fallback_message)
    }
}
