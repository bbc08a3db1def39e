use crate::camera::CaptureSourceManager;
use crate::classify::{
    ClassificationController, Completion, LabeledImage, RequestState, RequestStatus,
    RequestTicket,
};
use crate::error::{CaptureError, ClassifyError, Result};
use crate::events::{EventBus, SessionEvent};
use crate::materializer::{ImageBlob, ImageId, ImageMaterializer, ImageSource};
use crate::view::{derive_view, ViewState};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One user's acquisition and classification pipeline.
///
/// Owns the camera manager, the image materializer and the request
/// controller, and is the only place that moves data between them.
pub struct Session {
    camera: CaptureSourceManager,
    images: ImageMaterializer,
    classifier: ClassificationController,
    events: Arc<EventBus>,
    capture_notice: Option<CaptureError>,
    labeled_image_dir: Option<PathBuf>,
    last_labeled_export: Option<PathBuf>,
}

impl Session {
    pub fn new(
        camera: CaptureSourceManager,
        images: ImageMaterializer,
        classifier: ClassificationController,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            camera,
            images,
            classifier,
            events,
            capture_notice: None,
            labeled_image_dir: None,
            last_labeled_export: None,
        }
    }

    pub fn with_labeled_image_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.labeled_image_dir = dir;
        self
    }

    /// Acquire the camera; a failure is kept as a notice for the source controls
    pub async fn start_camera(&mut self) -> std::result::Result<(), CaptureError> {
        match self.camera.start_camera().await {
            Ok(()) => {
                self.capture_notice = None;
                let device = self
                    .camera
                    .session()
                    .map(|session| session.device().to_string())
                    .unwrap_or_default();
                self.events.publish(SessionEvent::CameraStarted { device });
                Ok(())
            }
            Err(e) => {
                self.events.publish(SessionEvent::CaptureUnavailable {
                    reason: e.to_string(),
                });
                self.capture_notice = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn stop_camera(&mut self) {
        if self.camera.is_active() {
            self.camera.stop_camera();
            self.events.publish(SessionEvent::CameraStopped);
        }
    }

    /// Take a still from the live camera and make it the selected image.
    ///
    /// Nothing changes when no frame is available; the camera keeps running.
    pub fn capture_frame(&mut self) -> Option<ImageId> {
        let blob = self.camera.capture_frame()?;
        self.stop_camera();
        Some(self.select(blob, ImageSource::Camera))
    }

    /// Select an already materialized image file
    pub fn select_file(&mut self, blob: ImageBlob) -> ImageId {
        self.select(blob, ImageSource::File)
    }

    /// Read, sniff and select an image file. A rejected file leaves the selection as it was.
    pub async fn open_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ImageId> {
        let blob = ImageBlob::from_path(path).await?;
        Ok(self.select_file(blob))
    }

    fn select(&mut self, blob: ImageBlob, source: ImageSource) -> ImageId {
        let id = match source {
            ImageSource::File => self.images.select_file(blob),
            ImageSource::Camera => self.images.select_captured(blob),
        };
        self.classifier.reset();
        self.capture_notice = None;
        self.last_labeled_export = None;

        self.events.publish(SessionEvent::ImageSelected {
            image_id: id.0,
            source: source.as_str().to_string(),
        });
        id
    }

    /// Drop the selected image along with any result, error or pending request
    pub fn clear(&mut self) {
        let had_image = self.images.clear();
        self.classifier.reset();
        self.last_labeled_export = None;

        if had_image {
            self.events.publish(SessionEvent::ImageCleared);
        }
    }

    /// Send the selected image for classification
    pub fn submit(&mut self) -> std::result::Result<RequestTicket, ClassifyError> {
        match self.classifier.submit(self.images.current()) {
            Ok(ticket) => {
                self.events.publish(SessionEvent::ClassificationStarted {
                    request_id: ticket.request_id,
                    image_id: ticket.image_id.0,
                });
                Ok(ticket)
            }
            Err(e) => {
                debug!("Analyze ignored: {}", e);
                Err(e)
            }
        }
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.classifier.next_completion().await
    }

    /// Fold a finished request into the session. Stale responses are dropped.
    pub async fn apply_completion(&mut self, completion: Completion) -> Option<RequestStatus> {
        let request_id = completion.ticket.request_id;

        let status = match self.classifier.complete(completion, self.images.current_id()) {
            Ok(status) => status,
            Err(e) => {
                info!("{}", e);
                self.events
                    .publish(SessionEvent::StaleResponseDiscarded { request_id });
                return None;
            }
        };

        let event = match self.classifier.state() {
            RequestState::Succeeded(result) => Some(SessionEvent::ClassificationSucceeded {
                request_id,
                detected_object: result.detected_object.clone(),
                disposal_bin: result.disposal_bin.clone(),
            }),
            RequestState::Failed(failure) => Some(SessionEvent::ClassificationFailed {
                request_id,
                message: failure.message.clone(),
            }),
            RequestState::Idle | RequestState::Pending(_) => None,
        };
        if let Some(event) = event {
            self.events.publish(event);
        }

        if status == RequestStatus::Succeeded {
            self.export_labeled_image().await;
        }

        Some(status)
    }

    /// Submit and wait for this request's own completion
    pub async fn submit_and_wait(&mut self) -> std::result::Result<RequestStatus, ClassifyError> {
        let ticket = self.submit()?;

        loop {
            let completion =
                self.next_completion()
                    .await
                    .ok_or_else(|| ClassifyError::TransportFailure {
                        details: "completion channel closed".to_string(),
                    })?;

            let ours = completion.ticket == ticket;
            let status = self.apply_completion(completion).await;
            if ours {
                return status.ok_or(ClassifyError::StaleResponse {
                    request_id: ticket.request_id,
                });
            }
        }
    }

    async fn export_labeled_image(&mut self) {
        let Some(dir) = self.labeled_image_dir.as_ref() else {
            return;
        };
        let Some(uri) = self
            .classifier
            .result()
            .and_then(|result| result.labeled_image.as_deref())
        else {
            return;
        };
        let Some(image) = LabeledImage::from_data_uri(uri) else {
            warn!("Labeled image is not a base64 data URI; not saved");
            return;
        };

        match image.save_in(dir, Utc::now()).await {
            Ok(path) => self.last_labeled_export = Some(path),
            Err(e) => warn!("Failed to save labeled image in {}: {}", dir.display(), e),
        }
    }

    pub fn view(&self) -> ViewState {
        derive_view(
            self.camera.is_active(),
            self.images.preview_info(),
            self.classifier.state(),
            self.capture_notice.as_ref(),
        )
    }

    /// Release the camera and the preview
    pub fn shutdown(&mut self, reason: &str) {
        info!("Shutting down session: {}", reason);
        self.events.publish(SessionEvent::ShutdownRequested {
            timestamp: std::time::SystemTime::now(),
            reason: reason.to_string(),
        });

        self.stop_camera();
        self.clear();
    }

    pub fn camera(&self) -> &CaptureSourceManager {
        &self.camera
    }

    pub fn images(&self) -> &ImageMaterializer {
        &self.images
    }

    pub fn classifier(&self) -> &ClassificationController {
        &self.classifier
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn capture_notice(&self) -> Option<&CaptureError> {
        self.capture_notice.as_ref()
    }

    pub fn last_labeled_export(&self) -> Option<&Path> {
        self.last_labeled_export.as_deref()
    }
}
