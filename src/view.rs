use crate::classify::{ClassificationResult, RequestState};
use crate::error::CaptureError;
use crate::materializer::PreviewInfo;

/// What the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Source-selection controls
    NoImage,
    /// Live preview with capture/cancel controls
    CameraActive,
    /// Preview with clear/analyze controls
    ImageReady,
    /// Analyze disabled, pending indicator
    Loading,
    /// Result fields under the preview
    ResultReady,
    /// Error message under the preview
    ErrorState,
}

/// Everything a renderer needs, derived from the session's components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    /// Kept in Loading, ResultReady and ErrorState too
    pub preview: Option<PreviewInfo>,
    pub result: Option<ClassificationResult>,
    pub error: Option<String>,
    /// Why the camera could not be started; shown in every mode but CameraActive
    pub capture_notice: Option<String>,
}

impl ViewState {
    pub fn analyze_enabled(&self) -> bool {
        self.preview.is_some() && self.mode != ViewMode::Loading
    }

    pub fn shows_labeled_image(&self) -> bool {
        self.result
            .as_ref()
            .map(|result| result.labeled_image.is_some())
            .unwrap_or(false)
    }
}

/// Derive the single view mode from camera, selection and request state
pub fn derive_view(
    camera_active: bool,
    preview: Option<PreviewInfo>,
    request: &RequestState,
    capture_notice: Option<&CaptureError>,
) -> ViewState {
    if camera_active {
        return ViewState {
            mode: ViewMode::CameraActive,
            preview: None,
            result: None,
            error: None,
            capture_notice: None,
        };
    }

    let capture_notice = capture_notice.map(|e| e.to_string());

    let Some(preview) = preview else {
        return ViewState {
            mode: ViewMode::NoImage,
            preview: None,
            result: None,
            error: None,
            capture_notice,
        };
    };

    let (mode, result, error) = match request {
        RequestState::Idle => (ViewMode::ImageReady, None, None),
        RequestState::Pending(_) => (ViewMode::Loading, None, None),
        RequestState::Succeeded(result) => (ViewMode::ResultReady, Some(result.clone()), None),
        RequestState::Failed(failure) => (ViewMode::ErrorState, None, Some(failure.message.clone())),
    };

    ViewState {
        mode,
        preview: Some(preview),
        result,
        error,
        capture_notice,
    }
}
