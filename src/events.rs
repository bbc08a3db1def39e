use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Actions a user can request from the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserCommand {
    OpenFile(PathBuf),
    StartCamera,
    CaptureFrame,
    StopCamera,
    Analyze,
    Clear,
    Quit,
}

/// Events that can occur in a classification session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The user asked for something
    Command {
        command: UserCommand,
        timestamp: SystemTime,
    },
    /// The user is typing a file path; `None` when the prompt closes
    PathEntry { buffer: Option<String> },
    /// Camera stream acquired
    CameraStarted { device: String },
    /// Camera stream released
    CameraStopped,
    /// Camera could not be acquired
    CaptureUnavailable { reason: String },
    /// A new image replaced any previous one
    ImageSelected { image_id: u64, source: String },
    /// The selected image was discarded
    ImageCleared,
    /// A classification request went out
    ClassificationStarted { request_id: u64, image_id: u64 },
    /// The service classified the image
    ClassificationSucceeded {
        request_id: u64,
        detected_object: String,
        disposal_bin: String,
    },
    /// The request failed
    ClassificationFailed { request_id: u64, message: String },
    /// A response arrived for an image that is no longer selected
    StaleResponseDiscarded { request_id: u64 },
    /// Shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl SessionEvent {
    pub fn command(command: UserCommand) -> Self {
        SessionEvent::Command {
            command,
            timestamp: SystemTime::now(),
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::Command { command, .. } => format!("Command: {:?}", command),
            SessionEvent::PathEntry { buffer } => match buffer {
                Some(buffer) => format!("Path entry: {}", buffer),
                None => "Path entry closed".to_string(),
            },
            SessionEvent::CameraStarted { device } => format!("Camera {} started", device),
            SessionEvent::CameraStopped => "Camera stopped".to_string(),
            SessionEvent::CaptureUnavailable { reason } => {
                format!("Camera unavailable: {}", reason)
            }
            SessionEvent::ImageSelected { image_id, source } => {
                format!("Image {} selected from {}", image_id, source)
            }
            SessionEvent::ImageCleared => "Image cleared".to_string(),
            SessionEvent::ClassificationStarted {
                request_id,
                image_id,
            } => format!("Request {} started for image {}", request_id, image_id),
            SessionEvent::ClassificationSucceeded {
                request_id,
                detected_object,
                disposal_bin,
            } => format!(
                "Request {} classified {} into {}",
                request_id, detected_object, disposal_bin
            ),
            SessionEvent::ClassificationFailed {
                request_id,
                message,
            } => format!("Request {} failed: {}", request_id, message),
            SessionEvent::StaleResponseDiscarded { request_id } => {
                format!("Stale response to request {} discarded", request_id)
            }
            SessionEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Command { .. } => "command",
            SessionEvent::PathEntry { .. } => "path_entry",
            SessionEvent::CameraStarted { .. } => "camera_started",
            SessionEvent::CameraStopped => "camera_stopped",
            SessionEvent::CaptureUnavailable { .. } => "capture_unavailable",
            SessionEvent::ImageSelected { .. } => "image_selected",
            SessionEvent::ImageCleared => "image_cleared",
            SessionEvent::ClassificationStarted { .. } => "classification_started",
            SessionEvent::ClassificationSucceeded { .. } => "classification_succeeded",
            SessionEvent::ClassificationFailed { .. } => "classification_failed",
            SessionEvent::StaleResponseDiscarded { .. } => "stale_response_discarded",
            SessionEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: SessionEvent) -> usize {
        trace!("Publishing event: {}", event.description());
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers for {} event", event.event_type());
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(SessionEvent::command(UserCommand::Analyze)), 1);

        match receiver.recv().await.unwrap() {
            SessionEvent::Command { command, .. } => assert_eq!(command, UserCommand::Analyze),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(SessionEvent::ImageCleared), 0);
    }

    #[test]
    fn test_event_type_and_description() {
        let event = SessionEvent::ClassificationSucceeded {
            request_id: 4,
            detected_object: "plastic bottle".to_string(),
            disposal_bin: "yellow".to_string(),
        };

        assert_eq!(event.event_type(), "classification_succeeded");
        assert_eq!(
            event.description(),
            "Request 4 classified plastic bottle into yellow"
        );
        assert_eq!(
            SessionEvent::StaleResponseDiscarded { request_id: 2 }.event_type(),
            "stale_response_discarded"
        );
    }
}
