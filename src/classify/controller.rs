use super::client::ClassificationClient;
use super::response::ClassificationResult;
use crate::error::ClassifyError;
use crate::materializer::{ImageId, SelectedImage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Tags a request with the selection it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub request_id: u64,
    pub image_id: ImageId,
}

/// A failed request as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationFailure {
    pub error: ClassifyError,
    pub message: String,
}

/// The single classification slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Pending(RequestTicket),
    Succeeded(ClassificationResult),
    Failed(ClassificationFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestState::Idle => RequestStatus::Idle,
            RequestState::Pending(_) => RequestStatus::Pending,
            RequestState::Succeeded(_) => RequestStatus::Succeeded,
            RequestState::Failed(_) => RequestStatus::Failed,
        }
    }
}

/// A finished network call on its way back to the controller
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub outcome: Result<ClassificationResult, ClassifyError>,
}

/// Owns the classification slot and the one request that may fill it
pub struct ClassificationController {
    client: Arc<dyn ClassificationClient>,
    state: RequestState,
    fallback_message: String,
    next_request_id: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl ClassificationController {
    pub fn new(client: Arc<dyn ClassificationClient>, fallback_message: impl Into<String>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            client,
            state: RequestState::Idle,
            fallback_message: fallback_message.into(),
            next_request_id: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// Claim the slot for `image`, or say why not
    pub fn begin(&mut self, image: Option<ImageId>) -> Result<RequestTicket, ClassifyError> {
        let image_id = image.ok_or(ClassifyError::NoImageSelected)?;
        if let RequestState::Pending(ticket) = &self.state {
            debug!(
                "Request {} still pending; ignoring submit",
                ticket.request_id
            );
            return Err(ClassifyError::RequestInFlight);
        }

        self.next_request_id += 1;
        let ticket = RequestTicket {
            request_id: self.next_request_id,
            image_id,
        };
        self.state = RequestState::Pending(ticket);

        Ok(ticket)
    }

    /// Claim the slot and issue the network call in the background.
    ///
    /// Its result arrives through [`next_completion`](Self::next_completion).
    pub fn submit(&mut self, image: Option<&SelectedImage>) -> Result<RequestTicket, ClassifyError> {
        let image = image.ok_or(ClassifyError::NoImageSelected)?;
        let ticket = self.begin(Some(image.id()))?;

        let client = Arc::clone(&self.client);
        let blob = image.blob().clone();
        let completions = self.completions_tx.clone();

        info!(
            "Classification request {} issued for {}",
            ticket.request_id, ticket.image_id
        );

        tokio::spawn(async move {
            let outcome = client.classify(&blob).await;
            if completions.send(Completion { ticket, outcome }).is_err() {
                debug!("Controller gone; dropping response to request {}", ticket.request_id);
            }
        });

        Ok(ticket)
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Apply a finished request if it still belongs to the current selection
    pub fn complete(
        &mut self,
        completion: Completion,
        current_image: Option<ImageId>,
    ) -> Result<RequestStatus, ClassifyError> {
        let Completion { ticket, outcome } = completion;

        let owns_slot = self.state == RequestState::Pending(ticket);
        if !owns_slot || current_image != Some(ticket.image_id) {
            debug!(
                "Discarding stale response to request {} for {}",
                ticket.request_id, ticket.image_id
            );
            return Err(ClassifyError::StaleResponse {
                request_id: ticket.request_id,
            });
        }

        self.state = match outcome {
            Ok(result) => {
                info!(
                    "Request {} classified as {} ({})",
                    ticket.request_id, result.detected_object, result.disposal_bin
                );
                RequestState::Succeeded(result)
            }
            Err(error) => {
                let message = match &error {
                    ClassifyError::ServiceError { message, .. } => message.clone(),
                    _ => self.fallback_message.clone(),
                };
                warn!("Request {} failed: {}", ticket.request_id, error);
                RequestState::Failed(ClassificationFailure { error, message })
            }
        };

        Ok(self.state.status())
    }

    /// Forget any result, error, or pending request
    pub fn reset(&mut self) {
        if let RequestState::Pending(ticket) = &self.state {
            debug!(
                "Request {} orphaned; its response will be discarded",
                ticket.request_id
            );
        }
        self.state = RequestState::Idle;
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn status(&self) -> RequestStatus {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending(_))
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match &self.state {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ClassificationFailure> {
        match &self.state {
            RequestState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }
}
