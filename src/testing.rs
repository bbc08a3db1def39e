//! Scripted collaborators shared by unit tests

use crate::classify::{ClassificationClient, ClassificationResult};
use crate::error::ClassifyError;
use crate::materializer::ImageBlob;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub(crate) type Outcome = Result<ClassificationResult, ClassifyError>;

/// Classification client answering from a queue of scripted replies
#[derive(Default)]
pub(crate) struct ScriptedClient {
    calls: AtomicUsize,
    replies: Mutex<VecDeque<oneshot::Receiver<Outcome>>>,
    uploads: Mutex<Vec<ImageBlob>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply delivered as soon as the call is made
    pub(crate) fn respond_with(&self, outcome: Outcome) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        self.replies.lock().unwrap().push_back(rx);
    }

    /// Queue a reply the test releases later through the returned sender
    pub(crate) fn defer(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn uploads(&self) -> Vec<ImageBlob> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassificationClient for ScriptedClient {
    async fn classify(&self, image: &ImageBlob) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(image.clone());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(ClassifyError::TransportFailure {
                    details: "scripted reply dropped".to_string(),
                })
            }),
            None => Err(ClassifyError::TransportFailure {
                details: "no scripted reply".to_string(),
            }),
        }
    }
}

pub(crate) fn bottle_result() -> ClassificationResult {
    ClassificationResult {
        detected_object: "plastic bottle".to_string(),
        disposal_bin: "yellow".to_string(),
        labeled_image: None,
    }
}

pub(crate) fn jpeg_blob(name: &str) -> ImageBlob {
    let img = image::RgbImage::from_pixel(8, 6, image::Rgb([90, 160, 40]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    ImageBlob::jpeg(out.into_inner(), name)
}
