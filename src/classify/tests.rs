use super::*;
use crate::error::ClassifyError;
use crate::materializer::{ImageId, ImageMaterializer};
use crate::testing::{bottle_result, jpeg_blob, ScriptedClient};
use std::sync::Arc;

const FALLBACK: &str = "Failed to analyze image. Please try again.";

fn controller_with(client: &Arc<ScriptedClient>) -> ClassificationController {
    ClassificationController::new(Arc::clone(client) as Arc<dyn ClassificationClient>, FALLBACK)
}

#[test]
fn test_begin_without_image_is_rejected() {
    let mut controller = controller_with(&ScriptedClient::new());

    assert_eq!(controller.begin(None), Err(ClassifyError::NoImageSelected));
    assert_eq!(controller.status(), RequestStatus::Idle);
}

#[test]
fn test_begin_while_pending_is_rejected() {
    let mut controller = controller_with(&ScriptedClient::new());

    let first = controller.begin(Some(ImageId(1))).unwrap();
    assert_eq!(controller.state(), &RequestState::Pending(first));

    assert_eq!(
        controller.begin(Some(ImageId(1))),
        Err(ClassifyError::RequestInFlight)
    );
    assert_eq!(controller.state(), &RequestState::Pending(first));
}

#[test]
fn test_complete_success() {
    let mut controller = controller_with(&ScriptedClient::new());
    let ticket = controller.begin(Some(ImageId(3))).unwrap();

    let status = controller
        .complete(
            Completion {
                ticket,
                outcome: Ok(bottle_result()),
            },
            Some(ImageId(3)),
        )
        .unwrap();

    assert_eq!(status, RequestStatus::Succeeded);
    assert_eq!(controller.result(), Some(&bottle_result()));
    assert!(controller.failure().is_none());
}

#[test]
fn test_transport_failure_uses_fallback_message() {
    let mut controller = controller_with(&ScriptedClient::new());
    let ticket = controller.begin(Some(ImageId(1))).unwrap();

    controller
        .complete(
            Completion {
                ticket,
                outcome: Err(ClassifyError::TransportFailure {
                    details: "connection refused".to_string(),
                }),
            },
            Some(ImageId(1)),
        )
        .unwrap();

    let failure = controller.failure().unwrap();
    assert_eq!(failure.message, FALLBACK);
    assert!(matches!(failure.error, ClassifyError::TransportFailure { .. }));
}

#[test]
fn test_service_error_keeps_service_message() {
    let mut controller = controller_with(&ScriptedClient::new());
    let ticket = controller.begin(Some(ImageId(1))).unwrap();

    controller
        .complete(
            Completion {
                ticket,
                outcome: Err(ClassifyError::ServiceError {
                    status: Some(400),
                    message: "No image provided".to_string(),
                }),
            },
            Some(ImageId(1)),
        )
        .unwrap();

    assert_eq!(controller.failure().unwrap().message, "No image provided");
    assert_eq!(controller.status(), RequestStatus::Failed);
}

#[test]
fn test_response_after_reset_is_stale() {
    let mut controller = controller_with(&ScriptedClient::new());
    let ticket = controller.begin(Some(ImageId(1))).unwrap();

    controller.reset();

    let err = controller
        .complete(
            Completion {
                ticket,
                outcome: Ok(bottle_result()),
            },
            None,
        )
        .unwrap_err();

    assert_eq!(err, ClassifyError::StaleResponse { request_id: ticket.request_id });
    assert_eq!(controller.state(), &RequestState::Idle);
}

#[test]
fn test_response_for_replaced_image_is_stale() {
    let mut controller = controller_with(&ScriptedClient::new());
    let old = controller.begin(Some(ImageId(1))).unwrap();
    controller.reset();
    let new = controller.begin(Some(ImageId(2))).unwrap();

    let err = controller
        .complete(
            Completion {
                ticket: old,
                outcome: Ok(bottle_result()),
            },
            Some(ImageId(2)),
        )
        .unwrap_err();

    assert!(matches!(err, ClassifyError::StaleResponse { .. }));
    assert_eq!(controller.state(), &RequestState::Pending(new));
}

#[test]
fn test_response_for_unselected_image_is_stale() {
    let mut controller = controller_with(&ScriptedClient::new());
    let ticket = controller.begin(Some(ImageId(1))).unwrap();

    let err = controller
        .complete(
            Completion {
                ticket,
                outcome: Ok(bottle_result()),
            },
            Some(ImageId(9)),
        )
        .unwrap_err();

    assert!(matches!(err, ClassifyError::StaleResponse { .. }));
    assert!(controller.is_pending());
}

#[tokio::test]
async fn test_submit_issues_one_call_with_image() {
    let client = ScriptedClient::new();
    client.respond_with(Ok(bottle_result()));
    let mut controller = controller_with(&client);
    let mut images = ImageMaterializer::new(u64::MAX);
    let id = images.select_file(jpeg_blob("bottle.jpg"));

    let ticket = controller.submit(images.current()).unwrap();
    assert_eq!(ticket.image_id, id);

    let completion = controller.next_completion().await.unwrap();
    assert_eq!(completion.ticket, ticket);
    controller.complete(completion, images.current_id()).unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(client.uploads()[0].file_name(), "bottle.jpg");
    assert_eq!(controller.result(), Some(&bottle_result()));
}

#[tokio::test]
async fn test_submit_without_image_makes_no_call() {
    let client = ScriptedClient::new();
    let mut controller = controller_with(&client);

    assert_eq!(controller.submit(None), Err(ClassifyError::NoImageSelected));

    tokio::task::yield_now().await;
    assert_eq!(client.calls(), 0);
    assert_eq!(controller.status(), RequestStatus::Idle);
}

#[tokio::test]
async fn test_submit_while_pending_makes_no_second_call() {
    let client = ScriptedClient::new();
    let reply = client.defer();
    let mut controller = controller_with(&client);
    let mut images = ImageMaterializer::new(u64::MAX);
    images.select_file(jpeg_blob("can.jpg"));

    controller.submit(images.current()).unwrap();
    assert_eq!(
        controller.submit(images.current()),
        Err(ClassifyError::RequestInFlight)
    );

    reply.send(Ok(bottle_result())).unwrap();
    let completion = controller.next_completion().await.unwrap();
    controller.complete(completion, images.current_id()).unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(controller.status(), RequestStatus::Succeeded);
}
