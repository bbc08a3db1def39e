use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use trash_sight::config::ServiceConfig;
use trash_sight::{ClassificationClient, ClassifyError, HttpClassificationClient, ImageBlob};

const FALLBACK: &str = "Failed to analyze image. Please try again.";

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/classify_image", addr)
}

fn client_for(url: String) -> HttpClassificationClient {
    HttpClassificationClient::new(&ServiceConfig {
        url,
        timeout_seconds: 5,
        fallback_error_message: FALLBACK.to_string(),
    })
    .unwrap()
}

fn bottle() -> ImageBlob {
    ImageBlob::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9], "bottle.jpg")
}

/// Answers like the real service: 400 unless the `image` field is present
async fn classify_image(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap();

        if file_name.as_deref() == Some("bottle.jpg")
            && content_type.as_deref() == Some("image/jpeg")
            && bytes[..] == [0xFF, 0xD8, 0xFF, 0xD9]
        {
            return (
                StatusCode::OK,
                Json(json!({
                    "detected_object": "plastic bottle",
                    "disposal_bin": "yellow",
                })),
            );
        }
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No image provided" })),
    )
}

#[tokio::test]
async fn test_multipart_upload_is_classified() {
    let url = serve(Router::new().route("/classify_image", post(classify_image))).await;

    let result = client_for(url).classify(&bottle()).await.unwrap();

    assert_eq!(result.detected_object, "plastic bottle");
    assert_eq!(result.disposal_bin, "yellow");
    assert!(result.labeled_image.is_none());
}

#[tokio::test]
async fn test_service_error_text_is_kept() {
    let url = serve(Router::new().route("/classify_image", post(classify_image))).await;
    let other = ImageBlob::new(vec![1u8, 2, 3], "image/png", "other.png");

    let err = client_for(url).classify(&other).await.unwrap_err();

    assert_eq!(
        err,
        ClassifyError::ServiceError {
            status: Some(400),
            message: "No image provided".to_string(),
        }
    );
}

#[tokio::test]
async fn test_non_json_failure_uses_fallback() {
    let router = Router::new().route(
        "/classify_image",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let url = serve(router).await;

    let err = client_for(url).classify(&bottle()).await.unwrap_err();

    assert_eq!(
        err,
        ClassifyError::ServiceError {
            status: Some(500),
            message: FALLBACK.to_string(),
        }
    );
}

#[tokio::test]
async fn test_labeled_image_passed_through() {
    let router = Router::new().route(
        "/classify_image",
        post(|| async {
            Json(json!({
                "detected_object": "paper cup",
                "disposal_bin": "purple",
                "labeled_image": "data:image/png;base64,AQIDBA==",
            }))
        }),
    );
    let url = serve(router).await;

    let result = client_for(url).classify(&bottle()).await.unwrap();

    assert_eq!(
        result.labeled_image.as_deref(),
        Some("data:image/png;base64,AQIDBA==")
    );
}

#[tokio::test]
async fn test_unreachable_service_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(format!("http://{}/classify_image", addr))
        .classify(&bottle())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::TransportFailure { .. }));
}
