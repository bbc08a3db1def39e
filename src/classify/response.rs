use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the service concluded about an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub detected_object: String,
    pub disposal_bin: String,
    /// Embeddable annotated image, usually a data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labeled_image: Option<String>,
}

/// Every field the service may send, success or failure
#[derive(Debug, Deserialize)]
struct ServiceReply {
    detected_object: Option<String>,
    disposal_bin: Option<String>,
    labeled_image: Option<String>,
    error: Option<String>,
}

/// Turn a status code and raw body into a result or a service error.
///
/// The service's own `error` text wins; otherwise `fallback` is used.
pub fn interpret_response(
    status: u16,
    body: &[u8],
    fallback: &str,
) -> Result<ClassificationResult, ClassifyError> {
    let reply = serde_json::from_slice::<ServiceReply>(body);

    let service_message = reply
        .as_ref()
        .ok()
        .and_then(|reply| reply.error.as_deref())
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string);

    if !(200..300).contains(&status) {
        debug!("Service answered {} ({} bytes)", status, body.len());
        return Err(ClassifyError::ServiceError {
            status: Some(status),
            message: service_message.unwrap_or_else(|| fallback.to_string()),
        });
    }

    if let Some(message) = service_message {
        return Err(ClassifyError::ServiceError {
            status: Some(status),
            message,
        });
    }

    let reply = reply.map_err(|e| {
        debug!("Unparseable service reply: {}", e);
        ClassifyError::ServiceError {
            status: Some(status),
            message: fallback.to_string(),
        }
    })?;

    match (reply.detected_object, reply.disposal_bin) {
        (Some(detected_object), Some(disposal_bin)) => Ok(ClassificationResult {
            detected_object,
            disposal_bin,
            labeled_image: reply.labeled_image.filter(|image| !image.is_empty()),
        }),
        _ => Err(ClassifyError::ServiceError {
            status: Some(status),
            message: fallback.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "Failed to analyze image. Please try again.";

    #[test]
    fn test_success_without_labeled_image() {
        let body = br#"{"detected_object":"plastic bottle","disposal_bin":"yellow"}"#;
        let result = interpret_response(200, body, FALLBACK).unwrap();

        assert_eq!(result.detected_object, "plastic bottle");
        assert_eq!(result.disposal_bin, "yellow");
        assert_eq!(result.labeled_image, None);
    }

    #[test]
    fn test_success_with_labeled_image() {
        let body = br#"{"detected_object":"cup","disposal_bin":"purple","labeled_image":"data:image/png;base64,AAAA"}"#;
        let result = interpret_response(200, body, FALLBACK).unwrap();

        assert_eq!(
            result.labeled_image.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_empty_labeled_image_is_absent() {
        let body = br#"{"detected_object":"cup","disposal_bin":"purple","labeled_image":""}"#;
        let result = interpret_response(200, body, FALLBACK).unwrap();
        assert_eq!(result.labeled_image, None);
    }

    #[test]
    fn test_error_status_uses_service_message() {
        let body = br#"{"error":"No object detected"}"#;
        let err = interpret_response(422, body, FALLBACK).unwrap_err();

        assert_eq!(
            err,
            ClassifyError::ServiceError {
                status: Some(422),
                message: "No object detected".to_string()
            }
        );
    }

    #[test]
    fn test_error_status_without_message_uses_fallback() {
        let err = interpret_response(502, b"<html>Bad gateway</html>", FALLBACK).unwrap_err();

        assert_eq!(
            err,
            ClassifyError::ServiceError {
                status: Some(502),
                message: FALLBACK.to_string()
            }
        );
    }

    #[test]
    fn test_blank_error_field_uses_fallback() {
        let err = interpret_response(500, br#"{"error":"  "}"#, FALLBACK).unwrap_err();
        assert!(matches!(err, ClassifyError::ServiceError { message, .. } if message == FALLBACK));
    }

    #[test]
    fn test_explicit_error_in_success_body() {
        let err = interpret_response(200, br#"{"error":"Model not loaded"}"#, FALLBACK).unwrap_err();
        assert!(matches!(err, ClassifyError::ServiceError { message, .. } if message == "Model not loaded"));
    }

    #[test]
    fn test_incomplete_success_body() {
        let err = interpret_response(200, br#"{"detected_object":"can"}"#, FALLBACK).unwrap_err();
        assert!(matches!(err, ClassifyError::ServiceError { message, .. } if message == FALLBACK));

        let err = interpret_response(200, b"not json", FALLBACK).unwrap_err();
        assert!(matches!(err, ClassifyError::ServiceError { message, .. } if message == FALLBACK));
    }
}
