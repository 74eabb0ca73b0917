//! HTTP response building helpers
//!
//! Provides a consistent API for building HTTP responses across all handlers.
//! Reduces boilerplate and ensures consistent error formatting.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;

use crate::error::StorageError;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// Build the `{"status": "success"}` acknowledgment used by point mutations
pub fn success() -> Response<Full<Bytes>> {
    ok(&serde_json::json!({ "status": "success" }))
}

/// Build a 404 Not Found response with message
pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": message }),
    )
}

/// Build a 400 Bad Request response with message
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &serde_json::json!({ "error": message }),
    )
}

/// Build a 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed" }),
    )
}

/// Convert a StorageError to an appropriate HTTP response
pub fn error_response(error: StorageError) -> Response<Full<Bytes>> {
    let (status, message) = match &error {
        StorageError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        StorageError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        StorageError::InvalidIndex { .. } => (StatusCode::BAD_REQUEST, error.to_string()),
        StorageError::Json(e) => (StatusCode::BAD_REQUEST, format!("JSON error: {}", e)),
        StorageError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        StorageError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    json_response(status, &serde_json::json!({ "error": message }))
}

/// Wrap a service result into an HTTP response
pub fn from_result<T: Serialize>(result: Result<T, StorageError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap an optional service result into an HTTP response
/// Returns 404 if None
pub fn from_option<T: Serialize>(
    result: Result<Option<T>, StorageError>,
    not_found_msg: &str,
) -> Response<Full<Bytes>> {
    match result {
        Ok(Some(value)) => ok(&value),
        Ok(None) => not_found(not_found_msg),
        Err(e) => error_response(e),
    }
}

/// Wrap a point-mutation result into the status acknowledgment
pub fn from_ack_result(result: Result<(), StorageError>) -> Response<Full<Bytes>> {
    match result {
        Ok(()) => success(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let resp = ok(&serde_json::json!({"test": true}));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_response_not_found() {
        let resp = error_response(StorageError::NotFound("test".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response_invalid_input() {
        let resp = error_response(StorageError::InvalidInput("bad field".into()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_response_forbidden() {
        let resp = error_response(StorageError::Forbidden("admin role required".into()));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_error_response_storage_failure_is_500() {
        let resp = error_response(StorageError::Database("disk gone".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
