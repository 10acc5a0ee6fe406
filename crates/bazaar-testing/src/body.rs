//! Response body helpers.

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

/// Drain a response body and parse it as JSON.
pub async fn json_body(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and `kind` of an error response.
pub async fn assert_error(resp: Response, status: http::StatusCode, kind: &str) {
    assert_eq!(resp.status(), status);
    let json = json_body(resp).await;
    assert_eq!(json["kind"], kind, "unexpected error body: {json}");
}
