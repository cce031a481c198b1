//! Request helpers for driving the router in-process.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use tower::ServiceExt;

/// Collected response parts.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    /// Header value as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body parsed as JSON, or `Null` when empty or not JSON.
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).unwrap_or(Value::Null)
        }
    }
}

/// Send a request and collect the whole response.
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    range: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    if let Some(range) = range {
        builder = builder.header("Range", range);
    }

    let request = builder.body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// GET `uri`, optionally authenticated and with a `Range` header.
#[allow(dead_code)]
pub async fn get(
    router: &axum::Router,
    uri: &str,
    auth_token: Option<&str>,
    range: Option<&str>,
) -> TestResponse {
    send(router, "GET", uri, auth_token, range).await
}

/// Send a request and parse the JSON body.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let response = send(router, method, uri, auth_token, None).await;
    (response.status, response.json())
}
