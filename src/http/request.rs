//! Request handling and transformation.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layer
//! - Buffer the inbound body so the request can be handed to an invoker
//! - Carry captured route parameters to the proxy client
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (tower-http layer)
//! - Body size limit enforced while buffering
//! - A UUID request ID doubles as the invocation ID

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::Request;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Access to the request ID header.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;

    /// The request ID as a UUID, or a fresh UUID if absent or not a UUID.
    fn invocation_id(&self) -> Uuid {
        self.request_id()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(Uuid::new_v4)
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }
}

/// Template parameters captured by the route match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<HashMap<String, String>> for RouteParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl FromIterator<(String, String)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The inbound body exceeded the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyTooLarge {
    pub limit: usize,
}

impl std::fmt::Display for BodyTooLarge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request body exceeds {} bytes", self.limit)
    }
}

impl std::error::Error for BodyTooLarge {}

/// Buffer the body of an inbound request.
pub async fn buffer_request(
    request: Request<Body>,
    limit: usize,
) -> Result<Request<Bytes>, BodyTooLarge> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| BodyTooLarge { limit })?;
    Ok(Request::from_parts(parts, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_id_from_header() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header(X_REQUEST_ID, id.to_string())
            .body(())
            .unwrap();
        assert_eq!(req.request_id(), Some(id.to_string().as_str()));
        assert_eq!(req.invocation_id(), id);

        let req = Request::builder()
            .header(X_REQUEST_ID, "not-a-uuid")
            .body(())
            .unwrap();
        assert_ne!(req.invocation_id().to_string(), "not-a-uuid");
    }

    #[tokio::test]
    async fn test_buffer_request_limit() {
        let req = Request::builder()
            .uri("/upload")
            .body(Body::from("hello"))
            .unwrap();
        let buffered = buffer_request(req, 16).await.unwrap();
        assert_eq!(buffered.body().as_ref(), b"hello");
        assert_eq!(buffered.uri().path(), "/upload");

        let req = Request::builder()
            .body(Body::from(vec![0u8; 32]))
            .unwrap();
        assert_eq!(
            buffer_request(req, 16).await.unwrap_err(),
            BodyTooLarge { limit: 16 }
        );
    }
}
