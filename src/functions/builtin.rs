//! Built-in local functions.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Request, Response, StatusCode};
use serde::Serialize;

use crate::functions::{FunctionError, FunctionRegistry, HttpFunction};
use crate::invoker::InvocationContext;

pub fn register(registry: &mut FunctionRegistry) {
    registry.register("echo", Arc::new(Echo));
    registry.register("ping", Arc::new(Ping));
}

#[derive(Serialize)]
struct EchoBody<'a> {
    invocation_id: String,
    function: &'a str,
    method: &'a str,
    path: &'a str,
    query: Option<&'a str>,
    body: String,
}

/// Replies with a JSON description of the request it received.
pub struct Echo;

#[async_trait]
impl HttpFunction for Echo {
    async fn call(
        &self,
        request: &Request<Bytes>,
        ctx: &InvocationContext,
    ) -> Result<Response<Body>, FunctionError> {
        let echo = EchoBody {
            invocation_id: ctx.invocation_id().to_string(),
            function: ctx.function_name(),
            method: request.method().as_str(),
            path: request.uri().path(),
            query: request.uri().query(),
            body: String::from_utf8_lossy(request.body()).into_owned(),
        };
        let json = serde_json::to_vec(&echo).map_err(|e| FunctionError::new(e.to_string()))?;

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json))
            .map_err(|e| FunctionError::new(e.to_string()))
    }
}

/// Replies `200 pong`.
pub struct Ping;

#[async_trait]
impl HttpFunction for Ping {
    async fn call(
        &self,
        _request: &Request<Bytes>,
        _ctx: &InvocationContext,
    ) -> Result<Response<Body>, FunctionError> {
        Ok(Response::new(Body::from("pong")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_describes_request() {
        let req = Request::builder()
            .method("POST")
            .uri("http://localhost/mymockhttp?x=1")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let ctx = InvocationContext::new("echo");

        let resp = Echo.call(&req, &ctx).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 4096).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["path"], "/mymockhttp");
        assert_eq!(value["query"], "x=1");
        assert_eq!(value["body"], "payload");
        assert_eq!(value["invocation_id"], ctx.invocation_id().to_string());
    }
}
