//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map dispatch failures to HTTP status codes
//! - Keep function responses untouched on the way out
//!
//! # Design Decisions
//! - Remote failures result in 502 Bad Gateway
//! - Backend timeouts result in 504 Gateway Timeout
//! - The error text is the response body; nothing else leaks

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::host::DispatchError;
use crate::invoker::{Fault, InvocationError};

/// Nginx's "client closed request"; the caller is gone when this is sent.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            DispatchError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::EmptySlot { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Invocation(e) => invocation_status(e),
        }
    }
}

fn invocation_status(error: &InvocationError) -> StatusCode {
    if let InvocationError::Argument(_) = error {
        return StatusCode::BAD_REQUEST;
    }
    match error.fault() {
        Some(Fault::Remote) => StatusCode::BAD_GATEWAY,
        Some(Fault::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        Some(Fault::Canceled) => {
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
        }
        Some(Fault::Local) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Dispatch failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Dispatch rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::invoker::ArgumentError;
    use axum::http::Method;
    use std::time::Duration;

    fn failed(cause: ClientError) -> DispatchError {
        DispatchError::Invocation(InvocationError::Failed {
            route: "r".into(),
            cause,
        })
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                DispatchError::NoRouteMatch {
                    method: Method::GET,
                    path: "/x".into(),
                },
                404,
            ),
            (DispatchError::ShuttingDown, 503),
            (DispatchError::EmptySlot { route: "r".into() }, 500),
            (
                DispatchError::Invocation(InvocationError::Argument(ArgumentError::MissingRequest)),
                400,
            ),
            (failed(ClientError::Remote("refused".into())), 502),
            (failed(ClientError::Timeout(Duration::from_secs(1))), 504),
            (failed(ClientError::Canceled), 499),
            (
                DispatchError::Invocation(InvocationError::NestingTooDeep(9)),
                500,
            ),
            (
                DispatchError::Invocation(InvocationError::FunctionNotFound("f".into())),
                500,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status_code().as_u16(), expected, "{error}");
        }
    }

    #[test]
    fn test_into_response_carries_message() {
        let response = DispatchError::ShuttingDown.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
