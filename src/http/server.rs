//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all dispatch handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer inbound bodies under the configured limit
//! - Hand every request to the function host
//! - Apply proxy client updates from the routes watcher
//! - Stop admitting work on shutdown, then drain

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::client::ProxyClient;
use crate::config::HostConfig;
use crate::host::FunctionHost;
use crate::http::request::{buffer_request, RequestIdExt};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub host: FunctionHost,
    pub max_body_bytes: usize,
}

/// HTTP front end of the function host.
pub struct HttpServer {
    router: Router,
    config: HostConfig,
    host: FunctionHost,
}

impl HttpServer {
    pub fn new(config: HostConfig, host: FunctionHost) -> Self {
        let state = AppState {
            host: host.clone(),
            max_body_bytes: config.host.max_body_bytes,
        };
        let router = Self::build_router(state);
        Self {
            router,
            config,
            host,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Serve until `shutdown` fires, then tear the host down.
    ///
    /// Proxy clients arriving on `client_updates` replace the route table
    /// while serving.
    pub async fn run(
        self,
        listener: TcpListener,
        mut client_updates: mpsc::UnboundedReceiver<Arc<dyn ProxyClient>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_host = self.host.clone();
        let reloader = tokio::spawn(async move {
            while let Some(client) = client_updates.recv().await {
                if let Err(e) = reload_host.reload(client) {
                    tracing::error!(error = %e, "Route reload rejected, keeping current routes");
                }
            }
        });

        let teardown_host = self.host.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                teardown_host.begin_teardown();
            })
            .await?;

        reloader.abort();
        let drain_timeout = Duration::from_secs(self.config.host.drain_timeout_secs);
        self.host.drain(drain_timeout).await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn host(&self) -> &FunctionHost {
        &self.host
    }
}

/// Catch-all handler: buffer, dispatch, map errors.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request.request_id().unwrap_or("unknown").to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Dispatching request"
    );

    let request = match buffer_request(request, state.max_body_bytes).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
            metrics::record_request(method.as_str(), 413, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response();
        }
    };

    // Canceled if this future is dropped, i.e. the client went away.
    let cancellation = CancellationToken::new();
    let cancel_on_drop = cancellation.clone().drop_guard();

    let response = match state.host.dispatch(request, cancellation).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    cancel_on_drop.disarm();

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::client::HttpProxyClient;
    use crate::functions::FunctionRegistry;
    use crate::routing::TieBreak;
    use tower::ServiceExt;

    fn server(max_body_bytes: usize) -> HttpServer {
        let routes = vec![RouteConfig {
            id: Some(1),
            method: "*".into(),
            name: "ping".into(),
            url_template: "/ping".into(),
            backend_uri: None,
            local_function: Some("ping".into()),
        }];
        let mut config = HostConfig::default();
        config.host.max_body_bytes = max_body_bytes;
        let client = Arc::new(HttpProxyClient::new(routes, &config.client));
        let host = FunctionHost::start(client, FunctionRegistry::with_builtins(), TieBreak::LowestId)
            .unwrap();
        HttpServer::new(config, host)
    }

    #[tokio::test]
    async fn test_router_dispatches_and_sets_request_id() {
        let response = server(1024)
            .router
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_router_maps_errors() {
        let response = server(1024)
            .router
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = server(4)
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ping")
                    .body(Body::from("too long"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_teardown_refuses_requests() {
        let server = server(1024);
        server.host().begin_teardown();
        let response = server
            .router
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
