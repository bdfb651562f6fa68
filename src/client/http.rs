//! Network-calling proxy client.
//!
//! # Responsibilities
//! - Resolve the route named by the invocation context to its backend
//! - Forward remote routes with a pooled hyper client
//! - Run local routes through the host's local executor with a fresh request
//! - Write the final response into the caller's slot, once
//!
//! # Design Decisions
//! - Request timeout enforced here with `tokio::time::timeout`
//! - Cancellation checked around every await; a canceled call never writes
//! - Hop-by-hop headers are not forwarded
//! - Backend URIs expand `{param}` placeholders from the matched template

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::client::{ClientError, LocalExecutor, ProxyClient};
use crate::config::{ClientConfig, RouteConfig};
use crate::http::request::RouteParams;
use crate::http::slot::ResponseSlotExt;
use crate::invoker::{InvocationContext, InvocationParams};
use crate::routing::{name_key, BackendKind};

const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Proxy client backed by a hyper connection pool.
pub struct HttpProxyClient {
    routes: Vec<RouteConfig>,
    /// Lower-cased route name -> backend.
    targets: HashMap<String, BackendKind>,
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl HttpProxyClient {
    pub fn new(routes: Vec<RouteConfig>, config: &ClientConfig) -> Self {
        let targets = routes
            .iter()
            .filter_map(|r| {
                let backend = match (&r.backend_uri, &r.local_function) {
                    (Some(uri), None) => BackendKind::Remote {
                        uri: uri.trim().to_string(),
                    },
                    (None, Some(function)) => BackendKind::Local {
                        function: function.trim().to_string(),
                    },
                    // Rejected by route loading; nothing to serve.
                    _ => return None,
                };
                Some((name_key(&r.name), backend))
            })
            .collect();

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            routes,
            targets,
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    async fn forward(
        &self,
        uri_template: &str,
        request: Request<Bytes>,
        ctx: &InvocationContext,
    ) -> Result<Response<Body>, ClientError> {
        let target = expand_backend_uri(
            uri_template,
            request.extensions().get::<RouteParams>(),
            request.uri().query(),
        )?;
        tracing::debug!(backend = %target, method = %request.method(), "Forwarding to backend");

        let outbound = build_outbound(&target, request)?;
        let call = tokio::time::timeout(self.request_timeout, self.client.request(outbound));

        tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => Err(ClientError::Canceled),
            result = call => match result {
                Err(_) => Err(ClientError::Timeout(self.request_timeout)),
                Ok(Err(e)) => Err(ClientError::Remote(e.to_string())),
                Ok(Ok(response)) => {
                    let (parts, body) = response.into_parts();
                    Ok(Response::from_parts(parts, Body::new(body)))
                }
            },
        }
    }

    async fn call_local(
        &self,
        function: &str,
        mut request: Request<Bytes>,
        ctx: &InvocationContext,
        executor: Arc<dyn LocalExecutor>,
    ) -> Result<Response<Body>, ClientError> {
        // The nested call gets its own slot; the outer one is never handed down.
        let nested_slot = request.attach_response_slot();
        let child = ctx.child(function);
        tracing::debug!(function = %function, "Running local function");

        let run = executor.execute(function, vec![request.into(), child.into()]);
        let result = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => return Err(ClientError::Canceled),
            result = run => result,
        };
        result.map_err(|source| ClientError::Local {
            function: function.to_string(),
            source: Box::new(source),
        })?;

        nested_slot
            .take()
            .ok_or_else(|| ClientError::NoLocalResponse(function.to_string()))
    }
}

#[async_trait]
impl ProxyClient for HttpProxyClient {
    fn routes(&self) -> Vec<RouteConfig> {
        self.routes.clone()
    }

    async fn call(
        &self,
        params: InvocationParams,
        executor: Arc<dyn LocalExecutor>,
    ) -> Result<(), ClientError> {
        let InvocationParams { request, context } = params;
        let slot = request
            .response_slot()
            .cloned()
            .ok_or(ClientError::MissingSlot)?;
        let backend = self
            .targets
            .get(&name_key(context.function_name()))
            .ok_or_else(|| ClientError::UnknownRoute(context.function_name().to_string()))?;

        let response = match backend {
            BackendKind::Remote { uri } => self.forward(uri, request, &context).await?,
            BackendKind::Local { function } => {
                self.call_local(function, request, &context, executor).await?
            }
        };

        if context.is_canceled() {
            return Err(ClientError::Canceled);
        }
        slot.set(response)?;
        Ok(())
    }
}

/// Substitute `{param}` placeholders and carry over the inbound query string.
fn expand_backend_uri(
    template: &str,
    params: Option<&RouteParams>,
    query: Option<&str>,
) -> Result<Url, ClientError> {
    let mut expanded = template.to_string();
    if let Some(params) = params {
        for (name, value) in params.iter() {
            expanded = expanded.replace(&format!("{{{}}}", name), value);
        }
    }

    let mut url = Url::parse(&expanded)
        .map_err(|e| ClientError::Remote(format!("invalid backend uri '{}': {}", expanded, e)))?;
    if url.query().is_none() {
        url.set_query(query);
    }
    Ok(url)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn build_outbound(target: &Url, request: Request<Bytes>) -> Result<Request<Body>, ClientError> {
    let (parts, body) = request.into_parts();
    let uri: Uri = target
        .as_str()
        .parse()
        .map_err(|e| ClientError::Remote(format!("invalid backend uri: {}", e)))?;

    let mut builder = Request::builder().method(parts.method).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if name == header::HOST || is_hop_by_hop(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
    }

    builder
        .body(Body::from(body))
        .map_err(|e| ClientError::Remote(e.to_string()))
}
