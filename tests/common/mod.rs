//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};

use proxy_dispatch::client::{ClientError, LocalExecutor, ProxyClient};
use proxy_dispatch::config::{HostConfig, RouteConfig};
use proxy_dispatch::host::FunctionHost;
use proxy_dispatch::http::{HttpServer, ResponseSlotExt};
use proxy_dispatch::invoker::{InvocationArgs, InvocationError, InvocationParams};
use proxy_dispatch::routing::name_key;
use proxy_dispatch::Shutdown;

/// Remote route entry.
pub fn remote_route(id: u32, method: &str, name: &str, template: &str, backend: &str) -> RouteConfig {
    RouteConfig {
        id: Some(id),
        method: method.to_string(),
        name: name.to_string(),
        url_template: template.to_string(),
        backend_uri: Some(backend.to_string()),
        local_function: None,
    }
}

/// Route entry aliasing an in-host function.
pub fn local_route(id: u32, method: &str, name: &str, template: &str, function: &str) -> RouteConfig {
    RouteConfig {
        id: Some(id),
        method: method.to_string(),
        name: name.to_string(),
        url_template: template.to_string(),
        backend_uri: None,
        local_function: Some(function.to_string()),
    }
}

/// What the fake client does for one route.
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond(u16, &'static str),
    /// Echo a request header back after a short, header-dependent delay.
    EchoHeader(&'static str),
    /// Respond after sleeping.
    Delay(Duration, &'static str),
    /// Run the named function through the local executor.
    Local(&'static str),
    Fail,
    HangUntilCanceled,
}

/// In-memory proxy client.
pub struct FakeProxyClient {
    routes: Vec<RouteConfig>,
    behaviors: HashMap<String, Behavior>,
    pub remote_calls: AtomicUsize,
    pub local_calls: AtomicUsize,
}

impl FakeProxyClient {
    /// Every route answers `200 ok` unless overridden with [`with`](Self::with).
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            behaviors: HashMap::new(),
            remote_calls: AtomicUsize::new(0),
            local_calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, route: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(name_key(route), behavior);
        self
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    pub fn local_calls(&self) -> usize {
        self.local_calls.load(Ordering::SeqCst)
    }
}

fn text(status: u16, body: impl Into<String>) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::from(body.into()))
        .unwrap()
}

#[async_trait]
impl ProxyClient for FakeProxyClient {
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
        let behavior = self
            .behaviors
            .get(&name_key(context.function_name()))
            .cloned()
            .unwrap_or(Behavior::Respond(200, "ok"));

        let response = match behavior {
            Behavior::Respond(status, body) => {
                self.remote_calls.fetch_add(1, Ordering::SeqCst);
                text(status, body)
            }
            Behavior::EchoHeader(name) => {
                self.remote_calls.fetch_add(1, Ordering::SeqCst);
                let value = request
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let jitter = value.bytes().map(u64::from).sum::<u64>() % 20;
                tokio::time::sleep(Duration::from_millis(jitter)).await;
                text(200, value)
            }
            Behavior::Delay(delay, body) => {
                self.remote_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                text(200, body)
            }
            Behavior::Local(function) => {
                self.local_calls.fetch_add(1, Ordering::SeqCst);
                let mut nested = request;
                let nested_slot = nested.attach_response_slot();
                let child = context.child(function);
                executor
                    .execute(function, vec![nested.into(), child.into()])
                    .await
                    .map_err(|source| ClientError::Local {
                        function: function.to_string(),
                        source: Box::new(source),
                    })?;
                nested_slot
                    .take()
                    .ok_or_else(|| ClientError::NoLocalResponse(function.to_string()))?
            }
            Behavior::Fail => {
                self.remote_calls.fetch_add(1, Ordering::SeqCst);
                return Err(ClientError::Remote("connection refused".into()));
            }
            Behavior::HangUntilCanceled => {
                context.cancellation().cancelled().await;
                return Err(ClientError::Canceled);
            }
        };

        if context.is_canceled() {
            return Err(ClientError::Canceled);
        }
        slot.set(response)?;
        Ok(())
    }
}

/// Executor that refuses every call; for invokers tested without a host.
pub struct NoLocalExecutor;

#[async_trait]
impl LocalExecutor for NoLocalExecutor {
    async fn execute(&self, function_name: &str, _args: InvocationArgs) -> Result<(), InvocationError> {
        Err(InvocationError::FunctionNotFound(function_name.to_string()))
    }
}

pub fn get(uri: &str) -> Request<Bytes> {
    Request::builder().uri(uri).body(Bytes::new()).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client_updates: mpsc::UnboundedSender<Arc<dyn ProxyClient>>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(config: HostConfig, host: FunctionHost) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown: broadcast::Receiver<()> = shutdown.subscribe();
    let (client_updates, rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config, host);
    let handle = tokio::spawn(async move { server.run(listener, rx, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        client_updates,
        handle,
    }
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        match socket.read(&mut buf[read..]).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf[..read]).into_owned()
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("OK");
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock backend that returns a fixed response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (200, response.to_string()) }).await
}

/// Start a mock backend that answers with the request line it received,
/// e.g. `GET /items/42?x=1`.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|head: String| async move {
        let line = head.lines().next().unwrap_or_default();
        let line = line.trim_end_matches(" HTTP/1.1").to_string();
        (200, line)
    })
    .await
}

/// Start a programmable mock backend; `f` receives the raw request head.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        let (status, body) = f(head).await;
                        write_response(&mut socket, status, &body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
