//! Proxy dispatch host.
//!
//! Serves declaratively configured proxy routes as invocable functions.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────────────┐
//!                      │                       FUNCTION HOST                        │
//!                      │                                                            │
//!  Client Request      │  ┌─────────┐   ┌──────────┐   ┌─────────────────────────┐ │
//!  ────────────────────┼─▶│  http   │──▶│   host   │──▶│ descriptor (per route)  │ │
//!                      │  │ server  │   │ dispatch │   │   → ProxyInvoker        │ │
//!                      │  └─────────┘   └────┬─────┘   └───────────┬─────────────┘ │
//!                      │                     │ routing             │               │
//!                      │                     ▼                     ▼               │
//!                      │              ┌────────────┐       ┌───────────────┐       │
//!                      │              │ RouteStore │       │  ProxyClient  │───────┼──▶ Backend
//!                      │              │ + matcher  │       │ remote/local  │       │
//!                      │              └────────────┘       └───────┬───────┘       │
//!                      │                                          │ local         │
//!                      │                                          ▼               │
//!  Client Response     │  ┌──────────────┐                ┌───────────────┐       │
//!  ◀───────────────────┼──│ response slot│◀───────────────│ LocalExecutor │       │
//!                      │  └──────────────┘                │ → functions   │       │
//!                      │                                  └───────────────┘       │
//!                      │  ┌────────────────────────────────────────────────────┐  │
//!                      │  │  config + watcher │ observability │ lifecycle       │  │
//!                      │  └────────────────────────────────────────────────────┘  │
//!                      └───────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod descriptor;
pub mod functions;
pub mod host;
pub mod http;
pub mod invoker;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::HostConfig;
pub use host::{DispatchError, FunctionHost};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
