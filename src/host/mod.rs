//! Function host.
//!
//! # Data Flow
//! ```text
//! buffered Request<Bytes>
//!     → TeardownGate::enter (503 once teardown began)
//!     → DescriptorTable::find_route (method + template)
//!     → RouteParams + fresh ResponseSlot attached to the request
//!     → descriptor.invoker.invoke([request, context])
//!     → ResponseSlot::take → Response
//! ```
//!
//! # Design Decisions
//! - The table is swapped atomically on reload (ArcSwap); a dispatch keeps
//!   the snapshot it started with
//! - Nested local calls go through `HostExecutor` and are not gated, so a
//!   draining invocation can still finish its inner calls
//! - The host holds no strong reference to itself through its descriptors

mod executor;
mod table;

use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::{LocalExecutor, ProxyClient};
use crate::descriptor::FunctionDescriptor;
use crate::functions::FunctionRegistry;
use crate::http::request::{RequestIdExt, RouteParams};
use crate::http::slot::ResponseSlotExt;
use crate::invoker::{InvocationContext, InvocationError};
use crate::lifecycle::shutdown::TeardownGate;
use crate::observability::metrics;
use crate::routing::{load_routes, LoadError, TieBreak};

use executor::HostExecutor;
pub use table::DescriptorTable;

/// Why a dispatch produced no function response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    NoRouteMatch { method: Method, path: String },

    #[error("host is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("route '{route}' completed without writing a response")]
    EmptySlot { route: String },
}

pub(crate) struct HostInner {
    table: ArcSwap<DescriptorTable>,
    functions: FunctionRegistry,
    tie_break: TieBreak,
    gate: TeardownGate,
}

/// Owns the descriptor table and dispatches inbound requests to it.
///
/// Cheap to clone; clones share one table and one teardown gate.
#[derive(Clone)]
pub struct FunctionHost {
    inner: Arc<HostInner>,
}

impl FunctionHost {
    /// Load the client's routes and build descriptors for them and for
    /// every registered local function.
    pub fn start(
        client: Arc<dyn ProxyClient>,
        functions: FunctionRegistry,
        tie_break: TieBreak,
    ) -> Result<Self, LoadError> {
        let store = load_routes(&client.routes())?;
        let route_count = store.len();

        let inner = Arc::new_cyclic(|weak: &Weak<HostInner>| {
            let executor: Arc<dyn LocalExecutor> = Arc::new(HostExecutor { host: weak.clone() });
            let table = DescriptorTable::build(store, tie_break, client, executor, &functions);
            HostInner {
                table: ArcSwap::from_pointee(table),
                functions,
                tie_break,
                gate: TeardownGate::new(),
            }
        });

        let host = Self { inner };
        metrics::set_routes_loaded(route_count);
        tracing::info!(
            routes = route_count,
            functions = host.inner.functions.len(),
            tie_break = ?tie_break,
            "Function host started"
        );
        Ok(host)
    }

    /// Replace the table with one built from `client`.
    ///
    /// On error the current table stays in place.
    pub fn reload(&self, client: Arc<dyn ProxyClient>) -> Result<(), LoadError> {
        let store = load_routes(&client.routes())?;
        let route_count = store.len();
        let executor: Arc<dyn LocalExecutor> = Arc::new(HostExecutor {
            host: Arc::downgrade(&self.inner),
        });
        let table = DescriptorTable::build(
            store,
            self.inner.tie_break,
            client,
            executor,
            &self.inner.functions,
        );
        self.inner.table.store(Arc::new(table));

        metrics::set_routes_loaded(route_count);
        tracing::info!(routes = route_count, "Routes reloaded");
        Ok(())
    }

    /// Current table snapshot.
    pub fn table(&self) -> Arc<DescriptorTable> {
        self.inner.table.load_full()
    }

    pub fn descriptor(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        let table = self.inner.table.load();
        table.proxy(name).or_else(|| table.resolve_local(name))
    }

    /// Route `request` to its proxy function and return the response it wrote.
    ///
    /// `cancellation` is handed to the invocation; cancel it when the
    /// caller stops waiting.
    pub async fn dispatch(
        &self,
        request: Request<Bytes>,
        cancellation: CancellationToken,
    ) -> Result<Response<Body>, DispatchError> {
        let _in_flight = self.inner.gate.enter().ok_or(DispatchError::ShuttingDown)?;

        let table = self.inner.table.load_full();
        let (route_name, params) = {
            let found = table
                .find_route(request.method(), request.uri().path())
                .ok_or_else(|| DispatchError::NoRouteMatch {
                    method: request.method().clone(),
                    path: request.uri().path().to_string(),
                })?;
            (found.route.name.clone(), found.params)
        };
        let descriptor = table
            .proxy(&route_name)
            .ok_or_else(|| InvocationError::FunctionNotFound(route_name.clone()))?;

        let mut request = request;
        request.extensions_mut().insert(RouteParams::from(params));
        let slot = request.attach_response_slot();
        let context = InvocationContext::with_id(request.invocation_id(), route_name.as_str())
            .with_cancellation(cancellation);

        tracing::debug!(
            route = %route_name,
            invocation_id = %context.invocation_id(),
            "Route matched"
        );
        descriptor
            .invoker
            .invoke(vec![request.into(), context.into()])
            .await?;

        slot.take()
            .ok_or(DispatchError::EmptySlot { route: route_name })
    }

    /// Stop admitting new dispatches. Idempotent.
    pub fn begin_teardown(&self) {
        self.inner.gate.begin_teardown();
    }

    pub fn is_closing(&self) -> bool {
        self.inner.gate.is_closing()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.gate.in_flight()
    }

    /// Wait up to `timeout` for admitted dispatches to finish.
    ///
    /// Returns `false` if some were still running at the deadline.
    pub async fn drain(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.inner.gate.drain()).await {
            Ok(()) => {
                tracing::info!("All invocations drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    in_flight = self.in_flight(),
                    timeout_secs = timeout.as_secs(),
                    "Drain timed out"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for FunctionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionHost")
            .field("routes", &self.inner.table.load().store().len())
            .field("functions", &self.inner.functions)
            .field("closing", &self.is_closing())
            .finish()
    }
}
