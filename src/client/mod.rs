//! Proxy client subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyInvoker.invoke(args)
//!     → ProxyClient.call(params, executor)
//!         ├─ Remote route: http.rs forwards to the backend (hyper client)
//!         └─ Local route: executor runs an in-host function with a fresh request
//!     → response written into the request's ResponseSlot
//!     → future resolves
//! ```
//!
//! # Design Decisions
//! - Two-method capability: `routes` + `call`; no inheritance
//! - The client, not the invoker, writes the response slot
//! - Timeouts and any retry policy belong to the client
//! - Cancellation is observed here and surfaced as `ClientError::Canceled`

pub mod generator;
pub mod http;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::RouteConfig;
use crate::http::slot::SlotError;
use crate::invoker::{Fault, InvocationArgs, InvocationError, InvocationParams};

pub use generator::HttpProxyClientGenerator;
pub use http::HttpProxyClient;

/// Errors produced by a proxy client call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend call failed: {0}")]
    Remote(String),

    #[error("local function '{function}' failed: {source}")]
    Local {
        function: String,
        #[source]
        source: Box<InvocationError>,
    },

    #[error("local function '{0}' produced no response")]
    NoLocalResponse(String),

    #[error("call canceled")]
    Canceled,

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("no route named '{0}'")]
    UnknownRoute(String),

    #[error("request carries no response slot")]
    MissingSlot,

    #[error(transparent)]
    Slot(#[from] SlotError),
}

impl ClientError {
    pub fn fault(&self) -> Fault {
        match self {
            ClientError::Canceled => Fault::Canceled,
            ClientError::Timeout(_) => Fault::Timeout,
            // A local alias to a remote route fails the way that route did.
            ClientError::Local { source, .. } => source.fault().unwrap_or(Fault::Local),
            ClientError::NoLocalResponse(_) => Fault::Local,
            ClientError::Remote(_)
            | ClientError::UnknownRoute(_)
            | ClientError::MissingSlot
            | ClientError::Slot(_) => Fault::Remote,
        }
    }
}

/// Runs an in-host function by name through the host's dispatch path.
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    /// Invoke `function_name` with positional `args`. The response, if any,
    /// lands in the slot of the request passed in `args`.
    async fn execute(&self, function_name: &str, args: InvocationArgs) -> Result<(), InvocationError>;
}

/// Executes a route's backend call, remote or local.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    /// The raw route table this client serves.
    fn routes(&self) -> Vec<RouteConfig>;

    /// Perform the call for the route named by `params.context`.
    ///
    /// On success the response has been written into the request's slot
    /// before the returned future resolves. On error nothing is written.
    async fn call(
        &self,
        params: InvocationParams,
        executor: Arc<dyn LocalExecutor>,
    ) -> Result<(), ClientError>;
}

/// Builds a proxy client for a host root directory.
pub trait ProxyClientGenerator: Send + Sync {
    fn create_client(&self, root_path: &Path) -> Result<Arc<dyn ProxyClient>, ConfigError>;
}
