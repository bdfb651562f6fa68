//! In-host functions.
//!
//! Local functions are what a proxy route with `local_function = "..."`
//! aliases. They run inside the host, receive the buffered request and
//! return a response directly; the local function invoker moves that
//! response into the request's slot.

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::invoker::InvocationContext;
use crate::routing::name_key;

/// Failure reported by a local function.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FunctionError(pub String);

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A function that runs inside the host.
#[async_trait]
pub trait HttpFunction: Send + Sync {
    async fn call(
        &self,
        request: &Request<Bytes>,
        ctx: &InvocationContext,
    ) -> Result<Response<Body>, FunctionError>;
}

/// Adapter turning a closure into an [`HttpFunction`].
pub struct FnFunction<F> {
    f: F,
}

#[async_trait]
impl<F> HttpFunction for FnFunction<F>
where
    F: for<'a> Fn(&'a Request<Bytes>, &'a InvocationContext) -> BoxFuture<'a, Result<Response<Body>, FunctionError>>
        + Send
        + Sync,
{
    async fn call(
        &self,
        request: &Request<Bytes>,
        ctx: &InvocationContext,
    ) -> Result<Response<Body>, FunctionError> {
        (self.f)(request, ctx).await
    }
}

/// Name → function table. Names compare case-insensitively.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, (String, Arc<dyn HttpFunction>)>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in functions (`echo`, `ping`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        registry
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, function: Arc<dyn HttpFunction>) {
        let name = name.into();
        self.functions
            .insert(name_key(&name), (name, function));
    }

    /// Register an async closure.
    ///
    /// ```ignore
    /// registry.register_fn("hello", |_req, _ctx| {
    ///     Box::pin(async { Ok(Response::new(Body::from("hi"))) })
    /// });
    /// ```
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: for<'a> Fn(&'a Request<Bytes>, &'a InvocationContext) -> BoxFuture<'a, Result<Response<Body>, FunctionError>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Arc::new(FnFunction { f }));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn HttpFunction>> {
        self.functions
            .get(&name_key(name))
            .map(|(_, f)| f.clone())
    }

    /// Registered names, as written at registration, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.values().map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Box an async block for [`FunctionRegistry::register_fn`].
pub fn boxed<'a, Fut>(fut: Fut) -> BoxFuture<'a, Result<Response<Body>, FunctionError>>
where
    Fut: Future<Output = Result<Response<Body>, FunctionError>> + Send + 'a,
{
    Box::pin(fut)
}
