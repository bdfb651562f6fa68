//! Invocation arguments.
//!
//! Callers hand an invoker an ordered argument list: the inbound request
//! first, optionally followed by an execution context. The list is
//! validated once, here, into typed [`InvocationParams`].

use axum::body::Bytes;
use axum::http::Request;
use thiserror::Error;

use crate::invoker::context::InvocationContext;

/// One positional invocation argument.
#[derive(Debug)]
pub enum InvocationArg {
    Request(Request<Bytes>),
    Context(InvocationContext),
    /// Arbitrary payload, e.g. from a non-HTTP caller.
    Value(serde_json::Value),
}

impl InvocationArg {
    fn kind(&self) -> &'static str {
        match self {
            InvocationArg::Request(_) => "a request",
            InvocationArg::Context(_) => "an execution context",
            InvocationArg::Value(_) => "a JSON value",
        }
    }
}

impl From<Request<Bytes>> for InvocationArg {
    fn from(request: Request<Bytes>) -> Self {
        InvocationArg::Request(request)
    }
}

impl From<InvocationContext> for InvocationArg {
    fn from(context: InvocationContext) -> Self {
        InvocationArg::Context(context)
    }
}

impl From<serde_json::Value> for InvocationArg {
    fn from(value: serde_json::Value) -> Self {
        InvocationArg::Value(value)
    }
}

pub type InvocationArgs = Vec<InvocationArg>;

/// Invocation arguments that failed validation. No response slot is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing request argument")]
    MissingRequest,

    #[error("argument 0 is {found}, expected a request")]
    NotARequest { found: &'static str },

    #[error("argument 1 is {found}, expected an execution context")]
    NotAContext { found: &'static str },

    #[error("expected at most 2 arguments, got {0}")]
    TooMany(usize),
}

/// Validated invocation parameters.
#[derive(Debug)]
pub struct InvocationParams {
    pub request: Request<Bytes>,
    pub context: InvocationContext,
}

impl InvocationParams {
    pub fn new(request: Request<Bytes>, context: InvocationContext) -> Self {
        Self { request, context }
    }

    /// Validate a positional argument list.
    ///
    /// A missing context is replaced by a fresh one; a supplied context is
    /// re-targeted at `function_name`.
    pub fn from_args(args: InvocationArgs, function_name: &str) -> Result<Self, ArgumentError> {
        if args.len() > 2 {
            return Err(ArgumentError::TooMany(args.len()));
        }
        let mut args = args.into_iter();

        let request = match args.next() {
            Some(InvocationArg::Request(request)) => request,
            Some(other) => return Err(ArgumentError::NotARequest { found: other.kind() }),
            None => return Err(ArgumentError::MissingRequest),
        };

        let context = match args.next() {
            Some(InvocationArg::Context(context)) => context.for_function(function_name),
            Some(other) => return Err(ArgumentError::NotAContext { found: other.kind() }),
            None => InvocationContext::new(function_name),
        };

        Ok(Self { request, context })
    }

    /// Back to positional form, for handing to another invoker.
    pub fn into_args(self) -> InvocationArgs {
        vec![
            InvocationArg::Request(self.request),
            InvocationArg::Context(self.context),
        ]
    }
}
