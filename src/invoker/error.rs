//! Invocation error types.

use thiserror::Error;

use crate::client::ClientError;
use crate::functions::FunctionError;
use crate::http::slot::SlotError;
use crate::invoker::args::ArgumentError;

/// Coarse classification of a failed call, used for status mapping and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Remote,
    Local,
    Canceled,
    Timeout,
}

impl Fault {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fault::Remote => "remote",
            Fault::Local => "local",
            Fault::Canceled => "canceled",
            Fault::Timeout => "timeout",
        }
    }
}

/// Errors surfaced by a function invoker. Never retried inside the host.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("invalid invocation arguments: {0}")]
    Argument(#[from] ArgumentError),

    #[error("invocation of '{route}' failed: {cause}")]
    Failed {
        route: String,
        #[source]
        cause: ClientError,
    },

    #[error("local function '{function}' failed: {source}")]
    Function {
        function: String,
        #[source]
        source: FunctionError,
    },

    #[error("request for '{0}' carries no response slot")]
    MissingSlot(String),

    #[error("function '{function}' wrote its response twice: {source}")]
    Slot {
        function: String,
        #[source]
        source: SlotError,
    },

    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    #[error("nested invocation depth {0} exceeds the limit")]
    NestingTooDeep(u32),

    #[error("host is gone")]
    HostUnavailable,
}

impl InvocationError {
    /// Classify the failure. `None` for argument and lookup errors.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            InvocationError::Failed { cause, .. } => Some(cause.fault()),
            InvocationError::Function { .. }
            | InvocationError::MissingSlot(_)
            | InvocationError::Slot { .. }
            | InvocationError::NestingTooDeep(_)
            | InvocationError::HostUnavailable => Some(Fault::Local),
            InvocationError::Argument(_) | InvocationError::FunctionNotFound(_) => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.fault() == Some(Fault::Canceled)
    }
}
