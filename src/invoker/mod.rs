//! Invocation subsystem.
//!
//! # Data Flow
//! ```text
//! args: [request, execution context?]
//!     → args.rs (validate once into InvocationParams)
//!     → proxy.rs (Idle → Invoking → Completed | Failed)
//!     → ProxyClient.call(params, local executor)
//!     → Ok(()) once the response sits in the request's slot
//! ```

pub mod args;
pub mod context;
pub mod error;
pub mod proxy;

use async_trait::async_trait;

use crate::descriptor::FunctionKind;

pub use args::{ArgumentError, InvocationArg, InvocationArgs, InvocationParams};
pub use context::{InvocationContext, MAX_NESTING_DEPTH};
pub use error::{Fault, InvocationError};
pub use proxy::{InvocationState, ProxyInvoker};

/// Executes a function. Completion carries no payload; the response travels
/// through the request's response slot.
#[async_trait]
pub trait FunctionInvoker: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> FunctionKind;

    async fn invoke(&self, args: InvocationArgs) -> Result<(), InvocationError>;
}
