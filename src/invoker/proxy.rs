//! Proxy invoker: the executable unit behind every proxy route.
//!
//! # Responsibilities
//! - Validate invocation arguments once
//! - Delegate the call to the bound proxy client with the local executor
//! - Relay client faults as `InvocationError::Failed`
//!
//! # Design Decisions
//! - Stateless per call: one invoker serves any number of concurrent calls
//! - Never builds or inspects the response; the client writes the slot
//! - No retries and no timeout parameter; both are client policy

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::client::{ClientError, LocalExecutor, ProxyClient};
use crate::descriptor::FunctionKind;
use crate::invoker::{FunctionInvoker, InvocationArgs, InvocationError, InvocationParams};
use crate::observability::metrics;
use crate::routing::RouteDefinition;

/// Lifecycle of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Invoking,
    Completed,
    Failed,
}

impl InvocationState {
    pub fn can_transition_to(self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Idle, Invoking) | (Idle, Failed) | (Invoking, Completed) | (Invoking, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InvocationState::Completed | InvocationState::Failed)
    }

    fn advance(&mut self, next: InvocationState) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal invocation transition {:?} -> {:?}",
            self,
            next
        );
        tracing::trace!(from = ?*self, to = ?next, "Invocation state");
        *self = next;
    }
}

/// Invoker bound to one proxy route.
#[derive(Clone)]
pub struct ProxyInvoker {
    route: Arc<RouteDefinition>,
    client: Arc<dyn ProxyClient>,
    executor: Arc<dyn LocalExecutor>,
}

impl ProxyInvoker {
    pub fn new(
        route: Arc<RouteDefinition>,
        client: Arc<dyn ProxyClient>,
        executor: Arc<dyn LocalExecutor>,
    ) -> Self {
        Self {
            route,
            client,
            executor,
        }
    }

    pub fn route(&self) -> &RouteDefinition {
        &self.route
    }

    async fn run(&self, params: InvocationParams) -> Result<(), InvocationError> {
        let start = Instant::now();
        let mut state = InvocationState::Idle;

        let result = if params.context.is_canceled() {
            Err(ClientError::Canceled)
        } else {
            state.advance(InvocationState::Invoking);
            self.client.call(params, self.executor.clone()).await
        };

        match result {
            Ok(()) => {
                state.advance(InvocationState::Completed);
                metrics::record_invocation(&self.route.name, "completed", start);
                tracing::debug!(elapsed = ?start.elapsed(), "Proxy invocation completed");
                Ok(())
            }
            Err(cause) => {
                state.advance(InvocationState::Failed);
                metrics::record_invocation(&self.route.name, cause.fault().as_str(), start);
                tracing::warn!(error = %cause, "Proxy invocation failed");
                Err(InvocationError::Failed {
                    route: self.route.name.clone(),
                    cause,
                })
            }
        }
    }
}

impl fmt::Debug for ProxyInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInvoker")
            .field("route", &self.route.name)
            .field("template", &self.route.template.as_str())
            .finish()
    }
}

#[async_trait]
impl FunctionInvoker for ProxyInvoker {
    fn kind(&self) -> FunctionKind {
        FunctionKind::Proxy
    }

    async fn invoke(&self, args: InvocationArgs) -> Result<(), InvocationError> {
        let params = InvocationParams::from_args(args, &self.route.name)?;
        let span = params.context.span().clone();
        self.run(params).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::InvocationState::*;

    #[test]
    fn test_state_transitions() {
        assert!(Idle.can_transition_to(Invoking));
        assert!(Idle.can_transition_to(Failed));
        assert!(Invoking.can_transition_to(Completed));
        assert!(Invoking.can_transition_to(Failed));

        assert!(!Idle.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Invoking));
        assert!(!Failed.can_transition_to(Completed));
        assert!(Completed.is_terminal() && Failed.is_terminal());
        assert!(!Invoking.is_terminal());
    }
}
