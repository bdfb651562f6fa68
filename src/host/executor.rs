//! Bridge from proxy clients back into the host's function table.

use std::sync::Weak;

use async_trait::async_trait;

use crate::client::LocalExecutor;
use crate::host::HostInner;
use crate::invoker::{InvocationArg, InvocationArgs, InvocationError, MAX_NESTING_DEPTH};

/// Runs functions by name on behalf of a proxy client.
///
/// Holds the host weakly: descriptors own the executor, the host owns the
/// descriptors.
pub(crate) struct HostExecutor {
    pub(crate) host: Weak<HostInner>,
}

#[async_trait]
impl LocalExecutor for HostExecutor {
    async fn execute(
        &self,
        function_name: &str,
        args: InvocationArgs,
    ) -> Result<(), InvocationError> {
        let host = self.host.upgrade().ok_or(InvocationError::HostUnavailable)?;

        let depth = args.iter().find_map(|arg| match arg {
            InvocationArg::Context(ctx) => Some(ctx.depth()),
            _ => None,
        });
        if let Some(depth) = depth.filter(|d| *d > MAX_NESTING_DEPTH) {
            tracing::warn!(function = %function_name, depth, "Nested invocation too deep");
            return Err(InvocationError::NestingTooDeep(depth));
        }

        let descriptor = host
            .table
            .load()
            .resolve_local(function_name)
            .ok_or_else(|| InvocationError::FunctionNotFound(function_name.to_string()))?;

        tracing::debug!(function = %function_name, kind = ?descriptor.kind(), "Executing nested function");
        descriptor.invoker.invoke(args).await
    }
}
