//! Per-invocation ambient data.

use tokio_util::sync::CancellationToken;
use tracing::Span;
use uuid::Uuid;

/// Nested local calls deeper than this are rejected.
pub const MAX_NESTING_DEPTH: u32 = 8;

/// Invocation id, cancellation signal and log sink for one call.
///
/// Created per request and dropped once the response is resolved. Clones
/// share the cancellation token and span.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    invocation_id: Uuid,
    function_name: String,
    cancellation: CancellationToken,
    depth: u32,
    span: Span,
}

impl InvocationContext {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), function_name)
    }

    pub fn with_id(invocation_id: Uuid, function_name: impl Into<String>) -> Self {
        let function_name = function_name.into();
        let span = tracing::info_span!(
            "invocation",
            invocation_id = %invocation_id,
            function = %function_name,
            depth = 0u32
        );
        Self {
            invocation_id,
            function_name,
            cancellation: CancellationToken::new(),
            depth: 0,
            span,
        }
    }

    /// Replace the cancellation token, e.g. with one tied to the inbound connection.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Re-target the context at `function_name`, keeping id, token and depth.
    pub fn for_function(mut self, function_name: &str) -> Self {
        if self.function_name != function_name {
            self.span.record("function", function_name);
            self.function_name = function_name.to_string();
        }
        self
    }

    /// Context for a nested call made on behalf of this one.
    ///
    /// The child gets its own id, a child cancellation token (canceling the
    /// parent cancels the child, not the other way round) and depth + 1.
    pub fn child(&self, function_name: impl Into<String>) -> Self {
        let invocation_id = Uuid::new_v4();
        let function_name = function_name.into();
        let depth = self.depth + 1;
        let span = tracing::info_span!(
            parent: &self.span,
            "invocation",
            invocation_id = %invocation_id,
            function = %function_name,
            depth
        );
        Self {
            invocation_id,
            function_name,
            cancellation: self.cancellation.child_token(),
            depth,
            span,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Log sink for this invocation.
    pub fn span(&self) -> &Span {
        &self.span
    }
}
