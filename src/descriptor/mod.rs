//! Descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! RouteStore ──→ proxy.rs (ProxyMetadata per route) ──┐
//! FunctionRegistry ──→ local.rs (LocalFunctionMetadata) ┤
//!                                                       ▼
//!                            metadata stream → providers, in order
//!                                                       │ first Some wins
//!                                                       ▼
//!                            FunctionDescriptor { metadata, invoker }
//! ```
//!
//! # Design Decisions
//! - Providers ignore metadata they do not own (`try_create` → `None`)
//! - Building is deterministic: same inputs, equivalent descriptors
//! - Descriptors are immutable and shared via `Arc`

pub mod local;
pub mod metadata;
pub mod proxy;

use std::sync::Arc;

use crate::invoker::FunctionInvoker;

pub use local::{read_function_metadata, LocalFunctionDescriptorProvider, LocalFunctionInvoker};
pub use metadata::{FunctionKind, FunctionMetadata, LocalFunctionMetadata, ProxyMetadata};
pub use proxy::{build_descriptors, read_proxy_metadata, ProxyDescriptorProvider};

/// Compiled, invocable function: metadata plus invoker.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub metadata: FunctionMetadata,
    pub invoker: Arc<dyn FunctionInvoker>,
}

impl FunctionDescriptor {
    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn kind(&self) -> FunctionKind {
        self.metadata.kind()
    }
}

/// Compiles metadata of one kind into descriptors.
pub trait DescriptorProvider: Send + Sync {
    /// `None` when this provider does not handle `metadata`.
    fn try_create(&self, metadata: &FunctionMetadata) -> Option<FunctionDescriptor>;
}

/// Run every metadata entry through the providers; first match wins.
///
/// Entries no provider accepts are logged and skipped.
pub fn create_descriptors(
    metadata: &[FunctionMetadata],
    providers: &[&dyn DescriptorProvider],
) -> Vec<FunctionDescriptor> {
    metadata
        .iter()
        .filter_map(|m| {
            let descriptor = providers.iter().find_map(|p| p.try_create(m));
            if descriptor.is_none() {
                tracing::warn!(function = %m.name(), kind = ?m.kind(), "No provider for function, skipping");
            }
            descriptor
        })
        .collect()
}
