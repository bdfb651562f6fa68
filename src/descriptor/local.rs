//! Local function descriptor provider and invoker.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use crate::descriptor::{
    DescriptorProvider, FunctionDescriptor, FunctionKind, FunctionMetadata, LocalFunctionMetadata,
};
use crate::functions::{FunctionRegistry, HttpFunction};
use crate::http::slot::ResponseSlotExt;
use crate::invoker::{FunctionInvoker, InvocationArgs, InvocationError, InvocationParams};

/// Runs a registered function and stores its response in the request slot.
#[derive(Clone)]
pub struct LocalFunctionInvoker {
    name: String,
    function: Arc<dyn HttpFunction>,
}

impl LocalFunctionInvoker {
    pub fn new(name: impl Into<String>, function: Arc<dyn HttpFunction>) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }

    async fn run(&self, params: InvocationParams) -> Result<(), InvocationError> {
        let slot = params
            .request
            .response_slot()
            .cloned()
            .ok_or_else(|| InvocationError::MissingSlot(self.name.clone()))?;

        let response = self
            .function
            .call(&params.request, &params.context)
            .await
            .map_err(|source| InvocationError::Function {
                function: self.name.clone(),
                source,
            })?;

        slot.set(response).map_err(|source| InvocationError::Slot {
            function: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for LocalFunctionInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFunctionInvoker")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl FunctionInvoker for LocalFunctionInvoker {
    fn kind(&self) -> FunctionKind {
        FunctionKind::Http
    }

    async fn invoke(&self, args: InvocationArgs) -> Result<(), InvocationError> {
        let params = InvocationParams::from_args(args, &self.name)?;
        let span = params.context.span().clone();
        self.run(params).instrument(span).await
    }
}

/// Compiles `Http` metadata for functions in a registry.
pub struct LocalFunctionDescriptorProvider {
    functions: FunctionRegistry,
}

impl LocalFunctionDescriptorProvider {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self { functions }
    }
}

impl DescriptorProvider for LocalFunctionDescriptorProvider {
    fn try_create(&self, metadata: &FunctionMetadata) -> Option<FunctionDescriptor> {
        let FunctionMetadata::Http(local) = metadata else {
            return None;
        };
        let function = self.functions.get(&local.name)?;
        Some(FunctionDescriptor {
            metadata: metadata.clone(),
            invoker: Arc::new(LocalFunctionInvoker::new(local.name.clone(), function)),
        })
    }
}

/// One `Http` metadata entry per registered function.
pub fn read_function_metadata(functions: &FunctionRegistry) -> Vec<FunctionMetadata> {
    functions
        .names()
        .into_iter()
        .map(|name| FunctionMetadata::Http(LocalFunctionMetadata { name }))
        .collect()
}
