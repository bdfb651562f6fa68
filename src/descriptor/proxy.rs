//! Proxy descriptor provider.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{LocalExecutor, ProxyClient};
use crate::descriptor::{DescriptorProvider, FunctionDescriptor, FunctionMetadata, ProxyMetadata};
use crate::invoker::ProxyInvoker;
use crate::routing::{name_key, RouteDefinition, RouteStore};

/// Compiles proxy metadata into descriptors bound to a proxy client.
pub struct ProxyDescriptorProvider {
    /// Lower-cased route name -> route.
    routes: HashMap<String, Arc<RouteDefinition>>,
    client: Arc<dyn ProxyClient>,
    executor: Arc<dyn LocalExecutor>,
}

impl ProxyDescriptorProvider {
    pub fn new(
        store: &RouteStore,
        client: Arc<dyn ProxyClient>,
        executor: Arc<dyn LocalExecutor>,
    ) -> Self {
        let routes = store
            .iter()
            .map(|r| (name_key(&r.name), Arc::new(r.clone())))
            .collect();
        Self {
            routes,
            client,
            executor,
        }
    }
}

impl DescriptorProvider for ProxyDescriptorProvider {
    fn try_create(&self, metadata: &FunctionMetadata) -> Option<FunctionDescriptor> {
        let proxy = metadata.as_proxy()?;
        let route = self.routes.get(&name_key(&proxy.name))?;
        if route.template.as_str() != proxy.url_template {
            return None;
        }

        let invoker = ProxyInvoker::new(route.clone(), self.client.clone(), self.executor.clone());
        Some(FunctionDescriptor {
            metadata: metadata.clone(),
            invoker: Arc::new(invoker),
        })
    }
}

/// One `Proxy` metadata entry per route, in id order.
pub fn read_proxy_metadata(store: &RouteStore) -> Vec<FunctionMetadata> {
    store
        .iter()
        .map(|r| FunctionMetadata::Proxy(ProxyMetadata::from(r)))
        .collect()
}

/// One descriptor per route, each bound to `client`.
pub fn build_descriptors(
    store: &RouteStore,
    client: Arc<dyn ProxyClient>,
    executor: Arc<dyn LocalExecutor>,
) -> Vec<FunctionDescriptor> {
    let provider = ProxyDescriptorProvider::new(store, client, executor);
    read_proxy_metadata(store)
        .iter()
        .filter_map(|m| provider.try_create(m))
        .collect()
}
