//! Descriptor table: everything a dispatch needs, frozen together.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::client::{LocalExecutor, ProxyClient};
use crate::descriptor::{
    create_descriptors, read_function_metadata, read_proxy_metadata, FunctionDescriptor,
    FunctionKind, LocalFunctionDescriptorProvider, ProxyDescriptorProvider,
};
use crate::functions::FunctionRegistry;
use crate::routing::{name_key, RouteMatch, RouteMatcher, RouteStore, TieBreak};

/// Immutable snapshot of routes and descriptors.
///
/// Swapped as a whole on reload; in-flight dispatches keep the snapshot
/// they started with.
#[derive(Debug)]
pub struct DescriptorTable {
    store: Arc<RouteStore>,
    matcher: RouteMatcher,
    descriptors: Vec<Arc<FunctionDescriptor>>,
    /// Lower-cased name -> descriptor, one map per kind.
    proxies: HashMap<String, Arc<FunctionDescriptor>>,
    locals: HashMap<String, Arc<FunctionDescriptor>>,
}

impl DescriptorTable {
    pub fn build(
        store: RouteStore,
        tie_break: TieBreak,
        client: Arc<dyn ProxyClient>,
        executor: Arc<dyn LocalExecutor>,
        functions: &FunctionRegistry,
    ) -> Self {
        let store = Arc::new(store);
        let proxy_provider = ProxyDescriptorProvider::new(&store, client, executor);
        let local_provider = LocalFunctionDescriptorProvider::new(functions.clone());

        let mut metadata = read_proxy_metadata(&store);
        metadata.extend(read_function_metadata(functions));

        let descriptors: Vec<Arc<FunctionDescriptor>> =
            create_descriptors(&metadata, &[&proxy_provider, &local_provider])
                .into_iter()
                .map(Arc::new)
                .collect();

        let mut proxies = HashMap::new();
        let mut locals = HashMap::new();
        for descriptor in &descriptors {
            let map = match descriptor.kind() {
                FunctionKind::Proxy => &mut proxies,
                FunctionKind::Http => &mut locals,
            };
            map.insert(name_key(descriptor.name()), descriptor.clone());
        }

        Self {
            matcher: RouteMatcher::new(store.clone(), tie_break),
            store,
            descriptors,
            proxies,
            locals,
        }
    }

    pub fn store(&self) -> &RouteStore {
        &self.store
    }

    pub fn descriptors(&self) -> &[Arc<FunctionDescriptor>] {
        &self.descriptors
    }

    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.matcher.find(method, path)
    }

    pub fn proxy(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.proxies.get(&name_key(name)).cloned()
    }

    /// Resolve a name for the local executor: local functions shadow
    /// proxies of the same name.
    pub fn resolve_local(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        let key = name_key(name);
        self.locals
            .get(&key)
            .or_else(|| self.proxies.get(&key))
            .cloned()
    }
}
