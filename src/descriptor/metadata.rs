//! Function metadata.
//!
//! Metadata is the declarative half of a descriptor: what a function is
//! called and what kind of provider can compile it. One stream of metadata
//! feeds every provider; each provider claims only its own kind.

use serde::Serialize;

use crate::routing::{HttpMethod, RouteDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// A proxy route.
    Proxy,
    /// An in-host HTTP function.
    Http,
}

/// Metadata of a proxy route. Created once from a route, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyMetadata {
    pub route_id: u32,
    pub name: String,
    pub method: HttpMethod,
    pub url_template: String,
}

impl From<&RouteDefinition> for ProxyMetadata {
    fn from(route: &RouteDefinition) -> Self {
        Self {
            route_id: route.id,
            name: route.name.clone(),
            method: route.method,
            url_template: route.template.as_str().to_string(),
        }
    }
}

/// Metadata of a registered local function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalFunctionMetadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FunctionMetadata {
    Proxy(ProxyMetadata),
    Http(LocalFunctionMetadata),
}

impl FunctionMetadata {
    pub fn name(&self) -> &str {
        match self {
            FunctionMetadata::Proxy(m) => &m.name,
            FunctionMetadata::Http(m) => &m.name,
        }
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            FunctionMetadata::Proxy(_) => FunctionKind::Proxy,
            FunctionMetadata::Http(_) => FunctionKind::Http,
        }
    }

    pub fn as_proxy(&self) -> Option<&ProxyMetadata> {
        match self {
            FunctionMetadata::Proxy(m) => Some(m),
            FunctionMetadata::Http(_) => None,
        }
    }
}
