//! Route definitions.
//!
//! # Responsibilities
//! - Represent a validated, immutable proxy route
//! - Parse HTTP methods (fixed set plus wildcard)
//! - Describe where a route sends its traffic (remote backend or local function)

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use serde::Serialize;

use crate::routing::template::UrlTemplate;

/// HTTP method accepted by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
    /// Matches every inbound method.
    Any,
}

impl HttpMethod {
    /// Returns true if an inbound request with `method` is accepted.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            HttpMethod::Any => true,
            HttpMethod::Get => method == Method::GET,
            HttpMethod::Post => method == Method::POST,
            HttpMethod::Put => method == Method::PUT,
            HttpMethod::Delete => method == Method::DELETE,
            HttpMethod::Patch => method == Method::PATCH,
            HttpMethod::Head => method == Method::HEAD,
            HttpMethod::Options => method == Method::OPTIONS,
            HttpMethod::Trace => method == Method::TRACE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Any => "*",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            "*" | "ANY" => Ok(HttpMethod::Any),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Case-insensitive lookup key for route and function names.
///
/// Every name map keys on this, and duplicate detection compares it.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Where a route's traffic is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Forward to a remote HTTP backend. `uri` may contain `{param}` placeholders.
    Remote { uri: String },
    /// Run an in-host function instead of calling out.
    Local { function: String },
}

impl BackendKind {
    pub fn is_local(&self) -> bool {
        matches!(self, BackendKind::Local { .. })
    }
}

/// A validated proxy route. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    /// Unique id; lower ids were registered first.
    pub id: u32,
    pub method: HttpMethod,
    /// Unique route name, also the function name of its descriptor.
    pub name: String,
    pub template: UrlTemplate,
    pub backend: BackendKind,
}
