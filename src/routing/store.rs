//! Route store: the immutable, validated set of proxy routes.
//!
//! # Responsibilities
//! - Turn raw `RouteConfig` entries into `RouteDefinition`s
//! - Assign ids to routes that omit them (in file order, never reusing a declared id)
//! - Reject duplicate ids/names and malformed methods, templates, backends
//!
//! # Design Decisions
//! - Fail fast: the first invalid route aborts the whole load
//! - Routes are kept sorted by id; lookups by name go through a map
//! - Names compare case-insensitively

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use url::Url;

use crate::config::RouteConfig;
use crate::routing::route::{name_key, BackendKind, HttpMethod, RouteDefinition};
use crate::routing::template::UrlTemplate;

/// Which unique field collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Id,
    Name,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateField::Id => f.write_str("id"),
            DuplicateField::Name => f.write_str("name"),
        }
    }
}

/// Errors raised while loading routes. Fatal at host start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("duplicate route {field} '{value}'")]
    Duplicate { field: DuplicateField, value: String },

    #[error("malformed route '{route}': {reason}")]
    Malformed { route: String, reason: String },
}

impl LoadError {
    fn malformed(route: &str, reason: impl ToString) -> Self {
        LoadError::Malformed {
            route: route.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Immutable set of routes, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct RouteStore {
    routes: Vec<RouteDefinition>,
    by_name: HashMap<String, usize>,
}

impl RouteStore {
    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn nth(&self, index: usize) -> Option<&RouteDefinition> {
        self.routes.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&RouteDefinition> {
        self.by_name
            .get(&name_key(name))
            .map(|&i| &self.routes[i])
    }

    pub fn get_by_id(&self, id: u32) -> Option<&RouteDefinition> {
        self.routes
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.routes[i])
    }
}

/// Load and validate routes.
///
/// Routes without an id get the lowest id above every id seen so far that
/// no route in `source` declares explicitly.
pub fn load_routes(source: &[RouteConfig]) -> Result<RouteStore, LoadError> {
    let explicit: HashSet<u32> = source.iter().filter_map(|r| r.id).collect();
    let mut routes: Vec<RouteDefinition> = Vec::with_capacity(source.len());
    let mut ids = HashSet::with_capacity(source.len());
    let mut names = HashSet::with_capacity(source.len());
    // `None` once an id of u32::MAX has been seen.
    let mut next_id: Option<u32> = Some(1);

    for raw in source {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(LoadError::malformed("<unnamed>", "route name is empty"));
        }

        let id = match raw.id {
            Some(id) => id,
            None => next_free_id(next_id, &explicit)
                .ok_or_else(|| LoadError::malformed(name, "no route id left to assign"))?,
        };
        next_id = match (next_id, id.checked_add(1)) {
            (Some(current), Some(after)) => Some(current.max(after)),
            _ => None,
        };

        let method: HttpMethod = raw
            .method
            .parse()
            .map_err(|e| LoadError::malformed(name, e))?;
        let template = UrlTemplate::parse(&raw.url_template)
            .map_err(|e| LoadError::malformed(name, e))?;
        let backend = parse_backend(name, raw)?;

        if !ids.insert(id) {
            return Err(LoadError::Duplicate {
                field: DuplicateField::Id,
                value: id.to_string(),
            });
        }
        if !names.insert(name_key(name)) {
            return Err(LoadError::Duplicate {
                field: DuplicateField::Name,
                value: name.to_string(),
            });
        }

        routes.push(RouteDefinition {
            id,
            method,
            name: name.to_string(),
            template,
            backend,
        });
    }

    routes.sort_by_key(|r| r.id);
    let by_name = routes
        .iter()
        .enumerate()
        .map(|(i, r)| (name_key(&r.name), i))
        .collect();

    tracing::debug!(count = routes.len(), "Routes loaded");
    Ok(RouteStore { routes, by_name })
}

fn next_free_id(mut candidate: Option<u32>, taken: &HashSet<u32>) -> Option<u32> {
    loop {
        let id = candidate?;
        if !taken.contains(&id) {
            return Some(id);
        }
        candidate = id.checked_add(1);
    }
}

fn parse_backend(name: &str, raw: &RouteConfig) -> Result<BackendKind, LoadError> {
    match (&raw.backend_uri, &raw.local_function) {
        (Some(uri), None) => {
            let parsed = Url::parse(uri.trim())
                .map_err(|e| LoadError::malformed(name, format!("invalid backend_uri: {}", e)))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(LoadError::malformed(
                    name,
                    format!("unsupported backend scheme '{}'", parsed.scheme()),
                ));
            }
            Ok(BackendKind::Remote {
                uri: uri.trim().to_string(),
            })
        }
        (None, Some(function)) if !function.trim().is_empty() => Ok(BackendKind::Local {
            function: function.trim().to_string(),
        }),
        (None, Some(_)) => Err(LoadError::malformed(name, "local_function is empty")),
        (Some(_), Some(_)) => Err(LoadError::malformed(
            name,
            "backend_uri and local_function are mutually exclusive",
        )),
        (None, None) => Err(LoadError::malformed(
            name,
            "one of backend_uri or local_function is required",
        )),
    }
}
