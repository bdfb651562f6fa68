//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (exact or wildcard)
//! - Match request path against the route's URL template
//! - Break ties between overlapping templates with an explicit policy
//!
//! # Design Decisions
//! - Routes are pre-ordered by the tie-break policy at construction,
//!   so the first match wins
//! - Matching is a linear scan; route tables are small
//! - Path matching is case-sensitive

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::routing::route::RouteDefinition;
use crate::routing::store::RouteStore;

/// Which route wins when several templates match the same request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest route id wins (first registered).
    #[default]
    LowestId,
    /// Highest route id wins (most recently registered).
    MostRecent,
}

/// A successful match.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDefinition,
    pub params: HashMap<String, String>,
}

/// Matches requests against a route store.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    store: Arc<RouteStore>,
    /// Indices into the store's id-ordered routes, in evaluation order.
    order: Vec<usize>,
    policy: TieBreak,
}

impl RouteMatcher {
    pub fn new(store: Arc<RouteStore>, policy: TieBreak) -> Self {
        let mut order: Vec<usize> = (0..store.len()).collect();
        if policy == TieBreak::MostRecent {
            order.reverse();
        }
        Self {
            store,
            order,
            policy,
        }
    }

    pub fn policy(&self) -> TieBreak {
        self.policy
    }

    /// Find the route for `method` and `path`, or `None` if nothing matches.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.order.iter().find_map(|&i| {
            let route = self.store.nth(i)?;
            if !route.method.accepts(method) {
                return None;
            }
            route
                .template
                .match_path(path)
                .map(|params| RouteMatch { route, params })
        })
    }
}
