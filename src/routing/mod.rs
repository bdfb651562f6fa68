//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup / reload):
//!     RouteConfig[]
//!     → store.rs (validate, assign ids, reject duplicates)
//!     → template.rs (parse URL templates)
//!     → Freeze as immutable RouteStore
//!
//! Incoming Request (method, path)
//!     → matcher.rs (method + template match, tie-break policy)
//!     → Return: matched route + captured params, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment-wise template matching)
//! - Deterministic: same input always matches same route
//! - Overlaps resolved by an explicit, configurable tie-break

pub mod matcher;
pub mod route;
pub mod store;
pub mod template;

pub use matcher::{RouteMatch, RouteMatcher, TieBreak};
pub use route::{name_key, BackendKind, HttpMethod, RouteDefinition};
pub use store::{load_routes, DuplicateField, LoadError, RouteStore};
pub use template::{Segment, TemplateError, UrlTemplate};
