//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! proxy-host.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!
//! <root_path>/proxies.toml
//!     → loader.rs (ProxyData: raw route entries)
//!     → client generator → ProxyClient
//!
//! On change to proxies.toml:
//!     watcher.rs detects change
//!     → generator builds a new ProxyClient
//!     → host swaps its descriptor table
//! ```
//!
//! # Design Decisions
//! - Host config is immutable once loaded; only routes hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_proxy_data, routes_path, ConfigError, ROUTES_FILE};
pub use schema::{
    ClientConfig, HostConfig, HostSettings, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyData, RouteConfig, RoutingConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::RoutesWatcher;
