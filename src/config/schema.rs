//! Configuration schema definitions.
//!
//! Two files feed the host:
//! - the host config (`proxy-host.toml`): listener, client, routing, logging
//! - the routes file (`<root_path>/proxies.toml`): the proxy route table
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::TieBreak;

/// Root configuration for the proxy host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Function host settings (routes root, teardown, body limits).
    pub host: HostSettings,

    /// Outbound proxy client settings.
    pub client: ClientConfig,

    /// Route matching policy.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Function host settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSettings {
    /// Directory containing `proxies.toml`.
    pub root_path: String,

    /// Time allowed for in-flight invocations to finish after teardown begins.
    pub drain_timeout_secs: u64,

    /// Largest inbound request body buffered for dispatch.
    pub max_body_bytes: usize,

    /// Reload routes when `proxies.toml` changes.
    pub watch_routes: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            root_path: ".".to_string(),
            drain_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
            watch_routes: true,
        }
    }
}

/// Outbound proxy client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for a backend call in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Route matching configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Which route wins when several templates match.
    pub tie_break: TieBreak,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Contents of the routes file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyData {
    pub routes: Vec<RouteConfig>,
}

/// A raw route entry, validated later by `routing::load_routes`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route id. Assigned at load time when omitted.
    #[serde(default)]
    pub id: Option<u32>,

    /// HTTP method, or `*` for any.
    #[serde(default = "default_method")]
    pub method: String,

    /// Unique route name.
    pub name: String,

    /// URL template, e.g. `/api/{*rest}`.
    pub url_template: String,

    /// Remote backend URI; may reference template params as `{name}`.
    #[serde(default)]
    pub backend_uri: Option<String>,

    /// In-host function to run instead of a remote call.
    #[serde(default)]
    pub local_function: Option<String>,
}

fn default_method() -> String {
    "*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_host_config() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.routing.tie_break, TieBreak::LowestId);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_host_config() {
        let config: HostConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:7071"

            [host]
            root_path = "/srv/proxies"
            drain_timeout_secs = 5

            [client]
            request_timeout_secs = 2

            [routing]
            tie_break = "most_recent"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:7071");
        assert_eq!(config.host.root_path, "/srv/proxies");
        assert_eq!(config.host.drain_timeout_secs, 5);
        assert_eq!(config.host.max_body_bytes, 1024 * 1024);
        assert_eq!(config.client.request_timeout_secs, 2);
        assert_eq!(config.client.connect_timeout_secs, 5);
        assert_eq!(config.routing.tie_break, TieBreak::MostRecent);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_routes_file() {
        let data: ProxyData = toml::from_str(
            r#"
            [[routes]]
            id = 1001
            method = "GET"
            name = "test"
            url_template = "/myproxy"
            backend_uri = "http://127.0.0.1:3000/api"

            [[routes]]
            name = "localFunction"
            url_template = "/mymockhttp"
            local_function = "echo"
            "#,
        )
        .unwrap();

        assert_eq!(data.routes.len(), 2);
        assert_eq!(data.routes[0].id, Some(1001));
        assert_eq!(data.routes[1].id, None);
        assert_eq!(data.routes[1].method, "*");
        assert_eq!(data.routes[1].local_function.as_deref(), Some("echo"));
    }
}
