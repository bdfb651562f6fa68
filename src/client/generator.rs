//! Default proxy client factory.

use std::path::Path;
use std::sync::Arc;

use crate::client::{HttpProxyClient, ProxyClient, ProxyClientGenerator};
use crate::config::loader::{load_proxy_data, ConfigError};
use crate::config::ClientConfig;

/// Builds [`HttpProxyClient`]s from `<root_path>/proxies.toml`.
#[derive(Debug, Clone, Default)]
pub struct HttpProxyClientGenerator {
    config: ClientConfig,
}

impl HttpProxyClientGenerator {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ProxyClientGenerator for HttpProxyClientGenerator {
    fn create_client(&self, root_path: &Path) -> Result<Arc<dyn ProxyClient>, ConfigError> {
        let data = load_proxy_data(root_path)?;
        tracing::info!(
            root_path = ?root_path,
            routes = data.routes.len(),
            "Proxy client created"
        );
        Ok(Arc::new(HttpProxyClient::new(data.routes, &self.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::routes_path;

    #[test]
    fn test_creates_client_from_routes_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            routes_path(dir.path()),
            "[[routes]]\nid = 1001\nmethod = \"GET\"\nname = \"test\"\nurl_template = \"/myproxy\"\nbackend_uri = \"http://127.0.0.1:9/\"\n",
        )
        .unwrap();

        let client = HttpProxyClientGenerator::default()
            .create_client(dir.path())
            .unwrap();
        let routes = client.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, Some(1001));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(routes_path(dir.path()), "[[routes]\n").unwrap();
        assert!(matches!(
            HttpProxyClientGenerator::default().create_client(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
