//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the proxy client and the function host in dependency order
//! - Start the routes watcher when enabled
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A routes watcher that fails to start is logged, not fatal
//! - Listeners start last (traffic only when ready), in `main`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::{HttpProxyClientGenerator, ProxyClient, ProxyClientGenerator};
use crate::config::{load_config, ConfigError, HostConfig, RoutesWatcher};
use crate::functions::FunctionRegistry;
use crate::host::FunctionHost;
use crate::routing::LoadError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid route table: {0}")]
    Routes(#[from] LoadError),
}

/// Everything `main` needs to start serving.
pub struct Startup {
    pub config: HostConfig,
    pub host: FunctionHost,
    pub client_updates: mpsc::UnboundedReceiver<Arc<dyn ProxyClient>>,
    /// Keeps the routes watcher alive; `None` when watching is off.
    pub watcher: Option<RecommendedWatcher>,
}

/// Read `config_path`, optionally overriding the routes root.
pub fn load_host_config(
    config_path: &Path,
    root_override: Option<PathBuf>,
) -> Result<HostConfig, StartupError> {
    let mut config = if config_path.exists() {
        load_config(config_path)?
    } else {
        tracing::warn!(path = ?config_path, "Config file not found, using defaults");
        HostConfig::default()
    };
    if let Some(root) = root_override {
        config.host.root_path = root.to_string_lossy().into_owned();
    }
    Ok(config)
}

/// Build a host serving the routes found under the configured root.
pub fn build_host(
    config: &HostConfig,
    generator: &dyn ProxyClientGenerator,
    functions: FunctionRegistry,
) -> Result<FunctionHost, StartupError> {
    let client = generator.create_client(Path::new(&config.host.root_path))?;
    let host = FunctionHost::start(client, functions, config.routing.tie_break)?;
    Ok(host)
}

/// Build the host with the default HTTP proxy client and built-in
/// functions, and start watching the routes file.
pub fn start(config: HostConfig) -> Result<Startup, StartupError> {
    let generator = Arc::new(HttpProxyClientGenerator::new(config.client.clone()));
    let host = build_host(&config, generator.as_ref(), FunctionRegistry::with_builtins())?;

    let root = PathBuf::from(&config.host.root_path);
    let (client_updates, watcher) = if config.host.watch_routes {
        let (watcher, rx) = RoutesWatcher::new(&root, generator);
        match watcher.run() {
            Ok(watcher) => (rx, Some(watcher)),
            Err(e) => {
                tracing::error!(error = %e, path = ?root, "Failed to start routes watcher");
                (rx, None)
            }
        }
    } else {
        (mpsc::unbounded_channel().1, None)
    };

    Ok(Startup {
        config,
        host,
        client_updates,
        watcher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::routes_path;

    #[test]
    fn test_build_host_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            routes_path(dir.path()),
            r#"
[[routes]]
name = "svc"
url_template = "/svc"
backend_uri = "http://localhost:9000/svc"
"#,
        )
        .unwrap();

        let config = load_host_config(Path::new("does-not-exist.toml"), Some(dir.path().into()))
            .unwrap();
        let generator = HttpProxyClientGenerator::default();
        let host = build_host(&config, &generator, FunctionRegistry::new()).unwrap();
        assert!(host.descriptor("svc").is_some());
    }

    #[test]
    fn test_duplicate_routes_fail_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            routes_path(dir.path()),
            r#"
[[routes]]
id = 1
name = "a"
url_template = "/a"
backend_uri = "http://localhost:9000/a"

[[routes]]
id = 1
name = "b"
url_template = "/b"
backend_uri = "http://localhost:9000/b"
"#,
        )
        .unwrap();

        let mut config = HostConfig::default();
        config.host.root_path = dir.path().to_string_lossy().into_owned();
        let err = build_host(&config, &HttpProxyClientGenerator::default(), FunctionRegistry::new())
            .unwrap_err();
        assert!(matches!(err, StartupError::Routes(LoadError::Duplicate { .. })));
    }
}
