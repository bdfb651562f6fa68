//! Routes file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::client::{ProxyClient, ProxyClientGenerator};
use crate::config::loader::{routes_path, ROUTES_FILE};

/// Watches `<root_path>/proxies.toml` and publishes a fresh proxy client
/// for every successful re-read.
pub struct RoutesWatcher {
    root_path: PathBuf,
    generator: Arc<dyn ProxyClientGenerator>,
    update_tx: mpsc::UnboundedSender<Arc<dyn ProxyClient>>,
}

impl RoutesWatcher {
    /// Returns the watcher and a receiver for proxy client updates.
    pub fn new(
        root_path: &Path,
        generator: Arc<dyn ProxyClientGenerator>,
    ) -> (Self, mpsc::UnboundedReceiver<Arc<dyn ProxyClient>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                root_path: root_path.to_path_buf(),
                generator,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread. Dropping the returned
    /// watcher stops it.
    ///
    /// The root directory is watched rather than the file so editors that
    /// replace the file on save are still seen.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let root = self.root_path.clone();
        let generator = self.generator.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_routes = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().is_some_and(|n| n == ROUTES_FILE));
                    if !touches_routes
                        || !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove())
                    {
                        return;
                    }
                    tracing::info!(path = ?routes_path(&root), "Routes file change detected, reloading");
                    match generator.create_client(&root) {
                        Ok(client) => {
                            let _ = tx.send(client);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload routes, keeping current routes");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.root_path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.root_path, "Routes watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpProxyClientGenerator;

    #[tokio::test]
    async fn test_publishes_client_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(HttpProxyClientGenerator::default());
        let (watcher, mut rx) = RoutesWatcher::new(dir.path(), generator);
        let _watcher = watcher.run().unwrap();

        std::fs::write(
            routes_path(dir.path()),
            r#"
[[routes]]
id = 1
method = "GET"
name = "svc"
url_template = "/svc"
backend_uri = "http://localhost:9000/svc"
"#,
        )
        .unwrap();

        // The create event may be seen before the content lands.
        let routes = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let client = rx.recv().await.unwrap();
                if !client.routes().is_empty() {
                    return client.routes();
                }
            }
        })
        .await
        .expect("watcher should publish the new routes");
        assert_eq!(routes[0].name, "svc");
    }
}
