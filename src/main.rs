//! proxy-dispatch binary: load config, start the function host, serve.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use proxy_dispatch::http::HttpServer;
use proxy_dispatch::lifecycle::{self, signals::shutdown_signal, Shutdown};
use proxy_dispatch::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "proxy-dispatch", version, about = "Serve proxy routes as functions")]
struct Cli {
    /// Host configuration file.
    #[arg(short, long, default_value = "proxy-host.toml")]
    config: PathBuf,

    /// Directory holding proxies.toml; overrides host.root_path.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Validate config and routes, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = lifecycle::load_host_config(&cli.config, cli.root)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        root_path = %config.host.root_path,
        "proxy-dispatch starting"
    );

    let startup = lifecycle::start(config)?;
    if cli.check {
        let table = startup.host.table();
        tracing::info!(
            routes = table.store().len(),
            descriptors = table.descriptors().len(),
            "Configuration OK"
        );
        return Ok(());
    }

    if startup.config.observability.metrics_enabled {
        match startup.config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %startup.config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&startup.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let _watcher = startup.watcher;
    let server = HttpServer::new(startup.config, startup.host);
    server
        .run(listener, startup.client_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
