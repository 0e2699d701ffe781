#![forbid(unsafe_code)]

use clap::Parser;
use it_server::{AppContext, Config, build_router};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Internship record service. Settings come from `INTERNTRACK_*` variables
/// (and `.env`); flags override them.
#[derive(Debug, Parser)]
#[command(name = "interntrack", version)]
struct Cli {
    /// Listen port.
    #[arg(long)]
    port: Option<u16>,
    /// Bind address.
    #[arg(long)]
    bind: Option<IpAddr>,
    /// Directory for the account database, record file and local blobs.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Seed an empty record file from a legacy `.xlsx` workbook before serving.
    #[arg(long, value_name = "PATH")]
    import_workbook: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    let mut config = Config::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    config.log_summary();

    let address = SocketAddr::new(config.bind, config.port);
    let ctx = AppContext::open(config).await?;
    if let Some(workbook) = cli.import_workbook {
        let records = ctx.records.clone();
        match tokio::task::spawn_blocking(move || records.import_workbook(&workbook)).await? {
            Ok(outcome) => info!(
                imported = outcome.imported,
                skipped = outcome.skipped,
                "workbook import finished"
            ),
            Err(err) => warn!(error = %err, "workbook import not applied"),
        }
    }
    let app = build_router(ctx);

    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
