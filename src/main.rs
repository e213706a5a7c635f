use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;

use roster::logging::init_tracing;
use roster::metrics::{init_metrics, metrics_app};
use roster::router::init_router;
use roster::state::init_app_state;
use roster_config::DatabaseConfig;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster - class and membership service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, env = "ROSTER_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,

        /// Apply pending database migrations before serving
        #[arg(long)]
        migrate: bool,
    },
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("failed to initialize logging")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr, migrate } => serve(addr, migrate).await,
        Commands::Migrate => {
            let pool = roster_db::init_db_pool(&DatabaseConfig::from_env())
                .await
                .context("failed to connect to database")?;
            roster_db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            Ok(())
        }
    }
}

async fn serve(addr: SocketAddr, migrate: bool) -> anyhow::Result<()> {
    let state = init_app_state(migrate)
        .await
        .context("failed to initialize application state")?;

    let mut app = init_router(state);
    if let Some(handle) = init_metrics().context("failed to install metrics recorder")? {
        app = app.merge(metrics_app(handle));
        info!("Prometheus metrics available at /metrics");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Server running");
    info!("Scalar UI available at http://{addr}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
