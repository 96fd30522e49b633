//! Training Admin Server
//!
//! Hosts the enrollment ledger REST API: loads configuration, connects to
//! the database, applies migrations and serves until Ctrl+C or SIGTERM.

mod config;
mod logging;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use clap::Parser;
use config::AppConfig;
use enrollment_ledger::api::rest::actor::resolve_gateway_actor;
use enrollment_ledger::EnrollmentLedgerModule;
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Debug, Parser)]
#[command(name = "training-admin-server", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{config:#?}");
        return Ok(());
    }

    logging::init(&config.logging)?;
    run(config).await
}

async fn run(config: AppConfig) -> Result<()> {
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .connect_timeout(config.database.connect_timeout)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;
    tracing::info!(backend = ?db.get_database_backend(), "database connected");

    let ledger = EnrollmentLedgerModule::new(db, config.ledger.clone());
    if config.database.run_migrations {
        ledger.migrate().await?;
    }

    let app = Router::new()
        .merge(ledger.router())
        .layer(middleware::from_fn(resolve_gateway_actor))
        .layer(TimeoutLayer::new(config.server.request_timeout))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "training admin server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    ledger.shutdown().await;
    tracing::info!("training admin server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("ctrl_c signal received"),
        () = terminate => tracing::info!("terminate signal received"),
    }
}
