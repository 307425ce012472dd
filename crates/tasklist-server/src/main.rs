//! Process bootstrap: load config, connect the store, spawn the work team
//! and the admin HTTP server, wire signal handling to a root cancellation
//! token.

mod cli;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use tasklist_core::{Config, NoopRunner};
use tasklist_worker::{TaskListCoordinator, Workteam};

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_telemetry();

    let cli = cli::Cli::parse();
    let config = match Config::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(error = %err, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.workers as u32 + 4)
        .connect(&config.tasklist.url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to store");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = match TaskListCoordinator::connect(pool).await {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize coordinator");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let runner = Arc::new(NoopRunner);
    let team = Workteam::spawn(config.workers, coordinator.clone(), runner, shutdown.clone());

    let router = tasklist_api::build_router(coordinator.clone());
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(l) => l,
        Err(err) => {
            tracing::error!(error = %err, port = config.port, "failed to bind admin API port");
            return ExitCode::FAILURE;
        }
    };

    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    wait_for_termination_signal().await;
    tracing::info!("shutdown signal received, stopping");
    shutdown.cancel();

    team.wait().await;
    let _ = server.await;
    coordinator.close().await;

    ExitCode::SUCCESS
}

/// Resolves on the first of SIGINT or SIGTERM.
async fn wait_for_termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
