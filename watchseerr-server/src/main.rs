use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use watchseerr_config::{
    Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigWarnings,
};
use watchseerr_core::{OutcomeLog, SyncScheduler, TriggerOutcome};
use watchseerr_server::{
    create_app,
    infra::{app_context::AppContext, startup, telemetry},
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "watchseerr")]
#[command(
    about = "Sync a tracked watchlist into a Jellyseerr/Overseerr request queue"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "WATCHSEERR_CONFIG")]
    config: Option<PathBuf>,

    /// Path to an env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Run the scheduler and the HTTP query surface (default)
    Serve,
    /// Execute a single synchronization run and exit
    RunOnce,
    /// Print the last run's outcome log as JSON
    Requests,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cli = Cli::parse();
    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.config,
            env_file: cli.env_file,
        })
        .load()
        .context("failed to load configuration")?;
    log_warnings(&warnings);

    config.ensure_directories().with_context(|| {
        format!(
            "data directory {} is not usable",
            config.storage.data_dir.display()
        )
    })?;
    let config = Arc::new(config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::RunOnce => run_once(&config).await,
        Command::Requests => print_requests(&config),
    }
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
}

async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    let runner = Arc::new(startup::build_runner(&config)?);

    let scheduler = match config.tasks.sync_watchlist.cron() {
        Some(expr) => {
            Some(SyncScheduler::start(runner.clone(), expr.normalized()).await?)
        }
        None => None,
    };

    if config.server.enabled {
        let addr: SocketAddr =
            format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("invalid server host/port")?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!(%addr, "query surface listening");

        let ctx = AppContext::new(
            OutcomeLog::new(config.storage.outcome_path()),
            Some(runner),
        );
        axum::serve(listener, create_app(ctx))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;
    } else if scheduler.is_some() {
        shutdown_signal().await;
    }

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    info!("shutdown complete");
    Ok(())
}

async fn run_once(config: &Config) -> anyhow::Result<()> {
    let runner = startup::build_runner(config)?;
    match runner.trigger().await {
        TriggerOutcome::Completed(summary) => {
            info!(
                run_id = %summary.run_id,
                candidates = summary.candidates,
                statuses = ?summary.statuses,
                persisted = summary.persisted,
                "run complete"
            );
            Ok(())
        }
        TriggerOutcome::Skipped => Ok(()),
        TriggerOutcome::Failed(err) => {
            Err(err).context("synchronization run failed")
        }
    }
}

fn print_requests(config: &Config) -> anyhow::Result<()> {
    let rows = OutcomeLog::new(config.storage.outcome_path())
        .read()
        .context("failed to read outcome log")?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
