mod config;
mod logging;
mod server;
mod signals;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use config::{AppConfig, CliOverrides};

/// Booktest Gateway - HTTP/JSON front for the books.v1 gRPC service
#[derive(Parser)]
#[command(name = "booktest-gateway")]
#[command(about = "Booktest Gateway - HTTP/JSON front for the books.v1 gRPC service")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override (overrides config)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the gateway
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        bind: cli.bind,
        verbose: cli.verbose,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => check(&config),
    }
}

fn check(config: &AppConfig) -> Result<()> {
    tracing::info!("checking configuration");
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "booktest gateway starting");

    let cancel = CancellationToken::new();
    let cancel_for_signals = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::wait_for_shutdown().await {
            tracing::warn!(error = %e, "signal waiter failed, falling back to ctrl_c()");
            tokio::signal::ctrl_c().await.ok();
        }
        cancel_for_signals.cancel();
    });

    let router = server::build_router(&config).await?;
    server::serve(router, &config, cancel).await?;

    tracing::info!("booktest gateway stopped");
    Ok(())
}
