use crate::cli::output::Output;
use crate::config::{CliOverrides, GistwatchConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod findings;
pub mod scan;
pub mod serve;
pub mod status;
pub mod watch;

#[derive(Parser)]
#[command(
    name = "gistwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch public gists for leaked secrets",
    long_about = "gistwatch polls the public gist feed, inspects new files for secret-looking \
                  lines and records every finding once in a local SQLite database, with a small \
                  read view to page through them."
)]
pub struct Cli {
    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Database file (overrides storage.path)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// API token for the gist feed
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Account name sent with the token as basic auth
    #[arg(long, env = "GITHUB_USERNAME", global = true)]
    pub username: Option<String>,

    /// Seconds between scan cycles (overrides scan.interval_secs)
    #[arg(long, value_name = "SECS", global = true)]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the feed on a fixed interval until interrupted
    Watch(watch::WatchArgs),
    /// Run a single scan cycle and print its report
    Scan(scan::ScanArgs),
    /// Serve the read view only
    Serve(serve::ServeArgs),
    /// Print one page of recorded findings
    Findings(findings::FindingsArgs),
    /// Show checkpoint and database counters
    Status(status::StatusArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        let overrides = CliOverrides {
            db: self.db,
            token: self.token,
            username: self.username,
            interval_secs: self.interval,
        };
        let config = GistwatchConfig::load_with_overrides(self.config.as_deref(), &overrides)?;

        match self.command {
            Commands::Watch(args) => watch::execute(args, config, &output).await,
            Commands::Scan(args) => scan::execute(args, config, &output).await,
            Commands::Serve(args) => serve::execute(args, config, &output).await,
            Commands::Findings(args) => findings::execute(args, config, &output).await,
            Commands::Status(args) => status::execute(args, config, &output).await,
            Commands::Config(args) => config::execute(args, config, self.config.as_deref(), &output),
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            return tracing_subscriber::EnvFilter::new("error");
        }
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn,gistwatch=info"),
            1 => tracing_subscriber::EnvFilter::new("warn,gistwatch=debug"),
            _ => tracing_subscriber::EnvFilter::new("info,gistwatch=trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves on the first Ctrl-C
pub(crate) async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Interrupt received, finishing the current cycle"),
        Err(e) => {
            tracing::error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
