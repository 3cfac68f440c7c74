//! Stockwatch CLI
//!
//! Long-running entry point; environment variables override the TOML file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stockwatch::{
    error::Result,
    models::{Config, join_labels},
    pipeline::Monitor,
    storage,
};

/// Stockwatch - category feed stock monitor
#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    version,
    about = "Posts new products, restocks and sell-outs to a Telegram channel"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "STOCKWATCH_CONFIG", default_value = "stockwatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed until interrupted
    Run {
        /// Skip the keep-alive HTTP endpoint
        #[arg(long)]
        no_server: bool,
    },

    /// Run a single cycle and exit
    Once,

    /// Validate configuration
    Validate,

    /// Show configuration and snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(&cli.config);
    config.apply_env()?;
    if cli.dry_run {
        config.notifier.dry_run = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { no_server } => {
            config.validate()?;
            let config = Arc::new(config);

            #[cfg(feature = "server")]
            if config.server.enabled && !no_server {
                stockwatch::server::spawn(config.server.bind.clone());
            }
            #[cfg(not(feature = "server"))]
            let _ = no_server;

            let mut monitor = Monitor::from_config(Arc::clone(&config)).await?;
            monitor.run().await?;
        }

        Command::Once => {
            config.validate()?;
            let mut monitor = Monitor::from_config(Arc::new(config)).await?;
            let report = monitor.run_cycle().await?;
            log::info!("{}", report.summary_line());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Feed: {}", config.feed.url);
            log::info!(
                "Poll interval: {}s (+{}..{}s jitter)",
                config.poll.interval_secs,
                config.poll.jitter_min_secs,
                config.poll.jitter_max_secs
            );
            log::info!(
                "Notifier: {}",
                if config.notifier.dry_run {
                    "dry-run"
                } else if config.notifier.has_credentials() {
                    "telegram"
                } else {
                    "telegram (credentials missing)"
                }
            );

            let store = storage::open_store(&config.storage).await?;
            let snapshot = store.load().await?;
            log::info!(
                "Snapshot {}: {} products, {} available sizes",
                store.location(),
                snapshot.len(),
                snapshot.variant_count()
            );
            if cli.verbose {
                for (id, entry) in snapshot.iter() {
                    log::debug!("{} [{}]", id, join_labels(&entry.variants));
                }
            }
        }
    }

    Ok(())
}
