//! geozone - country and organization IP zones from the IPinfo lite database

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use geozone::cli::{Cli, Commands, ConfigAction};
use geozone::config::Config;
use geozone::extract::RECORD_LOG_TARGET;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or_default();

    if let Commands::Version = command {
        println!("geozone {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = geozone::commands::resolve_config(&cli)?;

    let writes_zones = matches!(command, Commands::Run { .. } | Commands::Extract);
    init_logging(&cli, &config, writes_zones)?;

    match command {
        Commands::Run {
            force_download,
            skip_download,
        } => geozone::commands::run::run(&config, force_download, skip_download).await,
        Commands::Fetch { force } => geozone::commands::fetch::run(&config, force)
            .await
            .map(|_| ()),
        Commands::Extract => geozone::commands::extract::run(&config),
        Commands::Config {
            action: ConfigAction::Init { path, force },
        } => geozone::commands::config::init(&config, &path, force),
        Commands::Version => Ok(()),
    }
}

/// Console logging, plus the record log when zones are being written
fn init_logging(cli: &Cli, config: &Config, record_log: bool) -> Result<()> {
    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let console = fmt::layer().with_target(false).with_filter(
        Targets::new()
            .with_default(log_level)
            .with_target(RECORD_LOG_TARGET, LevelFilter::OFF),
    );

    let records = match (&config.record_log, record_log) {
        (Some(path), true) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to open record log {:?}", path))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_level(false)
                    .without_time()
                    .with_filter(Targets::new().with_target(RECORD_LOG_TARGET, Level::INFO)),
            )
        }
        _ => None,
    };

    let subscriber = tracing_subscriber::registry().with(console).with(records);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
