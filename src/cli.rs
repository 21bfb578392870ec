//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geozone")]
#[command(author, version, about = "Extract country and organization IP zones from the IPinfo lite database")]
#[command(propagate_version = true)]
pub struct Cli {
    /// What to do (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Output directory for zone files (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Download the database if needed, then write all zone files
    Run {
        /// Download even if the local database is from today
        #[arg(long, conflicts_with = "skip_download")]
        force_download: bool,

        /// Use the local database as is
        #[arg(long)]
        skip_download: bool,
    },

    /// Download the database only
    Fetch {
        /// Download even if the local database is from today
        #[arg(long)]
        force: bool,
    },

    /// Write zone files from the local database
    Extract,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Write the effective settings (defaults plus overrides) to a YAML file
    Init {
        /// Destination file
        #[arg(default_value = "geozone.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            force_download: false,
            skip_download: false,
        }
    }
}
