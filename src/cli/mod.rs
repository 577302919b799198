//! CLI interface for lme-prices
//!
//! Provides subcommands for:
//! - `resolve`: Run one resolution and persist the result
//! - `status`: Show the stored values
//! - `config`: Show the effective fallback chains

mod resolve;
mod status;

pub use resolve::{build_resolver, ResolveArgs};
pub use status::{print_config, print_status};

use crate::config::Config;
use clap::{Parser, Subcommand};

/// Configuration used when no config file exists
pub const EXAMPLE_CONFIG: &str = include_str!("../../config.toml.example");

#[derive(Parser, Debug)]
#[command(name = "lme-prices")]
#[command(about = "Resolve base metal prices from a fallback chain of unreliable sources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve prices and update the store
    Resolve(ResolveArgs),
    /// Show stored values and provenance
    Status,
    /// Show configured commodities and source order
    Config,
}

/// Load the configuration for a command.
///
/// A missing file falls back to [`EXAMPLE_CONFIG`]. Other load errors are
/// fatal for `resolve`, which writes the store; read-only commands fall back.
pub fn load_config(path: &str, command: &Commands) -> anyhow::Result<Config> {
    match Config::load(path) {
        Ok(config) => Ok(config),
        Err(e) if is_not_found(&e) || !matches!(command, Commands::Resolve(_)) => {
            eprintln!("Warning: Could not load config from {}: {:#}", path, e);
            eprintln!("Using default configuration");
            Config::from_toml(EXAMPLE_CONFIG)
        }
        Err(e) => Err(e),
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}
