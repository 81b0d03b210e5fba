//! CLI module for PMP Scientist
//!
//! Provides subcommands:
//! - `demo`: run sample experiments against the loaded settings
//! - `settings`: print the effective experiment settings

pub mod demo;
pub mod settings;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP Scientist - Run refactored code paths alongside the originals
#[derive(Parser)]
#[command(name = "pmp-scientist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run sample experiments and report matches and mismatches
    Demo(demo::DemoArgs),

    /// Print the effective experiment settings as JSON
    Settings,
}

fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::load()?)
}

fn init_logging(config: &AppConfig) {
    logging::init_logging(&config.logging);
}
