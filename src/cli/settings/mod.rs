//! Settings command - prints the effective configuration

use super::load_config;

/// Print the experiment settings resolved from files and environment
pub fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    println!("{}", serde_json::to_string_pretty(&config.experiment)?);
    Ok(())
}
