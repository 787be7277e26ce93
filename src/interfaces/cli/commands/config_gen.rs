use colored::Colorize;

use crate::config::StaticConfig;
use crate::errors::{Result, SmartlinkerError};

pub fn config_gen(path: &str) -> Result<()> {
    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| SmartlinkerError::config(format!("Failed to write {}: {}", path, e)))?;

    println!(
        "{} Sample configuration written to {}",
        "✓".bold().green(),
        path.cyan()
    );
    Ok(())
}
