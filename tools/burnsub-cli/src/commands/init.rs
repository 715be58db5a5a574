//! Write a configuration file with default settings.

use burnsub_common::config::{config_file_path, AppConfig};

pub fn run(force: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if path.exists() && !force {
        println!("Config already exists: {}", path.display());
        println!("  Use --force to overwrite it with defaults.");
        return Ok(());
    }

    AppConfig::default()
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {e}", path.display()))?;

    println!("Config written: {}", path.display());
    Ok(())
}
