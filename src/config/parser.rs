use super::Config;
use crate::notify::KNOWN_NOTIFIERS;
use anyhow::{Context, Result};
use std::path::Path;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    config.watch.interval()?;

    if config.watch.threads == 0 {
        anyhow::bail!("Watch threads must be at least 1");
    }
    if config.watch.threads > crate::utils::thread_pool::MAX_SCAN_THREADS {
        anyhow::bail!(
            "Watch threads cannot exceed {}",
            crate::utils::thread_pool::MAX_SCAN_THREADS
        );
    }

    if config.watch.max_cycles == Some(0) {
        anyhow::bail!("Watch max_cycles must be at least 1");
    }

    for name in &config.notify.notifiers {
        if !KNOWN_NOTIFIERS.contains(&name.as_str()) {
            anyhow::bail!(
                "Unknown notifier '{name}' (expected one of: {})",
                KNOWN_NOTIFIERS.join(", ")
            );
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        anyhow::bail!("Unknown logging level: {}", config.logging.level);
    }

    Ok(())
}
