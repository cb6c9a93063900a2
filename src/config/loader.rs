//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    name = %config.bot.name,
    poll_interval = config.score_feed.poll_interval_seconds,
    dry_run = config.bot.dry_run,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty endpoint URLs
/// - Positive polling and timeout values
/// - Bounded retry counts
/// - Sensible XP deltas (a win must outrank a loss)
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Identity
  anyhow::ensure!(!config.bot.name.is_empty(), "bot.name must not be empty");

  // Score feed validation
  anyhow::ensure!(
    !config.score_feed.base_url.is_empty(),
    "score_feed.base_url must not be empty"
  );
  anyhow::ensure!(
    config.score_feed.poll_interval_seconds > 0,
    "score_feed.poll_interval_seconds must be positive"
  );
  anyhow::ensure!(
    config.score_feed.timeout_seconds > 0,
    "score_feed.timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.score_feed.max_retries <= 10,
    "score_feed.max_retries must be at most 10, got {}",
    config.score_feed.max_retries
  );

  // Messaging validation
  anyhow::ensure!(
    !config.messaging.base_url.is_empty(),
    "messaging.base_url must not be empty"
  );
  anyhow::ensure!(
    config.messaging.requests_per_second > 0
      && config.messaging.requests_per_second <= 50,
    "messaging.requests_per_second must be in (0, 50], got {}",
    config.messaging.requests_per_second
  );

  // Progression validation
  anyhow::ensure!(
    config.progression.xp_per_loss > 0,
    "progression.xp_per_loss must be positive"
  );
  anyhow::ensure!(
    config.progression.xp_per_win > config.progression.xp_per_loss,
    "progression.xp_per_win ({}) must exceed xp_per_loss ({})",
    config.progression.xp_per_win,
    config.progression.xp_per_loss
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );

  // Admin validation
  anyhow::ensure!(
    !config.admin.bind_address.is_empty(),
    "admin.bind_address must not be empty"
  );

  Ok(())
}
