//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets (the
//! scores API key and the messaging bot token) are NOT in the file —
//! they come from environment variables at startup. All endpoints and
//! tunables are externalized here; nothing is hardcoded in the domain
//! layer.

pub mod loader;

use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the service begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and metadata.
  pub bot: BotConfig,
  /// Score feed endpoint and polling cadence.
  pub score_feed: ScoreFeedConfig,
  /// Chat-platform messaging gateway.
  pub messaging: MessagingConfig,
  /// XP deltas for settled bets.
  #[serde(default)]
  pub progression: ProgressionConfig,
  /// Ledger persistence.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Admin/health HTTP server.
  #[serde(default)]
  pub admin: AdminConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Enable dry-run mode (settlements computed, no messages sent).
  #[serde(default)]
  pub dry_run: bool,
}

/// Score feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreFeedConfig {
  /// Scores provider base URL.
  pub base_url: String,
  /// Seconds between scheduled settlement cycles.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum retries within one fetch.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (milliseconds, doubled per attempt).
  #[serde(default = "default_retry_delay")]
  pub retry_base_delay_ms: u64,
}

/// Messaging gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
  /// Chat platform REST base URL.
  pub base_url: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum DM sends per second.
  #[serde(default = "default_dm_rate")]
  pub requests_per_second: u32,
}

/// XP award configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionConfig {
  /// XP awarded for a winning bet.
  #[serde(default = "default_xp_win")]
  pub xp_per_win: u64,
  /// XP awarded for a losing bet.
  #[serde(default = "default_xp_loss")]
  pub xp_per_loss: u64,
}

impl Default for ProgressionConfig {
  fn default() -> Self {
    Self {
      xp_per_win: default_xp_win(),
      xp_per_loss: default_xp_loss(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for ledger snapshots and the settlement audit log.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// Admin/health server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  /// Bind address for /live, /ready, /metrics, and the manual trigger.
  #[serde(default = "default_admin_addr")]
  pub bind_address: String,
}

impl Default for AdminConfig {
  fn default() -> Self {
    Self {
      bind_address: default_admin_addr(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_poll_interval() -> u64 {
  60
}

fn default_timeout() -> u64 {
  30
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_delay() -> u64 {
  200
}

fn default_dm_rate() -> u32 {
  5
}

fn default_xp_win() -> u64 {
  crate::domain::progression::XP_PER_WIN
}

fn default_xp_loss() -> u64 {
  crate::domain::progression::XP_PER_LOSS
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_admin_addr() -> String {
  "0.0.0.0:9090".to_string()
}
