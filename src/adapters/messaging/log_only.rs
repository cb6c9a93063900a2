//! Log-only Messenger - Dry-run Adapter for the Messenger Port
//!
//! Records every message as a structured log line instead of delivering
//! it. Used in dry-run mode and as a lightweight test double.

use async_trait::async_trait;
use tracing::info;

use crate::domain::bet::UserId;
use crate::ports::messenger::Messenger;

/// Messenger that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessenger;

impl LogMessenger {
  /// Create a log-only messenger.
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl Messenger for LogMessenger {
  async fn send_direct(&self, user_id: &UserId, content: &str) -> anyhow::Result<()> {
    info!(user_id = %user_id, content = %content, "DM (log-only)");
    Ok(())
  }

  async fn is_healthy(&self) -> bool {
    true
  }
}
