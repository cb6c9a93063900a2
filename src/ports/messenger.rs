//! Messenger Port - Direct Message Delivery Interface
//!
//! Defines the trait for the chat-platform gateway that delivers
//! settlement results and level-up notices. Delivery is always
//! best-effort from the caller's point of view: the settlement path
//! logs and swallows every failure surfaced here.

use async_trait::async_trait;

use crate::domain::bet::UserId;

/// Trait for direct-message gateways.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
  /// Send a direct message to a user.
  ///
  /// An error means the user was unreachable (blocked DMs, left the
  /// server, gateway outage). Callers must treat it as non-fatal.
  async fn send_direct(&self, user_id: &UserId, content: &str) -> anyhow::Result<()>;

  /// Check if the gateway is reachable.
  async fn is_healthy(&self) -> bool;
}
