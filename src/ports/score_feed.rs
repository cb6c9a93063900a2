//! Score Feed Port - Completed Game Data Interface
//!
//! Defines the trait for pulling finished-game results from an external
//! scores provider. The feed is treated as untrusted and unreliable: a
//! fetch failure is transient and simply defers settlement to the next
//! scheduled tick.

use async_trait::async_trait;

use crate::domain::outcome::CompletedGame;

/// Trait for score data providers.
///
/// Implementors poll an HTTP scores endpoint (or serve canned fixtures in
/// tests) and return the games the provider currently reports as finished.
/// The hexagonal architecture ensures the settlement path never depends on
/// transport details.
#[async_trait]
pub trait ScoreFeed: Send + Sync + 'static {
  /// Fetch every game the provider reports as completed.
  ///
  /// Games that are still live may appear with `completed == false`;
  /// callers must filter. Errors are transient by definition — the next
  /// poll cycle retries naturally.
  async fn completed_games(&self) -> anyhow::Result<Vec<CompletedGame>>;

  /// Check if the feed endpoint is reachable.
  async fn is_healthy(&self) -> bool;
}
