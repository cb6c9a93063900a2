//! Settlement Guard - Per-matchup Single-flight Lock
//!
//! Wraps the ledger store's persisted in-progress flag behind a small
//! acquire/release API. The scheduled poll and a manual admin trigger can
//! both target the same matchup; whichever loses the compare-and-set
//! observes "in progress" and backs off as a logged no-op.
//!
//! Release is deliberately infallible at the call site: a failed unlock is
//! logged at error severity so an operator can clear the stuck flag, but it
//! never masks the settlement result that already happened.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::bet::MatchupId;
use crate::ports::ledger::LedgerStore;

/// Single-flight guard over a matchup's persisted in-progress flag.
pub struct SettlementGuard<S: LedgerStore> {
  store: Arc<S>,
}

impl<S: LedgerStore> SettlementGuard<S> {
  /// Create a guard backed by the given ledger store.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Whether a settlement is currently in flight for this matchup.
  pub async fn is_settling(&self, matchup_id: &MatchupId) -> anyhow::Result<bool> {
    self.store.is_locked(matchup_id).await
  }

  /// Try to take the lock. `false` means another settlement holds it.
  pub async fn try_acquire(&self, matchup_id: &MatchupId) -> anyhow::Result<bool> {
    let acquired = self.store.try_lock_matchup(matchup_id).await?;
    if acquired {
      debug!(matchup_id = %matchup_id, "Settlement lock acquired");
    } else {
      info!(
        matchup_id = %matchup_id,
        "Settlement already in progress, skipping"
      );
    }
    Ok(acquired)
  }

  /// Release the lock. Called on every exit path, success or failure.
  pub async fn release(&self, matchup_id: &MatchupId) {
    if let Err(e) = self.store.unlock_matchup(matchup_id).await {
      error!(
        matchup_id = %matchup_id,
        error = %e,
        "Failed to release settlement lock; matchup may be stuck"
      );
    } else {
      debug!(matchup_id = %matchup_id, "Settlement lock released");
    }
  }
}
