//! Progression Tracker - XP Awards and Level-ups
//!
//! Awards fixed XP deltas per settled bet and recomputes the level as a
//! pure lookup over cumulative XP. Runs strictly post-commit: an XP or
//! level-up failure is the caller's to log, never the transaction's to
//! roll back. The level-up congratulation DM is best-effort on top.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::bet::UserId;
use crate::domain::progression::level_for_xp;
use crate::ports::ledger::LedgerStore;
use crate::ports::messenger::Messenger;

/// Result of one XP award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
  /// Cumulative XP after the award.
  pub xp: u64,
  /// Whether the award crossed a level threshold.
  pub leveled_up: bool,
  /// Level after the award.
  pub new_level: u32,
}

/// Awards experience for settled bets and handles level-up side effects.
pub struct ProgressionTracker<S: LedgerStore, M: Messenger> {
  store: Arc<S>,
  messenger: Arc<M>,
  xp_per_win: u64,
  xp_per_loss: u64,
  dry_run: bool,
}

impl<S: LedgerStore, M: Messenger> ProgressionTracker<S, M> {
  /// Create a tracker with the configured XP deltas.
  pub fn new(
    store: Arc<S>,
    messenger: Arc<M>,
    xp_per_win: u64,
    xp_per_loss: u64,
    dry_run: bool,
  ) -> Self {
    Self {
      store,
      messenger,
      xp_per_win,
      xp_per_loss,
      dry_run,
    }
  }

  /// Award XP for one settled bet and persist any level change.
  ///
  /// # Errors
  /// Store failures bubble up; the caller treats them as non-fatal side
  /// effects of an already committed settlement.
  pub async fn award(&self, user_id: &UserId, won: bool) -> anyhow::Result<Progression> {
    let delta = if won { self.xp_per_win } else { self.xp_per_loss };
    let account = self.store.add_xp(user_id, delta).await?;

    let new_level = level_for_xp(account.xp);
    if new_level <= account.level {
      debug!(
        user_id = %user_id,
        xp = account.xp,
        level = account.level,
        "XP awarded, no level change"
      );
      return Ok(Progression {
        xp: account.xp,
        leveled_up: false,
        new_level: account.level,
      });
    }

    self.store.set_level(user_id, new_level).await?;

    if self.dry_run {
      debug!(
        user_id = %user_id,
        new_level,
        "Dry-run: level-up notification suppressed"
      );
    } else {
      let content = format!("Level up! You are now level {new_level}.");
      if let Err(e) = self.messenger.send_direct(user_id, &content).await {
        warn!(
          user_id = %user_id,
          new_level,
          error = %e,
          "Failed to deliver level-up notification"
        );
      }
    }

    Ok(Progression {
      xp: account.xp,
      leveled_up: true,
      new_level,
    })
  }
}
