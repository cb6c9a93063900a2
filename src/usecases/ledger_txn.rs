//! Ledger Transaction - Atomic Settlement of a Matchup's Bets
//!
//! Walks every pending bet on a matchup sequentially, classifies it
//! against the resolved winner/loser, quotes winning payouts, and hands
//! the whole batch to the store for one atomic commit.
//!
//! Error scoping follows the settlement taxonomy strictly: a bad row
//! (unknown team, unquotable odds) is captured per bet and skipped so its
//! siblings still settle; only a store-level failure aborts the matchup.
//! Post-commit events for notification and XP are returned to the caller
//! and never touch the transaction itself.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::bet::{BetId, BetResult, Matchup, MatchupId, UserId};
use crate::domain::outcome::names_match;
use crate::domain::payout::PayoutCalculator;
use crate::ports::ledger::{BetUpdate, LedgerStore, SettlementBatch};

/// Post-commit settlement event, consumed by notification and XP handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEvent {
  pub user_id: UserId,
  pub bet_id: BetId,
  pub result: BetResult,
  pub payout: Decimal,
  pub profit: Decimal,
  pub new_balance: Decimal,
}

/// A single bet that could not be settled, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetFailure {
  pub bet_id: BetId,
  pub reason: String,
}

/// Result of settling one matchup's pending bets.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
  /// Matchup that was settled.
  pub matchup_id: MatchupId,
  /// Bets finalized by the commit.
  pub processed: usize,
  /// Bets the commit refused (already terminal when it ran).
  pub skipped: usize,
  /// Per-row data-integrity failures captured before the commit.
  pub errors: Vec<BetFailure>,
  /// Events to fan out after the commit, one per finalized bet.
  pub events: Vec<SettlementEvent>,
}

/// Settles every pending bet on a matchup through one atomic commit.
pub struct LedgerTransaction<S: LedgerStore> {
  store: Arc<S>,
}

impl<S: LedgerStore> LedgerTransaction<S> {
  /// Create a transaction runner backed by the given store.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Settle the matchup's pending bets against the resolved outcome.
  ///
  /// # Errors
  /// Only store-level failures (load or commit) return an error; bad
  /// individual rows are captured in the outcome's `errors` list.
  pub async fn settle(
    &self,
    matchup: &Matchup,
    winner: &str,
    loser: &str,
  ) -> anyhow::Result<SettlementOutcome> {
    let pending = self.store.pending_bets(&matchup.id).await?;

    let mut updates = Vec::with_capacity(pending.len());
    let mut errors = Vec::new();

    // Sequential classification keeps balance updates auditable in
    // placement order.
    for bet in &pending {
      if names_match(&bet.team, winner) {
        let Some(odds) = matchup.odds_for(winner) else {
          errors.push(BetFailure {
            bet_id: bet.id.clone(),
            reason: format!("no odds recorded for winning team {winner}"),
          });
          continue;
        };
        match PayoutCalculator::quote(odds, bet.amount) {
          Ok(quote) => updates.push(BetUpdate {
            bet_id: bet.id.clone(),
            user_id: bet.user_id.clone(),
            result: BetResult::Won,
            payout: quote.payout,
            profit: quote.profit,
            credit: quote.payout,
          }),
          Err(e) => {
            warn!(
              bet_id = %bet.id,
              matchup_id = %matchup.id,
              error = %e,
              "Unquotable winning bet, skipping row"
            );
            errors.push(BetFailure {
              bet_id: bet.id.clone(),
              reason: e.to_string(),
            });
          }
        }
      } else if names_match(&bet.team, loser) {
        updates.push(BetUpdate {
          bet_id: bet.id.clone(),
          user_id: bet.user_id.clone(),
          result: BetResult::Lost,
          payout: Decimal::ZERO,
          profit: Decimal::ZERO,
          credit: Decimal::ZERO,
        });
      } else {
        // Data-integrity error scoped to this bet alone.
        warn!(
          bet_id = %bet.id,
          matchup_id = %matchup.id,
          team = %bet.team,
          "Bet references a team not in this matchup, skipping row"
        );
        errors.push(BetFailure {
          bet_id: bet.id.clone(),
          reason: format!("team {:?} is neither winner nor loser", bet.team),
        });
      }
    }

    let batch = SettlementBatch {
      matchup_id: matchup.id.clone(),
      winner: winner.to_string(),
      loser: loser.to_string(),
      updates,
    };

    // Store failure here is transaction-level and aborts the matchup.
    let receipt = self.store.commit_settlement(&batch).await?;

    for skipped in &receipt.skipped {
      info!(
        bet_id = %skipped.bet_id,
        matchup_id = %matchup.id,
        reason = %skipped.reason,
        "Commit skipped bet row"
      );
    }

    let events = receipt
      .applied
      .iter()
      .map(|applied| SettlementEvent {
        user_id: applied.user_id.clone(),
        bet_id: applied.bet_id.clone(),
        result: applied.result,
        payout: applied.payout,
        profit: applied.profit,
        new_balance: applied.new_balance,
      })
      .collect();

    Ok(SettlementOutcome {
      matchup_id: matchup.id.clone(),
      processed: receipt.applied.len(),
      skipped: receipt.skipped.len(),
      errors,
      events,
    })
  }
}
