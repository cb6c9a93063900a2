//! Ledger Port - Bet and Balance Persistence Interface
//!
//! Defines the keyed-store contract backing settlement: matchups, bets,
//! accounts, and the persisted per-matchup settlement lock. Two guarantees
//! matter here and every implementation must provide both:
//!
//! - `try_lock_matchup` is an atomic compare-and-set on the persisted
//!   in-progress flag (single-flight across concurrent triggers).
//! - `commit_settlement` applies a whole batch atomically, and each row
//!   update inside it is conditional on the bet still being `Pending`
//!   (the second idempotency barrier, independent of the lock).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bet::{Account, Bet, BetId, BetResult, Matchup, MatchupId, UserId};

/// One bet's computed settlement, ready to be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetUpdate {
  /// Bet to finalize.
  pub bet_id: BetId,
  /// Owning account.
  pub user_id: UserId,
  /// Terminal result to record (`Won` or `Lost`).
  pub result: BetResult,
  /// Total payout to record on the bet row (zero for losers).
  pub payout: Decimal,
  /// Profit to record on the bet row (zero for losers).
  pub profit: Decimal,
  /// Amount to credit to the account balance (zero for losers).
  pub credit: Decimal,
}

/// A full matchup settlement to be committed in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementBatch {
  /// Matchup being settled.
  pub matchup_id: MatchupId,
  /// Winning team name.
  pub winner: String,
  /// Losing team name.
  pub loser: String,
  /// Per-bet updates, applied in order.
  pub updates: Vec<BetUpdate>,
}

/// One bet the commit actually finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedUpdate {
  pub bet_id: BetId,
  pub user_id: UserId,
  pub result: BetResult,
  pub payout: Decimal,
  pub profit: Decimal,
  /// Account balance after the credit (unchanged for losers).
  pub new_balance: Decimal,
}

/// A row the commit refused to touch, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedUpdate {
  pub bet_id: BetId,
  pub reason: String,
}

/// Outcome of an atomic settlement commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReceipt {
  /// Rows finalized by this commit, in application order.
  pub applied: Vec<AppliedUpdate>,
  /// Rows skipped (already terminal, missing bet, missing account).
  pub skipped: Vec<SkippedUpdate>,
}

/// Trait for ledger persistence providers.
///
/// The in-memory implementation backs unit tests; the persistent one adds
/// crash-safe snapshots plus an append-only settlement audit log.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
  /// Load a matchup from the active set.
  async fn matchup(&self, id: &MatchupId) -> anyhow::Result<Option<Matchup>>;

  /// List every matchup still in the active set.
  async fn active_matchups(&self) -> anyhow::Result<Vec<Matchup>>;

  /// List pending bets riding on a matchup, in placement order.
  async fn pending_bets(&self, matchup_id: &MatchupId) -> anyhow::Result<Vec<Bet>>;

  /// Load an account.
  async fn account(&self, user_id: &UserId) -> anyhow::Result<Option<Account>>;

  /// Atomically set the matchup's in-progress flag.
  ///
  /// Returns `true` if this caller acquired the lock, `false` if another
  /// settlement already holds it. Compare-and-set semantics.
  async fn try_lock_matchup(&self, id: &MatchupId) -> anyhow::Result<bool>;

  /// Clear the matchup's in-progress flag.
  async fn unlock_matchup(&self, id: &MatchupId) -> anyhow::Result<()>;

  /// Read the matchup's in-progress flag.
  async fn is_locked(&self, id: &MatchupId) -> anyhow::Result<bool>;

  /// Apply a settlement batch in one atomic transaction.
  ///
  /// Each row update is conditional on the bet still being `Pending`;
  /// rows that fail the condition are reported as skipped, never applied
  /// twice. Winner credits and bet finalization land together or not at
  /// all for a given row.
  async fn commit_settlement(
    &self,
    batch: &SettlementBatch,
  ) -> anyhow::Result<CommitReceipt>;

  /// Add XP to an account and return the updated account.
  async fn add_xp(&self, user_id: &UserId, delta: u64) -> anyhow::Result<Account>;

  /// Persist a recomputed level for an account.
  async fn set_level(&self, user_id: &UserId, level: u32) -> anyhow::Result<()>;

  /// Drop a fully settled matchup from the active set.
  ///
  /// No-op while pending bets remain; the historical bet rows are kept
  /// either way.
  async fn retire_matchup(&self, id: &MatchupId) -> anyhow::Result<()>;

  /// Check if the store is usable (disk space, permissions).
  async fn is_healthy(&self) -> bool;
}
