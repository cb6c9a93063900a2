//! In-memory Ledger - Keyed Store Behind a Single Mutex
//!
//! The reference `LedgerStore` implementation: all state lives in one
//! `LedgerState` behind a single async mutex, so every commit is trivially
//! atomic and the lock compare-and-set is race-free. Used directly by unit
//! tests and dry runs, and embedded by the persistent store.
//!
//! The settlement lock is the matchup's own persisted `in_progress` flag,
//! not a separate in-memory map, so a snapshot/restore round trip keeps
//! single-flight semantics intact.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::bet::{Account, Bet, BetId, BetResult, Matchup, MatchupId, UserId};
use crate::domain::payout::Quote;
use crate::ports::ledger::{
    AppliedUpdate, CommitReceipt, LedgerStore, SettlementBatch, SkippedUpdate,
};

/// The whole ledger as one serializable value.
///
/// `bets` is the historical ledger and is never pruned; `active_bets` is
/// the per-matchup working set that settlement drains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    /// Active (unretired) matchups by id.
    pub matchups: HashMap<MatchupId, Matchup>,
    /// Every bet ever placed, settled or not.
    pub bets: HashMap<BetId, Bet>,
    /// Pending working set: matchup id -> bet ids in placement order.
    pub active_bets: HashMap<MatchupId, Vec<BetId>>,
    /// Accounts by user id.
    pub accounts: HashMap<UserId, Account>,
}

/// In-memory `LedgerStore` implementation.
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Create a ledger from a restored snapshot.
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Clone the full state for snapshotting.
    pub async fn snapshot_state(&self) -> LedgerState {
        self.state.lock().await.clone()
    }

    /// Seed a matchup (odds collection path; also used by tests).
    pub async fn insert_matchup(&self, matchup: Matchup) {
        let mut state = self.state.lock().await;
        state.matchups.insert(matchup.id.clone(), matchup);
    }

    /// Seed an account.
    pub async fn insert_account(&self, account: Account) {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.user_id.clone(), account);
    }

    /// Seed a placed bet into both the ledger and the working set.
    pub async fn insert_bet(&self, bet: Bet) {
        let mut state = self.state.lock().await;
        state
            .active_bets
            .entry(bet.matchup_id.clone())
            .or_default()
            .push(bet.id.clone());
        state.bets.insert(bet.id.clone(), bet);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one settlement batch to a locked state. Shared with the
/// persistent store so both backends settle identically.
pub(crate) fn apply_settlement(
    state: &mut LedgerState,
    batch: &SettlementBatch,
) -> CommitReceipt {
    let mut receipt = CommitReceipt::default();

    for update in &batch.updates {
        let Some(bet) = state.bets.get_mut(&update.bet_id) else {
            receipt.skipped.push(SkippedUpdate {
                bet_id: update.bet_id.clone(),
                reason: "bet not found".to_string(),
            });
            continue;
        };

        // Conditional update: only a still-pending row may be finalized.
        // This is the idempotency barrier that holds even if the guard
        // was bypassed or stale.
        if bet.result.is_terminal() {
            receipt.skipped.push(SkippedUpdate {
                bet_id: update.bet_id.clone(),
                reason: format!("already {}", bet.result),
            });
            continue;
        }

        let Some(account) = state.accounts.get_mut(&update.user_id) else {
            receipt.skipped.push(SkippedUpdate {
                bet_id: update.bet_id.clone(),
                reason: format!("account {} not found", update.user_id),
            });
            continue;
        };

        let applied = match update.result {
            BetResult::Won => bet.settle_won(&Quote {
                stake: bet.amount,
                profit: update.profit,
                payout: update.payout,
            }),
            BetResult::Lost => bet.settle_lost(),
            BetResult::Pending => {
                receipt.skipped.push(SkippedUpdate {
                    bet_id: update.bet_id.clone(),
                    reason: "pending is not a terminal result".to_string(),
                });
                continue;
            }
        };
        if let Err(e) = applied {
            receipt.skipped.push(SkippedUpdate {
                bet_id: update.bet_id.clone(),
                reason: e.to_string(),
            });
            continue;
        }

        if update.credit > rust_decimal::Decimal::ZERO {
            account.credit(update.credit);
        }

        // Drain the working set; the historical row stays.
        if let Some(active) = state.active_bets.get_mut(&batch.matchup_id) {
            active.retain(|id| id != &update.bet_id);
        }

        receipt.applied.push(AppliedUpdate {
            bet_id: update.bet_id.clone(),
            user_id: update.user_id.clone(),
            result: update.result,
            payout: update.payout,
            profit: update.profit,
            new_balance: account.balance,
        });
    }

    // Record the resolved outcome on the matchup row itself.
    if let Some(matchup) = state.matchups.get_mut(&batch.matchup_id) {
        matchup.record_outcome(&batch.winner, &batch.loser);
    }

    receipt
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn matchup(&self, id: &MatchupId) -> Result<Option<Matchup>> {
        Ok(self.state.lock().await.matchups.get(id).cloned())
    }

    async fn active_matchups(&self) -> Result<Vec<Matchup>> {
        let state = self.state.lock().await;
        let mut matchups: Vec<Matchup> = state.matchups.values().cloned().collect();
        matchups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matchups)
    }

    async fn pending_bets(&self, matchup_id: &MatchupId) -> Result<Vec<Bet>> {
        let state = self.state.lock().await;
        let Some(ids) = state.active_bets.get(matchup_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| state.bets.get(id))
            .filter(|bet| bet.result == BetResult::Pending)
            .cloned()
            .collect())
    }

    async fn account(&self, user_id: &UserId) -> Result<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(user_id).cloned())
    }

    async fn try_lock_matchup(&self, id: &MatchupId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let matchup = state
            .matchups
            .get_mut(id)
            .with_context(|| format!("matchup {id} not found"))?;
        if matchup.in_progress {
            return Ok(false);
        }
        matchup.in_progress = true;
        Ok(true)
    }

    async fn unlock_matchup(&self, id: &MatchupId) -> Result<()> {
        let mut state = self.state.lock().await;
        // A retired matchup has no flag left to clear.
        if let Some(matchup) = state.matchups.get_mut(id) {
            matchup.in_progress = false;
        }
        Ok(())
    }

    async fn is_locked(&self, id: &MatchupId) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.matchups.get(id).is_some_and(|m| m.in_progress))
    }

    async fn commit_settlement(&self, batch: &SettlementBatch) -> Result<CommitReceipt> {
        // One mutex hold for the whole batch: the commit is atomic.
        let mut state = self.state.lock().await;
        Ok(apply_settlement(&mut state, batch))
    }

    async fn add_xp(&self, user_id: &UserId, delta: u64) -> Result<Account> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(user_id) else {
            bail!("account {user_id} not found");
        };
        account.xp = account.xp.saturating_add(delta);
        Ok(account.clone())
    }

    async fn set_level(&self, user_id: &UserId, level: u32) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(user_id) else {
            bail!("account {user_id} not found");
        };
        account.level = level;
        Ok(())
    }

    async fn retire_matchup(&self, id: &MatchupId) -> Result<()> {
        let mut state = self.state.lock().await;
        let no_pending = state
            .active_bets
            .get(id)
            .is_none_or(|ids| ids.is_empty());
        if no_pending {
            state.matchups.remove(id);
            state.active_bets.remove(id);
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ports::ledger::BetUpdate;

    fn matchup() -> Matchup {
        Matchup::new("m1".to_string(), "TeamA", "TeamB", -150, 130)
    }

    #[tokio::test]
    async fn lock_is_compare_and_set() {
        let store = MemoryLedger::new();
        store.insert_matchup(matchup()).await;
        let id = "m1".to_string();

        assert!(store.try_lock_matchup(&id).await.unwrap());
        assert!(!store.try_lock_matchup(&id).await.unwrap());
        assert!(store.is_locked(&id).await.unwrap());

        store.unlock_matchup(&id).await.unwrap();
        assert!(!store.is_locked(&id).await.unwrap());
        assert!(store.try_lock_matchup(&id).await.unwrap());
    }

    #[tokio::test]
    async fn lock_on_missing_matchup_errors_but_unlock_does_not() {
        let store = MemoryLedger::new();
        let id = "ghost".to_string();
        assert!(store.try_lock_matchup(&id).await.is_err());
        assert!(store.unlock_matchup(&id).await.is_ok());
        assert!(!store.is_locked(&id).await.unwrap());
    }

    #[tokio::test]
    async fn commit_refuses_terminal_rows() {
        let store = MemoryLedger::new();
        store.insert_matchup(matchup()).await;
        store
            .insert_account(Account::new("u1".to_string(), dec!(500)))
            .await;
        store
            .insert_bet(Bet::placed(
                "b1".to_string(),
                "u1".to_string(),
                "m1".to_string(),
                "TeamA",
                dec!(100),
            ))
            .await;

        let batch = SettlementBatch {
            matchup_id: "m1".to_string(),
            winner: "TeamA".to_string(),
            loser: "TeamB".to_string(),
            updates: vec![BetUpdate {
                bet_id: "b1".to_string(),
                user_id: "u1".to_string(),
                result: BetResult::Won,
                payout: dec!(166.67),
                profit: dec!(66.67),
                credit: dec!(166.67),
            }],
        };

        let first = store.commit_settlement(&batch).await.unwrap();
        assert_eq!(first.applied.len(), 1);
        assert_eq!(first.applied[0].new_balance, dec!(666.67));

        // Replaying the identical batch credits nothing.
        let second = store.commit_settlement(&batch).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), 1);
        let account = store.account(&"u1".to_string()).await.unwrap().unwrap();
        assert_eq!(account.balance, dec!(666.67));
    }

    #[tokio::test]
    async fn retire_only_when_working_set_empty() {
        let store = MemoryLedger::new();
        store.insert_matchup(matchup()).await;
        store
            .insert_bet(Bet::placed(
                "b1".to_string(),
                "u1".to_string(),
                "m1".to_string(),
                "TeamA",
                dec!(10),
            ))
            .await;
        let id = "m1".to_string();

        store.retire_matchup(&id).await.unwrap();
        assert!(store.matchup(&id).await.unwrap().is_some());

        // Drain the working set, then retirement takes effect.
        store
            .insert_account(Account::new("u1".to_string(), dec!(100)))
            .await;
        let batch = SettlementBatch {
            matchup_id: id.clone(),
            winner: "TeamA".to_string(),
            loser: "TeamB".to_string(),
            updates: vec![BetUpdate {
                bet_id: "b1".to_string(),
                user_id: "u1".to_string(),
                result: BetResult::Lost,
                payout: dec!(0),
                profit: dec!(0),
                credit: dec!(0),
            }],
        };
        store.commit_settlement(&batch).await.unwrap();
        store.retire_matchup(&id).await.unwrap();
        assert!(store.matchup(&id).await.unwrap().is_none());

        // The historical row survives retirement.
        let state = store.snapshot_state().await;
        assert!(state.bets.contains_key("b1"));
    }

    #[tokio::test]
    async fn missing_account_skips_row_without_touching_bet() {
        let store = MemoryLedger::new();
        store.insert_matchup(matchup()).await;
        store
            .insert_bet(Bet::placed(
                "b1".to_string(),
                "u1".to_string(),
                "m1".to_string(),
                "TeamA",
                dec!(100),
            ))
            .await;

        let batch = SettlementBatch {
            matchup_id: "m1".to_string(),
            winner: "TeamA".to_string(),
            loser: "TeamB".to_string(),
            updates: vec![BetUpdate {
                bet_id: "b1".to_string(),
                user_id: "u1".to_string(),
                result: BetResult::Won,
                payout: dec!(166.67),
                profit: dec!(66.67),
                credit: dec!(166.67),
            }],
        };

        let receipt = store.commit_settlement(&batch).await.unwrap();
        assert!(receipt.applied.is_empty());
        assert_eq!(receipt.skipped.len(), 1);

        let pending = store.pending_bets(&"m1".to_string()).await.unwrap();
        assert_eq!(pending.len(), 1, "bad row must stay pending");
    }
}
