//! Core wagering domain types.
//!
//! Defines the ledger entities: matchups, bets, and accounts. These types
//! are the foundation of the hexagonal architecture's inner ring and the
//! only shapes the persistence adapters are allowed to store.
//!
//! A bet's result is a tagged enum with exactly two legal transitions
//! (`Pending -> Won`, `Pending -> Lost`), both terminal. The transition is
//! enforced here so no store implementation can re-settle a bet by accident.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outcome::names_match;
use super::payout::Quote;

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Matchup identifier; equals the score feed's game id.
pub type MatchupId = String;

/// Bet identifier (UUID v4, assigned at placement).
pub type BetId = String;

/// Chat-platform user identifier (snowflake string).
pub type UserId = String;

// ────────────────────────────────────────────
// Bet lifecycle
// ────────────────────────────────────────────

/// Terminal-once-set bet result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetResult {
    /// Placed, stake already deducted, awaiting settlement.
    Pending,
    /// Settled as a winner; payout credited.
    Won,
    /// Settled as a loser; no balance change.
    Lost,
}

impl BetResult {
    /// Whether this result may never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for BetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// Illegal bet state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetStateError {
    #[error("bet {bet_id} already settled as {current}")]
    AlreadyTerminal { bet_id: BetId, current: BetResult },
    #[error("bet {bet_id} cannot transition to {requested}")]
    InvalidTransition { bet_id: BetId, requested: BetResult },
}

/// A user's wager on one side of a matchup.
///
/// The stake was deducted from the account at placement; settlement only
/// ever credits winners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    /// Unique bet identifier.
    pub id: BetId,
    /// Owning account.
    pub user_id: UserId,
    /// Matchup this bet rides on.
    pub matchup_id: MatchupId,
    /// Chosen team name, as recorded at placement.
    pub team: String,
    /// Wagered amount.
    pub amount: Decimal,
    /// Lifecycle state; `Pending` until settled exactly once.
    pub result: BetResult,
    /// Total credited on a win (zero until settled).
    pub payout: Decimal,
    /// Winnings above the stake (zero until settled).
    pub profit: Decimal,
    /// Placement timestamp.
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    /// Create a freshly placed, pending bet.
    pub fn placed(
        id: BetId,
        user_id: UserId,
        matchup_id: MatchupId,
        team: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            id,
            user_id,
            matchup_id,
            team: team.into(),
            amount,
            result: BetResult::Pending,
            payout: Decimal::ZERO,
            profit: Decimal::ZERO,
            placed_at: Utc::now(),
        }
    }

    /// Settle this bet as won, recording the quoted payout.
    ///
    /// # Errors
    /// Rejects the transition if the bet is already terminal.
    pub fn settle_won(&mut self, quote: &Quote) -> Result<(), BetStateError> {
        self.transition(BetResult::Won)?;
        self.payout = quote.payout;
        self.profit = quote.profit;
        Ok(())
    }

    /// Settle this bet as lost. No payout, no balance change.
    ///
    /// # Errors
    /// Rejects the transition if the bet is already terminal.
    pub fn settle_lost(&mut self) -> Result<(), BetStateError> {
        self.transition(BetResult::Lost)
    }

    fn transition(&mut self, to: BetResult) -> Result<(), BetStateError> {
        if self.result.is_terminal() {
            return Err(BetStateError::AlreadyTerminal {
                bet_id: self.id.clone(),
                current: self.result,
            });
        }
        if !to.is_terminal() {
            return Err(BetStateError::InvalidTransition {
                bet_id: self.id.clone(),
                requested: to,
            });
        }
        self.result = to;
        Ok(())
    }
}

// ────────────────────────────────────────────
// Matchup
// ────────────────────────────────────────────

/// A real-world game with two sides and published American odds.
///
/// Created when odds are collected; mutated when settlement starts and
/// ends; retired from the active set once settled with no pending bets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// Matchup identifier; shared with the score feed.
    pub id: MatchupId,
    /// First listed team (home side at the feed).
    pub team_one: String,
    /// Second listed team (away side at the feed).
    pub team_two: String,
    /// American odds for team one.
    pub team_one_odds: i32,
    /// American odds for team two.
    pub team_two_odds: i32,
    /// Whether the underlying game is known to be finished.
    pub completed: bool,
    /// Winning team once resolved.
    pub winner: Option<String>,
    /// Losing team once resolved.
    pub loser: Option<String>,
    /// Persisted single-flight settlement flag.
    pub in_progress: bool,
}

impl Matchup {
    /// Create an unsettled matchup from collected odds.
    pub fn new(
        id: MatchupId,
        team_one: impl Into<String>,
        team_two: impl Into<String>,
        team_one_odds: i32,
        team_two_odds: i32,
    ) -> Self {
        Self {
            id,
            team_one: team_one.into(),
            team_two: team_two.into(),
            team_one_odds,
            team_two_odds,
            completed: false,
            winner: None,
            loser: None,
            in_progress: false,
        }
    }

    /// Look up the odds for the named team, if it plays in this matchup.
    pub fn odds_for(&self, team: &str) -> Option<i32> {
        if names_match(team, &self.team_one) {
            Some(self.team_one_odds)
        } else if names_match(team, &self.team_two) {
            Some(self.team_two_odds)
        } else {
            None
        }
    }

    /// Whether the named team plays in this matchup.
    pub fn has_team(&self, team: &str) -> bool {
        self.odds_for(team).is_some()
    }

    /// Record the resolved outcome on the matchup itself.
    pub fn record_outcome(&mut self, winner: &str, loser: &str) {
        self.completed = true;
        self.winner = Some(winner.to_string());
        self.loser = Some(loser.to_string());
    }
}

// ────────────────────────────────────────────
// Account
// ────────────────────────────────────────────

/// A user's balance and progression state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Chat-platform user id.
    pub user_id: UserId,
    /// Virtual-currency balance.
    pub balance: Decimal,
    /// Cumulative experience points.
    pub xp: u64,
    /// Current level, derived from xp via the threshold table.
    pub level: u32,
}

impl Account {
    /// Open an account with a starting balance at level 1.
    pub fn new(user_id: UserId, balance: Decimal) -> Self {
        Self {
            user_id,
            balance,
            xp: 0,
            level: 1,
        }
    }

    /// Credit a settlement payout. Settlement never debits.
    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_bet() -> Bet {
        Bet::placed(
            "b1".to_string(),
            "u1".to_string(),
            "m1".to_string(),
            "TeamA",
            dec!(100),
        )
    }

    #[test]
    fn pending_to_won_records_quote() {
        let mut bet = pending_bet();
        let quote = Quote {
            stake: dec!(100),
            profit: dec!(66.67),
            payout: dec!(166.67),
        };
        bet.settle_won(&quote).unwrap();
        assert_eq!(bet.result, BetResult::Won);
        assert_eq!(bet.payout, dec!(166.67));
        assert_eq!(bet.profit, dec!(66.67));
    }

    #[test]
    fn pending_to_lost_leaves_payout_zero() {
        let mut bet = pending_bet();
        bet.settle_lost().unwrap();
        assert_eq!(bet.result, BetResult::Lost);
        assert_eq!(bet.payout, Decimal::ZERO);
    }

    #[test]
    fn terminal_bet_rejects_resettlement() {
        let mut bet = pending_bet();
        bet.settle_lost().unwrap();
        let err = bet.settle_lost().unwrap_err();
        assert!(matches!(err, BetStateError::AlreadyTerminal { .. }));

        let quote = Quote {
            stake: dec!(100),
            profit: dec!(10),
            payout: dec!(110),
        };
        assert!(bet.settle_won(&quote).is_err());
        assert_eq!(bet.result, BetResult::Lost);
    }

    #[test]
    fn odds_lookup_matches_either_side() {
        let m = Matchup::new("m1".to_string(), "TeamA", "TeamB", -150, 130);
        assert_eq!(m.odds_for("TeamA"), Some(-150));
        assert_eq!(m.odds_for("teamb"), Some(130));
        assert_eq!(m.odds_for("TeamC"), None);
    }

    #[test]
    fn credit_only_increases_balance() {
        let mut acct = Account::new("u1".to_string(), dec!(500));
        acct.credit(dec!(166.67));
        assert_eq!(acct.balance, dec!(666.67));
    }
}
