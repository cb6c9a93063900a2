//! American-odds payout computation.
//!
//! Pure money math for settling a winning bet. American odds convention:
//! negative odds are the favorite (risk `|odds|` to win 100), positive odds
//! are the underdog (risk 100 to win `odds`). Valid odds are always
//! `<= -100` or `>= +100`; zero and the (-100, 100) gap are rejected.
//!
//! Canonical rounding policy: every monetary result is rounded to 2 decimal
//! places, midpoint away from zero, and nowhere else in the crate is a
//! different rounding applied.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input validation failures for a payout quote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
    /// Odds outside the American convention (`<= -100` or `>= +100`).
    #[error("invalid American odds: {0}")]
    InvalidOdds(i32),
    /// Stake must be strictly positive.
    #[error("invalid stake: {0}")]
    InvalidStake(Decimal),
}

/// Result of quoting a winning bet: stake, profit, and total payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The wagered amount (deducted at placement, returned inside payout).
    pub stake: Decimal,
    /// Winnings on top of the stake.
    pub profit: Decimal,
    /// `stake + profit`, the amount credited back to the account.
    pub payout: Decimal,
}

/// Round a monetary value to the crate-wide 2-decimal policy.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Stateless calculator mapping `(odds, stake)` to a [`Quote`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoutCalculator;

impl PayoutCalculator {
    /// Quote the payout for a winning bet at the given American odds.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidOdds`] for odds in `(-100, 100)`
    /// (including zero) and [`PayoutError::InvalidStake`] for a
    /// non-positive stake.
    pub fn quote(odds: i32, stake: Decimal) -> Result<Quote, PayoutError> {
        if odds > -100 && odds < 100 {
            return Err(PayoutError::InvalidOdds(odds));
        }
        if stake <= Decimal::ZERO {
            return Err(PayoutError::InvalidStake(stake));
        }

        let raw_profit = if odds < 0 {
            // Favorite: risk |odds| to win 100.
            stake * dec!(100) / Decimal::from(-odds)
        } else {
            // Underdog: risk 100 to win odds.
            stake * Decimal::from(odds) / dec!(100)
        };

        let profit = round_money(raw_profit);
        let payout = round_money(profit + stake);

        Ok(Quote {
            stake,
            profit,
            payout,
        })
    }
}
