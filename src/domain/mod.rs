//! Domain layer - Core settlement logic and models.
//!
//! This module contains the pure domain logic for the settlement engine.
//! No external dependencies allowed here (hexagonal architecture inner ring).
//! All types are serializable and testable in isolation.

pub mod bet;
pub mod outcome;
pub mod payout;
pub mod progression;

// Re-export core types for convenience
pub use bet::{
    Account, Bet, BetId, BetResult, BetStateError, Matchup, MatchupId, UserId,
};
pub use outcome::{
    CompletedGame, Decided, Outcome, ScoreEntry, Side, UnresolvedReason,
    WinnerResolver,
};
pub use payout::{PayoutCalculator, PayoutError, Quote};
