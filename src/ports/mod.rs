//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ScoreFeed`: Completed-game results from the external scores provider
//! - `LedgerStore`: Bets, balances, matchups, and the settlement lock
//! - `Messenger`: Best-effort direct messages to bet owners

pub mod ledger;
pub mod messenger;
pub mod score_feed;
