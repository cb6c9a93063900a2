//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the settlement engine's core workflows. Each use case is a
//! self-contained business operation.
//!
//! Use cases:
//! - `SettlementOrchestrator`: Guarded entry point for both triggers
//! - `LedgerTransaction`: Atomic per-matchup bet settlement
//! - `SettlementGuard`: Per-matchup single-flight lock
//! - `NotificationDispatcher`: Best-effort result messages
//! - `ProgressionTracker`: XP awards and level-up side effects

pub mod guard;
pub mod ledger_txn;
pub mod notification;
pub mod progression;
pub mod settlement;
