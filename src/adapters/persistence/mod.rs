//! Persistence Adapters - Keyed Store with File Backing
//!
//! Implements the LedgerStore port twice: a pure in-memory keyed store
//! for tests and dry runs, and a persistent variant layering crash-safe
//! JSON snapshots plus an append-only JSONL settlement audit trail on
//! top of the same in-memory semantics. No database dependency.

pub mod audit;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use memory::MemoryLedger;
pub use store::PersistentLedger;
