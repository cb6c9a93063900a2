//! Score Feed Adapters - Completed Game Results
//!
//! Provides the HTTP polling adapter for the external scores provider.
//! The feed is best-effort by contract: a failed fetch defers settlement
//! to the next scheduled tick.

pub mod score_api;

pub use score_api::{ScoreApiConfig, ScoreApiFeed};
