//! Snapshot Store - Atomic JSON Ledger Persistence
//!
//! Saves the full ledger state to `ledger.json` using atomic writes
//! (write to tmp file, then rename). This guarantees crash safety
//! and prevents partial writes from corrupting the ledger.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument};

use super::memory::LedgerState;

/// Atomic JSON ledger snapshot store for crash recovery.
///
/// State is written to a temporary file first, then atomically
/// renamed to `ledger.json`. The file is always either the old or
/// the new version, never a partial write.
pub struct SnapshotStore {
    /// Path to ledger.json.
    ledger_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl SnapshotStore {
    /// Create a new snapshot store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            ledger_path: dir.join("ledger.json"),
            tmp_path: dir.join("ledger.json.tmp"),
        })
    }

    /// Save the ledger state atomically (tmp → rename).
    #[instrument(skip(self, state))]
    pub async fn save(&self, state: &LedgerState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .context("Failed to serialize ledger state")?;

        // Write to tmp file
        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp ledger file")?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.ledger_path)
            .await
            .context("Failed to rename ledger file")?;

        Ok(())
    }

    /// Load the most recent ledger state.
    ///
    /// Returns `None` if no snapshot exists (first startup).
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<LedgerState>> {
        if !self.ledger_path.exists() {
            info!("No ledger snapshot found, starting fresh");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.ledger_path)
            .await
            .context("Failed to read ledger file")?;

        let state: LedgerState =
            serde_json::from_str(&json).context("Failed to parse ledger JSON")?;

        info!(
            matchups = state.matchups.len(),
            bets = state.bets.len(),
            accounts = state.accounts.len(),
            "Ledger snapshot loaded"
        );

        Ok(Some(state))
    }

    /// Check if the snapshot file exists and is readable.
    pub async fn is_healthy(&self) -> bool {
        if !self.ledger_path.exists() {
            return true; // First run is OK
        }
        fs::metadata(&self.ledger_path).await.is_ok()
    }
}
