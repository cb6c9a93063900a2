//! Settlement Audit Log - Append-only JSONL Records
//!
//! Persists one record per settled bet to daily JSONL files in the format
//! `settlements/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record for easy parsing, streaming, and after-the-fact auditing of
//! balance changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::bet::{BetId, BetResult, MatchupId, UserId};
use crate::ports::ledger::AppliedUpdate;

/// One settled bet, as written to the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id.
    pub id: String,
    /// Matchup the bet rode on.
    pub matchup_id: MatchupId,
    /// The settled bet.
    pub bet_id: BetId,
    /// Owning account.
    pub user_id: UserId,
    /// Terminal result.
    pub result: BetResult,
    /// Payout credited (zero for losers).
    pub payout: Decimal,
    /// Profit above stake (zero for losers).
    pub profit: Decimal,
    /// Balance after the credit.
    pub new_balance: Decimal,
    /// When the settlement committed.
    pub settled_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build an audit record from an applied commit row.
    pub fn from_applied(matchup_id: &MatchupId, applied: &AppliedUpdate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            matchup_id: matchup_id.clone(),
            bet_id: applied.bet_id.clone(),
            user_id: applied.user_id.clone(),
            result: applied.result,
            payout: applied.payout,
            profit: applied.profit,
            new_balance: applied.new_balance,
            settled_at: Utc::now(),
        }
    }
}

/// Append-only JSONL audit logger with daily file rotation.
///
/// Files are named `settlements/YYYY-MM-DD.jsonl` and each line is a
/// complete JSON object. This format is optimized for:
/// - Append-only writes (no read-modify-write)
/// - Line-by-line streaming for analysis
/// - Natural daily partitioning
pub struct AuditLog {
    /// Base directory for settlement files.
    settlements_dir: PathBuf,
}

impl AuditLog {
    /// Create a new audit log in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let settlements_dir = Path::new(data_dir).join("settlements");

        fs::create_dir_all(&settlements_dir)
            .await
            .context("Failed to create settlements directory")?;

        Ok(Self { settlements_dir })
    }

    /// Append an audit record to today's JSONL file.
    #[instrument(skip(self, record), fields(bet_id = %record.bet_id))]
    pub async fn append(&self, record: &AuditRecord) -> Result<()> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let path = self.settlements_dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(record)
            .context("Failed to serialize audit record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open audit log file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write audit record")?;

        file.flush().await.context("Failed to flush audit log")?;

        Ok(())
    }

    /// Load all audit records from all daily files.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<AuditRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.settlements_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                let content = fs::read_to_string(&path).await?;
                for line in content.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<AuditRecord>(line) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            tracing::warn!(
                                file = %path.display(),
                                error = %e,
                                "Skipping malformed audit record"
                            );
                        }
                    }
                }
            }
        }

        records.sort_by_key(|r| r.settled_at);
        info!(count = records.len(), "Loaded audit records");
        Ok(records)
    }

    /// Check if the settlements directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let test_path = self.settlements_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
