//! Settlement Orchestrator - Single Guarded Entry Point
//!
//! Both triggers — the recurring scheduled poll and the on-demand admin
//! action — funnel through this one entry point. Per matchup the flow is:
//!
//! 1. Resolve the completed game to a winner (or leave it unresolved)
//! 2. Acquire the single-flight guard (concurrent caller no-ops)
//! 3. Run the atomic ledger transaction
//! 4. Fan out post-commit notification and XP events (best-effort)
//! 5. Retire the matchup once no pending bets remain
//! 6. Release the guard — on every exit path
//!
//! A score-feed failure abandons the cycle quietly; the next tick retries.
//! A store failure bubbles up at operator severity without crashing the
//! host process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::domain::bet::{BetResult, Matchup, MatchupId};
use crate::domain::outcome::{CompletedGame, Outcome, WinnerResolver, names_match};
use crate::ports::ledger::LedgerStore;
use crate::ports::messenger::Messenger;
use crate::ports::score_feed::ScoreFeed;
use crate::usecases::guard::SettlementGuard;
use crate::usecases::ledger_txn::{BetFailure, LedgerTransaction, SettlementEvent};
use crate::usecases::notification::NotificationDispatcher;
use crate::usecases::progression::ProgressionTracker;

/// Failures surfaced by the orchestrator entry points.
#[derive(Debug, Error)]
pub enum SettlementError {
  /// Matchup is not in the active set.
  #[error("matchup {0} not found")]
  MatchupNotFound(MatchupId),
  /// The named teams do not both play in the matchup.
  #[error("teams {winner}/{loser} do not match matchup {matchup_id}")]
  TeamMismatch {
    matchup_id: MatchupId,
    winner: String,
    loser: String,
  },
  /// Score feed unavailable (transient; retried on the next tick).
  #[error("score feed unavailable: {0}")]
  FeedUnavailable(String),
  /// Feed has no completed game for the matchup yet.
  #[error("no completed game for matchup {0}")]
  GameNotFound(MatchupId),
  /// Ledger store failure (fatal for the current operation).
  #[error("ledger store failure: {0}")]
  Store(#[from] anyhow::Error),
}

/// How a settlement attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStatus {
  /// Ledger transaction committed.
  Settled,
  /// Another settlement holds the guard; this call was a no-op.
  AlreadySettling,
  /// Outcome not resolvable yet; nothing was mutated.
  Unresolved(String),
}

/// Summary of one settlement attempt, per matchup.
#[derive(Debug, Clone)]
pub struct SettlementReport {
  pub matchup_id: MatchupId,
  pub status: SettlementStatus,
  /// Bets finalized by the commit.
  pub processed: usize,
  /// Bets the commit refused (idempotency barrier).
  pub skipped: usize,
  /// Per-row data-integrity failures.
  pub errors: Vec<BetFailure>,
  /// When the attempt finished.
  pub timestamp: DateTime<Utc>,
}

impl SettlementReport {
  fn empty(matchup_id: MatchupId, status: SettlementStatus) -> Self {
    Self {
      matchup_id,
      status,
      processed: 0,
      skipped: 0,
      errors: Vec::new(),
      timestamp: Utc::now(),
    }
  }
}

/// Aggregated summary of one scheduled poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
  /// Whether the score-feed fetch failed (cycle abandoned).
  pub fetch_failed: bool,
  /// Completed games the feed returned.
  pub games_seen: usize,
  /// Active matchups checked against the feed.
  pub matchups_checked: usize,
  /// Matchups settled this cycle.
  pub settled: usize,
  /// Matchups left alone because their outcome was unresolved.
  pub unresolved: usize,
  /// Matchups skipped because settlement was already in flight.
  pub conflicts: usize,
}

/// The settlement engine's entry point for both triggers.
pub struct SettlementOrchestrator<F, S, M>
where
  F: ScoreFeed,
  S: LedgerStore,
  M: Messenger,
{
  feed: Arc<F>,
  store: Arc<S>,
  guard: SettlementGuard<S>,
  txn: LedgerTransaction<S>,
  dispatcher: NotificationDispatcher<M>,
  tracker: ProgressionTracker<S, M>,
  metrics: Arc<MetricsRegistry>,
}

impl<F, S, M> SettlementOrchestrator<F, S, M>
where
  F: ScoreFeed,
  S: LedgerStore,
  M: Messenger,
{
  /// Wire the orchestrator with its collaborators.
  pub fn new(
    feed: Arc<F>,
    store: Arc<S>,
    messenger: Arc<M>,
    metrics: Arc<MetricsRegistry>,
    xp_per_win: u64,
    xp_per_loss: u64,
    dry_run: bool,
  ) -> Self {
    Self {
      feed,
      guard: SettlementGuard::new(Arc::clone(&store)),
      txn: LedgerTransaction::new(Arc::clone(&store)),
      dispatcher: NotificationDispatcher::new(Arc::clone(&messenger), dry_run),
      tracker: ProgressionTracker::new(
        Arc::clone(&store),
        messenger,
        xp_per_win,
        xp_per_loss,
        dry_run,
      ),
      store,
      metrics,
    }
  }

  /// Whether a settlement is currently in flight for this matchup.
  pub async fn is_settling(&self, matchup_id: &MatchupId) -> Result<bool, SettlementError> {
    Ok(self.guard.is_settling(matchup_id).await?)
  }

  /// Settle one matchup against a known winner and loser.
  ///
  /// Safe to call from both triggers concurrently: the guard makes the
  /// second caller a logged no-op, and the commit's conditional updates
  /// make even a bypassed guard harmless.
  pub async fn settle_matchup(
    &self,
    matchup_id: &MatchupId,
    winner: &str,
    loser: &str,
  ) -> Result<SettlementReport, SettlementError> {
    let matchup = self
      .store
      .matchup(matchup_id)
      .await?
      .ok_or_else(|| SettlementError::MatchupNotFound(matchup_id.clone()))?;

    // Both teams must play in the matchup and must be distinct sides;
    // one team named twice would settle its whole book as won.
    if !matchup.has_team(winner) || !matchup.has_team(loser) || names_match(winner, loser) {
      return Err(SettlementError::TeamMismatch {
        matchup_id: matchup_id.clone(),
        winner: winner.to_string(),
        loser: loser.to_string(),
      });
    }

    if !self.guard.try_acquire(matchup_id).await? {
      self.metrics.guard_conflicts.inc();
      return Ok(SettlementReport::empty(
        matchup_id.clone(),
        SettlementStatus::AlreadySettling,
      ));
    }

    let timer = self.metrics.settlement_duration.start_timer();
    let result = self.settle_locked(&matchup, winner, loser).await;
    timer.observe_duration();

    // Guard release happens on every exit path, success or failure.
    self.guard.release(matchup_id).await;

    result
  }

  /// The guarded section: transaction, event fan-out, retirement.
  async fn settle_locked(
    &self,
    matchup: &Matchup,
    winner: &str,
    loser: &str,
  ) -> Result<SettlementReport, SettlementError> {
    let outcome = self.txn.settle(matchup, winner, loser).await?;

    info!(
      matchup_id = %matchup.id,
      winner,
      loser,
      processed = outcome.processed,
      skipped = outcome.skipped,
      row_errors = outcome.errors.len(),
      "Matchup settled"
    );

    self.metrics.matchups_settled.inc();
    for event in &outcome.events {
      self.record_event_metrics(event);
      self.fan_out(event).await;
    }

    // Retirement is a no-op while pending bets remain (e.g. bad rows
    // waiting for manual repair).
    if let Err(e) = self.store.retire_matchup(&matchup.id).await {
      warn!(matchup_id = %matchup.id, error = %e, "Failed to retire matchup");
    }

    Ok(SettlementReport {
      matchup_id: matchup.id.clone(),
      status: SettlementStatus::Settled,
      processed: outcome.processed,
      skipped: outcome.skipped,
      errors: outcome.errors,
      timestamp: Utc::now(),
    })
  }

  /// Post-commit side effects for one settled bet. Never fails.
  async fn fan_out(&self, event: &SettlementEvent) {
    self.dispatcher.dispatch(event).await;

    let won = event.result == BetResult::Won;
    if let Err(e) = self.tracker.award(&event.user_id, won).await {
      warn!(
        user_id = %event.user_id,
        bet_id = %event.bet_id,
        error = %e,
        "XP award failed after settlement"
      );
    }
  }

  fn record_event_metrics(&self, event: &SettlementEvent) {
    self
      .metrics
      .bets_settled
      .with_label_values(&[&event.result.to_string()])
      .inc();
    if event.result == BetResult::Won {
      use rust_decimal::prelude::ToPrimitive;
      self
        .metrics
        .payout_credited
        .inc_by(event.payout.to_f64().unwrap_or(0.0));
    }
  }

  /// One scheduled poll cycle: fetch, resolve, settle.
  ///
  /// # Errors
  /// Only store failures return an error; a feed failure is transient
  /// and reported inside the summary.
  pub async fn run_cycle(&self) -> Result<CycleSummary, SettlementError> {
    self.metrics.cycles.inc();
    let mut summary = CycleSummary::default();

    let games = match self.feed.completed_games().await {
      Ok(games) => games,
      Err(e) => {
        // Transient by taxonomy: abandon this cycle, next tick retries.
        self.metrics.feed_failures.inc();
        warn!(error = %e, "Score feed fetch failed, deferring to next cycle");
        summary.fetch_failed = true;
        return Ok(summary);
      }
    };
    summary.games_seen = games.len();

    let active = self.store.active_matchups().await?;
    for matchup in &active {
      let Some(game) = games.iter().find(|g| g.id == matchup.id) else {
        continue;
      };
      summary.matchups_checked += 1;

      match self.attempt(matchup, game).await? {
        SettlementStatus::Settled => summary.settled += 1,
        SettlementStatus::AlreadySettling => summary.conflicts += 1,
        SettlementStatus::Unresolved(_) => summary.unresolved += 1,
      }
    }

    info!(
      games = summary.games_seen,
      checked = summary.matchups_checked,
      settled = summary.settled,
      unresolved = summary.unresolved,
      conflicts = summary.conflicts,
      "Settlement cycle complete"
    );

    Ok(summary)
  }

  /// Resolve one game and settle its matchup if decided.
  async fn attempt(
    &self,
    matchup: &Matchup,
    game: &CompletedGame,
  ) -> Result<SettlementStatus, SettlementError> {
    match WinnerResolver::resolve(game) {
      Outcome::Decided(decided) => {
        let report = self
          .settle_matchup(&matchup.id, &decided.winner, &decided.loser)
          .await?;
        Ok(report.status)
      }
      Outcome::Unresolved(reason) => {
        debug!(
          matchup_id = %matchup.id,
          reason = %reason,
          "Outcome unresolved, leaving matchup pending"
        );
        Ok(SettlementStatus::Unresolved(reason.to_string()))
      }
    }
  }

  /// Manual admin trigger for one matchup ("force close").
  ///
  /// Re-fetches the feed so the admin path and the scheduled path agree
  /// on the outcome, then funnels into the same guarded settlement.
  pub async fn force_settle(
    &self,
    matchup_id: &MatchupId,
  ) -> Result<SettlementReport, SettlementError> {
    let matchup = self
      .store
      .matchup(matchup_id)
      .await?
      .ok_or_else(|| SettlementError::MatchupNotFound(matchup_id.clone()))?;

    let games = self
      .feed
      .completed_games()
      .await
      .map_err(|e| SettlementError::FeedUnavailable(e.to_string()))?;

    let game = games
      .iter()
      .find(|g| g.id == matchup.id)
      .ok_or_else(|| SettlementError::GameNotFound(matchup_id.clone()))?;

    match WinnerResolver::resolve(game) {
      Outcome::Decided(decided) => {
        self
          .settle_matchup(matchup_id, &decided.winner, &decided.loser)
          .await
      }
      Outcome::Unresolved(reason) => {
        info!(
          matchup_id = %matchup_id,
          reason = %reason,
          "Manual settlement requested but outcome unresolved"
        );
        Ok(SettlementReport::empty(
          matchup_id.clone(),
          SettlementStatus::Unresolved(reason.to_string()),
        ))
      }
    }
  }
}

/// Log a fatal settlement error at operator severity.
///
/// Used by the poll loop so a store outage abandons the cycle without
/// crashing the host process.
pub fn log_fatal(err: &SettlementError) {
  error!(error = %err, "Settlement cycle aborted");
}
