//! Settlement Flow Tests - End-to-end Against the In-memory Ledger
//!
//! Drives a whole settlement through the real orchestrator, transaction,
//! dispatcher, and progression tracker, with only the score feed and the
//! chat gateway faked. These are the scenario tests: the full happy path,
//! idempotence across repeated cycles, and delivery failures that must
//! never disturb the committed ledger.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use sportsbook_settlement_bot::adapters::metrics::MetricsRegistry;
use sportsbook_settlement_bot::adapters::persistence::MemoryLedger;
use sportsbook_settlement_bot::domain::bet::{Account, Bet, Matchup};
use sportsbook_settlement_bot::domain::outcome::{CompletedGame, ScoreEntry};
use sportsbook_settlement_bot::ports::ledger::LedgerStore;
use sportsbook_settlement_bot::ports::messenger::Messenger;
use sportsbook_settlement_bot::ports::score_feed::ScoreFeed;
use sportsbook_settlement_bot::usecases::settlement::SettlementOrchestrator;

// ---- Fakes ----

/// Serves a fixed list of games, like a canned scores endpoint.
struct FixtureFeed {
    games: Vec<CompletedGame>,
}

#[async_trait]
impl ScoreFeed for FixtureFeed {
    async fn completed_games(&self) -> anyhow::Result<Vec<CompletedGame>> {
        Ok(self.games.clone())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Records every DM instead of sending it.
struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMessenger {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    async fn messages_for(&self, user_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_direct(&self, user_id: &String, content: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("user unreachable (DMs blocked)");
        }
        self.sent
            .lock()
            .await
            .push((user_id.clone(), content.to_string()));
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

// ---- Fixtures ----

fn decided_game(id: &str, home_score: &str, away_score: &str) -> CompletedGame {
    CompletedGame {
        id: id.to_string(),
        home_team: "TeamA".to_string(),
        away_team: "TeamB".to_string(),
        completed: true,
        scores: vec![
            ScoreEntry {
                name: "TeamA".to_string(),
                score: home_score.to_string(),
            },
            ScoreEntry {
                name: "TeamB".to_string(),
                score: away_score.to_string(),
            },
        ],
    }
}

/// TeamA favored at -150, TeamB the underdog at +130. u1 has $100 on
/// TeamA, u2 has $50 on TeamB; both stakes were deducted at placement.
async fn seeded_store() -> Arc<MemoryLedger> {
    let store = Arc::new(MemoryLedger::new());
    store
        .insert_matchup(Matchup::new("g1".to_string(), "TeamA", "TeamB", -150, 130))
        .await;
    store
        .insert_account(Account::new("u1".to_string(), dec!(400)))
        .await;
    store
        .insert_account(Account::new("u2".to_string(), dec!(450)))
        .await;
    store
        .insert_bet(Bet::placed(
            "b1".to_string(),
            "u1".to_string(),
            "g1".to_string(),
            "TeamA",
            dec!(100),
        ))
        .await;
    store
        .insert_bet(Bet::placed(
            "b2".to_string(),
            "u2".to_string(),
            "g1".to_string(),
            "TeamB",
            dec!(50),
        ))
        .await;
    store
}

fn orchestrator(
    games: Vec<CompletedGame>,
    store: Arc<MemoryLedger>,
    messenger: Arc<RecordingMessenger>,
) -> SettlementOrchestrator<FixtureFeed, MemoryLedger, RecordingMessenger> {
    SettlementOrchestrator::new(
        Arc::new(FixtureFeed { games }),
        store,
        messenger,
        Arc::new(MetricsRegistry::new().unwrap()),
        25,
        5,
        false,
    )
}

// ---- Scenario Tests ----

#[tokio::test]
async fn full_cycle_settles_credits_and_notifies() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::new());
    let orch = orchestrator(
        vec![decided_game("g1", "30", "17")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    );

    let summary = orch.run_cycle().await.unwrap();
    assert_eq!(summary.settled, 1);
    assert_eq!(summary.unresolved, 0);
    assert_eq!(summary.conflicts, 0);

    // Winner credited stake + profit at -150: 100 + 66.67.
    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(566.67));

    // Loser's balance untouched; the stake was gone at placement.
    let u2 = store.account(&"u2".to_string()).await.unwrap().unwrap();
    assert_eq!(u2.balance, dec!(450));

    // XP landed post-commit: 25 for the win, 5 for the loss.
    assert_eq!(u1.xp, 25);
    assert_eq!(u2.xp, 5);

    // Both owners got their result DM.
    let u1_msgs = messenger.messages_for("u1").await;
    assert_eq!(u1_msgs.len(), 1);
    assert!(u1_msgs[0].contains("won"));
    assert!(u1_msgs[0].contains("166.67"));
    let u2_msgs = messenger.messages_for("u2").await;
    assert_eq!(u2_msgs.len(), 1);
    assert!(u2_msgs[0].contains("lost"));

    // Fully drained matchup is retired and unlocked.
    assert!(store.matchup(&"g1".to_string()).await.unwrap().is_none());
    assert!(!store.is_locked(&"g1".to_string()).await.unwrap());
}

#[tokio::test]
async fn repeated_cycles_never_settle_twice() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::new());
    let orch = orchestrator(
        vec![decided_game("g1", "30", "17")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    );

    orch.run_cycle().await.unwrap();
    let second = orch.run_cycle().await.unwrap();
    let third = orch.run_cycle().await.unwrap();

    // The matchup was retired after the first cycle, so later cycles see
    // nothing to check and credit nothing.
    assert_eq!(second.settled + third.settled, 0);
    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(566.67));
    assert_eq!(u1.xp, 25);
    assert_eq!(messenger.messages_for("u1").await.len(), 1);
}

#[tokio::test]
async fn tie_defers_settlement_to_a_later_cycle() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::new());
    let orch = orchestrator(
        vec![decided_game("g1", "21", "21")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    );

    let summary = orch.run_cycle().await.unwrap();
    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.settled, 0);

    // Nothing moved: balances, bets, lock, and matchup all intact.
    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(400));
    assert_eq!(store.pending_bets(&"g1".to_string()).await.unwrap().len(), 2);
    assert!(store.matchup(&"g1".to_string()).await.unwrap().is_some());
    assert!(!store.is_locked(&"g1".to_string()).await.unwrap());
    assert!(messenger.messages_for("u1").await.is_empty());
}

#[tokio::test]
async fn unreachable_users_do_not_disturb_the_ledger() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::failing());
    let orch = orchestrator(
        vec![decided_game("g1", "30", "17")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    );

    let summary = orch.run_cycle().await.unwrap();
    assert_eq!(summary.settled, 1);

    // Every DM failed, yet the commit and the XP both stand.
    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(566.67));
    assert_eq!(u1.xp, 25);
}

#[tokio::test]
async fn manual_trigger_matches_the_scheduled_path() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::new());
    let orch = orchestrator(
        vec![decided_game("g1", "30", "17")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    );

    let report = orch.force_settle(&"g1".to_string()).await.unwrap();
    assert_eq!(report.processed, 2);
    assert!(report.errors.is_empty());

    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(566.67));
    assert!(!orch.is_settling(&"g1".to_string()).await.unwrap());
}

#[tokio::test]
async fn concurrent_triggers_credit_exactly_once() {
    let store = seeded_store().await;
    let messenger = Arc::new(RecordingMessenger::new());
    let orch = Arc::new(orchestrator(
        vec![decided_game("g1", "30", "17")],
        Arc::clone(&store),
        Arc::clone(&messenger),
    ));

    // Scheduled poll and manual trigger racing for the same matchup.
    let a = Arc::clone(&orch);
    let b = Arc::clone(&orch);
    let (cycle, manual) = tokio::join!(
        tokio::spawn(async move { a.run_cycle().await }),
        tokio::spawn(async move { b.force_settle(&"g1".to_string()).await }),
    );
    let cycle = cycle.unwrap();
    let manual = manual.unwrap();

    // Whichever interleaving happened, the money moved exactly once.
    let u1 = store.account(&"u1".to_string()).await.unwrap().unwrap();
    assert_eq!(u1.balance, dec!(566.67));
    assert_eq!(u1.xp, 25);

    // At least one trigger succeeded; the other either lost the lock,
    // found the matchup already retired, or committed zero rows.
    let cycle_settled = cycle.map(|s| s.settled).unwrap_or(0);
    let manual_processed = manual.map(|r| r.processed).unwrap_or(0);
    assert!(cycle_settled == 1 || manual_processed == 2);
}
