//! Sportsbook Settlement Bot — Entry Point
//!
//! Initializes configuration, logging, the ledger store, and the
//! settlement orchestrator. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load secrets from env vars (SCORE_FEED_API_KEY, MESSAGING_BOT_TOKEN)
//! 4. Open the persistent ledger (snapshot recovery + audit log)
//! 5. Create the score feed client (HTTP + timeout + bounded retry)
//! 6. Create the messaging gateway (rate-limited DM client)
//! 7. Wire the settlement orchestrator (guard + transaction + events)
//! 8. Spawn the admin server (/live, /ready, /metrics, manual trigger)
//! 9. Spawn the scheduled poll loop
//! 10. Wait for SIGINT → graceful shutdown (stop poll → drain → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::feeds::{ScoreApiConfig, ScoreApiFeed};
use adapters::messaging::{GatewayConfig, MessagingGateway};
use adapters::metrics::MetricsRegistry;
use adapters::persistence::PersistentLedger;
use usecases::settlement::{SettlementOrchestrator, log_fatal};

/// The fully wired orchestrator type shared by the poll loop and admin server.
type Orchestrator =
    SettlementOrchestrator<ScoreApiFeed, PersistentLedger, MessagingGateway>;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.bot.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        poll_interval = config.score_feed.poll_interval_seconds,
        "Starting settlement bot"
    );

    // ── 3. Load secrets from env vars ───────────────────────
    let api_key = std::env::var("SCORE_FEED_API_KEY")
        .context("SCORE_FEED_API_KEY must be set")?;
    let bot_token = if config.bot.dry_run {
        // Dry-run never sends; an empty token is fine.
        std::env::var("MESSAGING_BOT_TOKEN").unwrap_or_default()
    } else {
        std::env::var("MESSAGING_BOT_TOKEN")
            .context("MESSAGING_BOT_TOKEN must be set")?
    };

    // ── 4. Open the persistent ledger ───────────────────────
    let store = Arc::new(
        PersistentLedger::open(&config.persistence.data_dir)
            .await
            .context("Failed to open ledger store")?,
    );

    // ── 5. Create the score feed client ─────────────────────
    let feed = Arc::new(
        ScoreApiFeed::new(ScoreApiConfig {
            base_url: config.score_feed.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(config.score_feed.timeout_seconds),
            max_retries: config.score_feed.max_retries,
            retry_base_delay: Duration::from_millis(
                config.score_feed.retry_base_delay_ms,
            ),
        })
        .context("Failed to create score feed client")?,
    );

    // ── 6. Create the messaging gateway ─────────────────────
    let messenger = Arc::new(
        MessagingGateway::new(GatewayConfig {
            base_url: config.messaging.base_url.clone(),
            bot_token,
            timeout: Duration::from_secs(config.messaging.timeout_seconds),
            requests_per_second: config.messaging.requests_per_second,
        })
        .context("Failed to create messaging gateway")?,
    );

    // ── 7. Wire the settlement orchestrator ─────────────────
    let metrics =
        Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let orchestrator = Arc::new(Orchestrator::new(
        feed,
        store,
        messenger,
        Arc::clone(&metrics),
        config.progression.xp_per_win,
        config.progression.xp_per_loss,
        config.bot.dry_run,
    ));

    if config.bot.dry_run {
        warn!("Dry-run mode — settlements committed but NO messages sent");
    }

    // ── 8. Shutdown channels + admin server ─────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (health_tx, health_rx) = watch::channel(true);

    let admin_handle = tokio::spawn(serve_admin(
        config.admin.bind_address.clone(),
        Arc::clone(&orchestrator),
        Arc::clone(&metrics),
        health_rx,
    ));

    // ── 9. Spawn the scheduled poll loop ────────────────────
    let poll_shutdown = shutdown_tx.subscribe();
    let poll_orchestrator = Arc::clone(&orchestrator);
    let poll_interval = config.score_feed.poll_interval_seconds;
    let poll_handle = tokio::spawn(async move {
        run_poll_loop(poll_orchestrator, poll_interval, poll_shutdown).await;
    });

    info!("All tasks spawned — settlement bot is running");

    // ── 10. Wait for SIGINT ─────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("SIGINT received, initiating graceful shutdown");

    // ── Graceful shutdown (stop poll → drain → exit) ────────

    // 1. Signal the poll loop to stop
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast");

    // 2. Mark readiness probe unhealthy (503)
    let _ = health_tx.send(false);

    // 3. Wait for any in-flight cycle to finish (up to 30s)
    info!("Waiting for poll loop shutdown...");
    let _ = tokio::time::timeout(Duration::from_secs(30), poll_handle).await;

    // 4. Stop the admin server
    admin_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

/// The scheduled trigger: run a settlement cycle on a fixed interval.
///
/// A fatal cycle error is logged at operator severity and the loop keeps
/// going; the next tick retries naturally.
async fn run_poll_loop(
    orchestrator: Arc<Orchestrator>,
    interval_seconds: u64,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Poll loop received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                match orchestrator.run_cycle().await {
                    Ok(summary) if summary.settled > 0 => {
                        info!(settled = summary.settled, "Cycle settled matchups");
                    }
                    Ok(_) => {}
                    Err(e) => log_fatal(&e),
                }
            }
        }
    }

    info!("Poll loop stopped cleanly");
}

/// Serve the admin endpoints.
///
/// - `GET /live` — liveness probe: 200 while the process runs
/// - `GET /ready` — readiness probe: 503 during graceful shutdown
/// - `GET /metrics` — Prometheus exposition
/// - `GET /settling/:matchup_id` — whether a settlement is in flight
/// - `POST /admin/settle/:matchup_id` — manual "force close" trigger
async fn serve_admin(
    bind_address: String,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<MetricsRegistry>,
    health_rx: watch::Receiver<bool>,
) -> Result<()> {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use crate::usecases::settlement::{SettlementError, SettlementStatus};

    #[derive(Clone)]
    struct AdminState {
        orchestrator: Arc<Orchestrator>,
        metrics: Arc<MetricsRegistry>,
        health: watch::Receiver<bool>,
    }

    let state = AdminState {
        orchestrator,
        metrics,
        health: health_rx,
    };

    let app = Router::new()
        .route("/live", get(|| async { StatusCode::OK }))
        .route(
            "/ready",
            get(|State(s): State<AdminState>| async move {
                if *s.health.borrow() {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        )
        .route(
            "/metrics",
            get(|State(s): State<AdminState>| async move {
                s.metrics
                    .render()
                    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
            }),
        )
        .route(
            "/settling/:matchup_id",
            get(
                |State(s): State<AdminState>, Path(matchup_id): Path<String>| async move {
                    match s.orchestrator.is_settling(&matchup_id).await {
                        Ok(settling) => {
                            Ok(Json(serde_json::json!({ "settling": settling })))
                        }
                        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
                    }
                },
            ),
        )
        .route(
            "/admin/settle/:matchup_id",
            post(
                |State(s): State<AdminState>, Path(matchup_id): Path<String>| async move {
                    match s.orchestrator.force_settle(&matchup_id).await {
                        Ok(report) => {
                            let status = match &report.status {
                                SettlementStatus::Settled => "settled",
                                SettlementStatus::AlreadySettling => "already_settling",
                                SettlementStatus::Unresolved(_) => "unresolved",
                            };
                            Ok(Json(serde_json::json!({
                                "matchup_id": report.matchup_id,
                                "status": status,
                                "processed": report.processed,
                                "skipped": report.skipped,
                                "row_errors": report.errors.len(),
                            })))
                        }
                        Err(
                            SettlementError::MatchupNotFound(_)
                            | SettlementError::GameNotFound(_),
                        ) => Err(StatusCode::NOT_FOUND),
                        Err(SettlementError::FeedUnavailable(_)) => {
                            Err(StatusCode::BAD_GATEWAY)
                        }
                        // Generic failure for manual triggers; details stay
                        // in the operator logs.
                        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
                    }
                },
            ),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(addr = %bind_address, "Admin server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
