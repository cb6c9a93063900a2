//! Prometheus Metrics Registry - Settlement Observability
//!
//! Registers the settlement engine's Prometheus metrics, rendered by the
//! admin server's `/metrics` endpoint. Covers cycle counts, settled
//! matchups and bets, credited payout volume, feed health, and guard
//! contention.

use prometheus::{
    Counter, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the settlement engine.
///
/// All metrics follow the naming convention `settlement_bot_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Scheduled poll cycles run.
    pub cycles: IntCounter,
    /// Score feed fetch failures (transient, cycle deferred).
    pub feed_failures: IntCounter,
    /// Settlement attempts that hit a held guard.
    pub guard_conflicts: IntCounter,
    /// Matchups settled.
    pub matchups_settled: IntCounter,
    /// Bets finalized, labelled by terminal result.
    pub bets_settled: IntCounterVec,
    /// Total virtual currency credited to winners.
    pub payout_credited: Counter,
    /// Wall-clock duration of the guarded settlement section.
    pub settlement_duration: Histogram,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounter::new(
            "settlement_bot_cycles_total",
            "Scheduled settlement poll cycles run",
        )?;

        let feed_failures = IntCounter::new(
            "settlement_bot_feed_failures_total",
            "Score feed fetch failures",
        )?;

        let guard_conflicts = IntCounter::new(
            "settlement_bot_guard_conflicts_total",
            "Settlement attempts skipped because the matchup was locked",
        )?;

        let matchups_settled = IntCounter::new(
            "settlement_bot_matchups_settled_total",
            "Matchups settled",
        )?;

        let bets_settled = IntCounterVec::new(
            Opts::new("settlement_bot_bets_settled_total", "Bets finalized"),
            &["result"],
        )?;

        let payout_credited = Counter::new(
            "settlement_bot_payout_credited_total",
            "Total payout credited to winning accounts",
        )?;

        let settlement_duration = Histogram::with_opts(
            HistogramOpts::new(
                "settlement_bot_settlement_duration_seconds",
                "Duration of the guarded settlement section",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(feed_failures.clone()))?;
        registry.register(Box::new(guard_conflicts.clone()))?;
        registry.register(Box::new(matchups_settled.clone()))?;
        registry.register(Box::new(bets_settled.clone()))?;
        registry.register(Box::new(payout_credited.clone()))?;
        registry.register(Box::new(settlement_duration.clone()))?;

        Ok(Self {
            registry,
            cycles,
            feed_failures,
            guard_conflicts,
            matchups_settled,
            bets_settled,
            payout_credited,
            settlement_duration,
        })
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_render() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.cycles.inc();
        metrics.bets_settled.with_label_values(&["won"]).inc();
        metrics.payout_credited.inc_by(166.67);

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("settlement_bot_cycles_total 1"));
        assert!(rendered.contains("settlement_bot_bets_settled_total"));
    }
}
