//! Payout Benchmarks — Settlement Hot-Path Performance
//!
//! Benchmarks the pure arithmetic that runs once per pending bet during
//! a settlement cycle: payout quoting, winner resolution, and the level
//! lookup.
//!
//! Run with: cargo bench --bench payout_bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use sportsbook_settlement_bot::domain::outcome::{
    CompletedGame, ScoreEntry, WinnerResolver,
};
use sportsbook_settlement_bot::domain::payout::PayoutCalculator;
use sportsbook_settlement_bot::domain::progression::level_for_xp;

/// Benchmark a favorite quote with a repeating-fraction profit.
fn bench_quote_favorite(c: &mut Criterion) {
    c.bench_function("quote_favorite_minus_110", |b| {
        b.iter(|| {
            let _quote =
                PayoutCalculator::quote(black_box(-110), black_box(dec!(25)));
        });
    });
}

/// Benchmark an underdog quote.
fn bench_quote_underdog(c: &mut Criterion) {
    c.bench_function("quote_underdog_plus_200", |b| {
        b.iter(|| {
            let _quote =
                PayoutCalculator::quote(black_box(200), black_box(dec!(100)));
        });
    });
}

/// Benchmark winner resolution over a well-formed two-score game.
fn bench_resolve_winner(c: &mut Criterion) {
    let game = CompletedGame {
        id: "g1".to_string(),
        home_team: "TeamA".to_string(),
        away_team: "TeamB".to_string(),
        completed: true,
        scores: vec![
            ScoreEntry {
                name: "TeamA".to_string(),
                score: "30".to_string(),
            },
            ScoreEntry {
                name: "TeamB".to_string(),
                score: "17".to_string(),
            },
        ],
    };

    c.bench_function("resolve_decided_game", |b| {
        b.iter(|| {
            let _outcome = WinnerResolver::resolve(black_box(&game));
        });
    });
}

/// Benchmark the XP-to-level table lookup.
fn bench_level_lookup(c: &mut Criterion) {
    c.bench_function("level_for_xp_mid_table", |b| {
        b.iter(|| {
            let _level = level_for_xp(black_box(4_321));
        });
    });
}

criterion_group!(
    benches,
    bench_quote_favorite,
    bench_quote_underdog,
    bench_resolve_winner,
    bench_level_lookup
);
criterion_main!(benches);
