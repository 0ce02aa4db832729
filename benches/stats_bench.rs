//! Benchmarks for the stats aggregator
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use versus::{stats, Match};

const PLAYERS: [&str; 8] = ["alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi"];

/// A league history cycling through every pairing, newest first
fn create_test_matches(count: usize) -> Vec<Match> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    let mut matches: Vec<Match> = (0..count)
        .map(|i| {
            let p1 = PLAYERS[i % PLAYERS.len()];
            let p2 = PLAYERS[(i / PLAYERS.len() + i + 1) % PLAYERS.len()];
            let p2 = if p1 == p2 { PLAYERS[(i + 1) % PLAYERS.len()] } else { p2 };
            let s1 = (i * 7 % 21) as i64;
            let s2 = if (i * 3 % 21) as i64 == s1 { s1 + 1 } else { (i * 3 % 21) as i64 };

            Match {
                id: format!("match-{}", i),
                league_id: "bench".to_string(),
                player1: p1.to_string(),
                player2: p2.to_string(),
                player1_score: s1,
                player2_score: s2,
                winner: if s1 > s2 { p1 } else { p2 }.to_string(),
                created_at: start + Duration::minutes(i as i64),
                updated_at: None,
            }
        })
        .collect();

    matches.reverse();
    matches
}

fn registered() -> Vec<String> {
    PLAYERS.iter().map(|p| p.to_string()).collect()
}

fn bench_player_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("player_stats");

    for size in [100, 1000, 10000] {
        let matches = create_test_matches(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("single_{}", size), |b| {
            b.iter(|| stats::player_stats(black_box(&matches), "alice"))
        });

        group.bench_function(format!("opponents_{}", size), |b| {
            b.iter(|| stats::opponent_records(black_box(&matches), "alice"))
        });
    }

    group.finish();
}

fn bench_league_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("league");
    let players = registered();

    for size in [100, 1000, 10000] {
        let matches = create_test_matches(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("rankings_{}", size), |b| {
            b.iter(|| stats::rankings(black_box(&matches), &players))
        });

        group.bench_function(format!("summary_{}", size), |b| {
            b.iter(|| stats::league_summary(black_box(&matches), &players))
        });

        group.bench_function(format!("head_to_head_{}", size), |b| {
            b.iter(|| stats::head_to_head(black_box(&matches), "bob", "alice"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_player_stats, bench_league_views);
criterion_main!(benches);
