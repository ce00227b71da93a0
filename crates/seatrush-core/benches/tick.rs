//! Tick throughput on the default venue and on a crowded large one.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use seatrush_core::generation::VenueConfig;
use seatrush_core::prelude::*;

fn engine_for(venue: VenueConfig, seed: u64) -> SimulationEngine {
    let config = SimConfig {
        venue,
        ..SimConfig::seeded(seed)
    };
    match SimulationEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => panic!("bench config rejected: {}", e),
    }
}

fn bench_ticks(c: &mut Criterion) {
    c.bench_function("tick_default_venue", |b| {
        b.iter_batched(
            || engine_for(VenueConfig::default(), 1),
            |mut engine| {
                for _ in 0..50 {
                    black_box(engine.tick());
                }
                engine
            },
            BatchSize::SmallInput,
        )
    });

    let large = VenueConfig {
        width: 120,
        height: 60,
        agent_count: 200,
        user_index: 0,
    };
    c.bench_function("tick_large_venue", |b| {
        b.iter_batched(
            || engine_for(large.clone(), 2),
            |mut engine| {
                for _ in 0..10 {
                    black_box(engine.tick());
                }
                engine
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("full_game_default_venue", |b| {
        b.iter_batched(
            || engine_for(VenueConfig::default(), 3),
            |mut engine| {
                while engine.phase() != GamePhase::Ended && engine.elapsed_ticks() < 5_000 {
                    engine.tick();
                }
                black_box(engine.outcome())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let engine = engine_for(VenueConfig::default(), 4);
    c.bench_function("snapshot_to_json", |b| {
        b.iter(|| black_box(engine.snapshot().to_json()))
    });
}

criterion_group!(benches, bench_ticks, bench_full_game, bench_snapshot);
criterion_main!(benches);
