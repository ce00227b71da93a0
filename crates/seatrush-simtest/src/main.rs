//! SeatRush Headless Simulation Harness
//!
//! Plays whole games in-process and validates crowd invariants. No window,
//! no input device, no rendering beyond an optional JSON dump.
//!
//! Usage:
//!   cargo run -p seatrush-simtest
//!   cargo run -p seatrush-simtest -- --verbose --seed 7
//!   cargo run -p seatrush-simtest -- --config venue.json --dump
//!
//! Set `RUST_LOG=debug` to see seat events as they happen.

use std::collections::HashMap;
use std::fs::File;

use log::{info, warn};
use seatrush_core::generation::{check_layout, generate_venue, Severity, VenueConfig};
use seatrush_core::prelude::*;
use seatrush_core::systems::{seat_score, MAX_SEAT_SCORE, MIN_SEAT_SCORE};

/// Hard stop for a single game
const TICK_LIMIT: u64 = 5_000;
const DEFAULT_SEED: u64 = 42;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    dump: bool,
    seed: Option<u64>,
    config_path: Option<String>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        dump: false,
        seed: None,
        config_path: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--dump" => options.dump = true,
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                let seed = value
                    .parse()
                    .map_err(|_| format!("--seed expects an integer, got '{}'", value))?;
                options.seed = Some(seed);
            }
            "--config" => {
                options.config_path = Some(args.next().ok_or("--config needs a path")?);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(options)
}

fn load_config(options: &Options) -> Result<SimConfig, ConfigError> {
    let mut config = match &options.config_path {
        Some(path) => SimConfig::from_reader(File::open(path)?)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = Some(seed);
    }
    if config.seed.is_none() {
        config.seed = Some(DEFAULT_SEED);
    }
    Ok(config)
}

fn main() {
    env_logger::init();

    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: seatrush-simtest [--verbose] [--seed N] [--config FILE] [--dump]");
            std::process::exit(2);
        }
    };
    let config = match load_config(&options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    let verbose = options.verbose;

    println!("=== SeatRush Simulation Harness ===");
    println!(
        "venue {}x{}, {} agents, user #{}, seed {:?}, policy {:?}\n",
        config.venue.width,
        config.venue.height,
        config.venue.agent_count,
        config.venue.user_index,
        config.seed,
        config.seat_policy
    );

    let mut results = Vec::new();

    // 1. Config validation
    results.extend(validate_config_rules(verbose));

    // 2. Venue layout and scoring
    results.extend(validate_venue(&config.venue, verbose));

    // 3. Full game, no user input
    let final_snapshot = match SimulationEngine::new(config.clone()) {
        Ok(mut engine) => {
            results.extend(validate_full_game(&mut engine, verbose));
            Some(engine.snapshot())
        }
        Err(e) => {
            results.push(TestResult::new("engine_build", false, e.to_string()));
            None
        }
    };

    // 4. Crowd contention across seeds
    results.extend(validate_seed_sweep(&config, verbose));

    // 5. Determinism and restart
    results.extend(validate_determinism(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if options.dump {
        match final_snapshot.map(|s| s.to_json_pretty()) {
            Some(Ok(json)) => println!("{}", json),
            Some(Err(e)) => warn!("Could not serialize final snapshot: {}", e),
            None => warn!("No snapshot to dump"),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config_rules(verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    results.push(TestResult::new(
        "config_default_valid",
        SimConfig::default().validate().is_ok(),
        "default config validates",
    ));

    let bad: [(&str, SimConfig); 5] = [
        ("tiny_grid", with_venue(|v| v.height = 4)),
        ("no_agents", with_venue(|v| v.agent_count = 0)),
        ("user_out_of_range", with_venue(|v| v.user_index = v.agent_count)),
        ("too_crowded", with_venue(|v| v.agent_count = 500)),
        (
            "inverted_intervals",
            SimConfig {
                npc_min_interval: 5,
                npc_max_interval: 2,
                ..Default::default()
            },
        ),
    ];
    for (name, config) in bad {
        let result = config.validate();
        if verbose {
            if let Err(e) = &result {
                println!("  {} → {}", name, e);
            }
        }
        results.push(TestResult::new(
            &format!("config_rejects_{}", name),
            result.is_err(),
            match result {
                Err(e) => e.to_string(),
                Ok(()) => "accepted an unplayable config".into(),
            },
        ));
    }

    let parsed = SimConfig::from_json_str(r#"{ "seed": 3, "venue": { "agent_count": 20, "user_index": 5 } }"#);
    results.push(TestResult::new(
        "config_partial_json",
        parsed
            .as_ref()
            .is_ok_and(|c| c.venue.agent_count == 20 && c.venue.width == 30),
        match &parsed {
            Ok(c) => format!("agents {}, width {}", c.venue.agent_count, c.venue.width),
            Err(e) => e.to_string(),
        },
    ));

    results
}

fn with_venue(edit: impl FnOnce(&mut VenueConfig)) -> SimConfig {
    let mut config = SimConfig::default();
    edit(&mut config.venue);
    config
}

// ── 2. Venue ────────────────────────────────────────────────────────────

fn validate_venue(venue: &VenueConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Venue ---");
    let mut results = Vec::new();

    let grid = generate_venue(venue);
    let issues = check_layout(&grid);
    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    if verbose {
        for issue in &issues {
            println!("  [{:?}] {}: {}", issue.severity, issue.category, issue.message);
        }
    }
    results.push(TestResult::new(
        "venue_layout_valid",
        errors.is_empty(),
        if errors.is_empty() {
            format!("{} chairs, all reachable", grid.chairs().len())
        } else {
            format!("{} layout errors, first: {}", errors.len(), errors[0].message)
        },
    ));

    let chairs = grid.chairs();
    let ids: Vec<u32> = chairs
        .iter()
        .filter_map(|c| grid.get(*c).and_then(|cell| cell.chair_id))
        .collect();
    let sequential = ids.iter().enumerate().all(|(i, id)| *id == i as u32);
    results.push(TestResult::new(
        "venue_chair_ids_sequential",
        sequential && ids.len() == chairs.len(),
        format!("{} chair ids", ids.len()),
    ));

    let scores_ok = chairs.iter().all(|c| {
        grid.get(*c)
            .and_then(|cell| cell.score)
            .is_some_and(|s| s == seat_score(c.y, grid.height()))
    });
    results.push(TestResult::new(
        "venue_chair_scores",
        scores_ok,
        "every chair carries its row score",
    ));

    let reference = (seat_score(5, 15), seat_score(14, 15));
    results.push(TestResult::new(
        "score_reference_rows",
        reference == (367, 127),
        format!("row 5 → {}, row 14 → {}", reference.0, reference.1),
    ));

    let monotonic = (0..grid.height())
        .map(|row| seat_score(row, grid.height()))
        .collect::<Vec<_>>()
        .windows(2)
        .all(|w| w[0] >= w[1]);
    results.push(TestResult::new(
        "score_monotonic",
        monotonic,
        format!("scores within {}..={}", MIN_SEAT_SCORE, MAX_SEAT_SCORE),
    ));

    if verbose {
        println!("{}", grid.render_ascii(None, &|_| false));
    }

    results
}

// ── 3. Full game ────────────────────────────────────────────────────────

/// Invariant tallies gathered while a game runs.
#[derive(Default)]
struct GameAudit {
    occupancy_errors: Vec<String>,
    seated_moves: usize,
    foreign_chairs: usize,
}

fn play_audited(engine: &mut SimulationEngine) -> GameAudit {
    let mut audit = GameAudit::default();
    let mut seated_at: HashMap<AgentId, GridPos> = HashMap::new();
    while engine.phase() != GamePhase::Ended && engine.elapsed_ticks() < TICK_LIMIT {
        engine.tick();
        let world = engine.world();
        for problem in world.occupancy_mismatches() {
            if audit.occupancy_errors.len() < 10 {
                audit
                    .occupancy_errors
                    .push(format!("tick {}: {}", engine.elapsed_ticks(), problem));
            }
        }
        for view in world.agents() {
            if let Some(pos) = seated_at.get(&view.id) {
                if *pos != view.pos {
                    audit.seated_moves += 1;
                }
                continue;
            }
            let on_chair = world
                .cell_at(view.pos)
                .is_some_and(|c| c.cell_type.is_chair());
            if on_chair && !view.is_user && view.target_seat != Some(view.pos) {
                audit.foreign_chairs += 1;
            }
            if view.is_seated() {
                seated_at.insert(view.id, view.pos);
            }
        }
    }
    audit
}

fn validate_full_game(engine: &mut SimulationEngine, verbose: bool) -> Vec<TestResult> {
    println!("--- Full Game ---");
    let mut results = Vec::new();

    let audit = play_audited(engine);
    let events = engine.drain_events();

    results.push(TestResult::new(
        "game_occupancy_consistent",
        audit.occupancy_errors.is_empty(),
        if audit.occupancy_errors.is_empty() {
            format!("index matched positions for {} ticks", engine.elapsed_ticks())
        } else {
            audit.occupancy_errors.join("; ")
        },
    ));
    results.push(TestResult::new(
        "game_seated_stay_put",
        audit.seated_moves == 0,
        format!("{} moves by seated agents", audit.seated_moves),
    ));
    results.push(TestResult::new(
        "game_npcs_own_chairs_only",
        audit.foreign_chairs == 0,
        format!("{} NPCs on foreign chairs", audit.foreign_chairs),
    ));

    let ended = engine.phase() == GamePhase::Ended;
    results.push(TestResult::new(
        "game_reaches_end",
        ended,
        format!(
            "{:?} after {} ticks, {}/{} seated",
            engine.phase(),
            engine.elapsed_ticks(),
            engine.seated_count(),
            engine.world().agent_count()
        ),
    ));

    let end_events = events
        .iter()
        .filter(|e| matches!(e, SimEvent::GameEnded { .. }))
        .count();
    results.push(TestResult::new(
        "game_ends_once",
        end_events == usize::from(ended),
        format!("{} GameEnded events", end_events),
    ));

    let seat_events = events
        .iter()
        .filter(|e| matches!(e, SimEvent::Seated { .. }))
        .count();
    results.push(TestResult::new(
        "game_seat_events_match",
        seat_events == engine.seated_count(),
        format!("{} seat events, {} seated", seat_events, engine.seated_count()),
    ));

    if let Some(outcome) = engine.outcome() {
        info!(
            "Game finished in {} ticks with {} of {} agents seated",
            outcome.ticks, outcome.seated_count, outcome.agent_count
        );
    }
    if verbose {
        println!("{}", engine.snapshot().render_ascii());
    }

    results
}

// ── 4. Seed sweep ───────────────────────────────────────────────────────

/// Fixed seed range, independent of `--seed`. Seeds 4, 5, 11 and 44 used to
/// jam the default venue.
const SWEEP_SEEDS: std::ops::Range<u64> = 0..64;

fn validate_seed_sweep(base: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Seed Sweep (seeds {:?}) ---", SWEEP_SEEDS);
    let mut unfinished = Vec::new();
    let mut broken = Vec::new();
    let mut ticks = Vec::new();

    for seed in SWEEP_SEEDS {
        let config = SimConfig {
            seed: Some(seed),
            ..base.clone()
        };
        let Ok(mut engine) = SimulationEngine::new(config) else {
            broken.push(seed);
            continue;
        };
        let audit = play_audited(&mut engine);
        if !audit.occupancy_errors.is_empty() || audit.seated_moves > 0 || audit.foreign_chairs > 0 {
            broken.push(seed);
        }
        if engine.phase() != GamePhase::Ended {
            unfinished.push(seed);
        }
        ticks.push(engine.elapsed_ticks());
        if verbose {
            println!(
                "  seed {}: {} ticks, {} seated",
                seed,
                engine.elapsed_ticks(),
                engine.seated_count()
            );
        }
    }

    let max_ticks = ticks.iter().copied().max().unwrap_or(0);
    vec![
        TestResult::new(
            "sweep_invariants_hold",
            broken.is_empty(),
            format!("violations on seeds {:?}", broken),
        ),
        TestResult::new(
            "sweep_all_finish",
            unfinished.is_empty(),
            format!("slowest game {} ticks, unfinished seeds {:?}", max_ticks, unfinished),
        ),
    ]
}

// ── 5. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(config: &SimConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();

    let run = |ticks: u32| -> Option<String> {
        let mut engine = SimulationEngine::new(config.clone()).ok()?;
        for _ in 0..ticks {
            engine.tick();
        }
        engine.snapshot().to_json().ok()
    };
    let (a, b) = (run(200), run(200));
    results.push(TestResult::new(
        "same_seed_same_game",
        a.is_some() && a == b,
        "two runs of 200 ticks produce identical snapshots",
    ));

    let restarted = SimulationEngine::new(config.clone()).map(|mut engine| {
        for _ in 0..30 {
            engine.tick();
        }
        engine.restart();
        let snap = engine.snapshot();
        snap.tick == 0
            && snap.seated_count == 0
            && snap.phase == GamePhase::Running
            && engine.world().occupancy_mismatches().is_empty()
    });
    results.push(TestResult::new(
        "restart_is_clean",
        restarted.unwrap_or(false),
        "restart rebuilds grid and crowd from scratch",
    ));

    results
}
