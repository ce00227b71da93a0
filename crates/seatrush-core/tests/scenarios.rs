//! End-to-end seating scenarios.

use std::collections::{HashMap, HashSet};

use hecs::{EntityBuilder, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use seatrush_core::engine::IgnoreReason;
use seatrush_core::generation::{check_layout, generate_venue, Severity, VenueConfig};
use seatrush_core::prelude::*;
use seatrush_core::systems::{nearest_open_chair, plan_npc_moves, resolve_seat_conflicts};

/// Tick until the game ends, checking crowd invariants after every tick.
fn run_checked(engine: &mut SimulationEngine, limit: u64) {
    let mut seated_at: HashMap<AgentId, GridPos> = HashMap::new();
    while engine.phase() != GamePhase::Ended {
        assert!(
            engine.elapsed_ticks() < limit,
            "game still running after {} ticks ({} seated)",
            limit,
            engine.seated_count()
        );
        engine.tick();
        let world = engine.world();

        let mismatches = world.occupancy_mismatches();
        assert!(mismatches.is_empty(), "tick {}: {:?}", engine.elapsed_ticks(), mismatches);

        for view in world.agents() {
            if let Some(pos) = seated_at.get(&view.id) {
                assert_eq!(*pos, view.pos, "seated {} moved", view.id);
                continue;
            }
            let on_chair = world
                .cell_at(view.pos)
                .is_some_and(|c| c.cell_type.is_chair());
            if on_chair && !view.is_user {
                assert_eq!(view.target_seat, Some(view.pos), "{} took a chair not its own", view.id);
            }
            if view.is_seated() {
                assert!(on_chair);
                seated_at.insert(view.id, view.pos);
            }
        }
    }
}

#[test]
fn default_venue_fills_without_user_input() {
    let config = SimConfig::seeded(4);
    let mut engine = SimulationEngine::new(config).unwrap();
    assert_eq!(engine.world().grid().width(), 30);
    assert_eq!(engine.world().grid().height(), 15);
    assert_eq!(engine.world().user(), Some(AgentId(24)));

    run_checked(&mut engine, 5_000);

    let outcome = engine.outcome().unwrap();
    assert_eq!(outcome.agent_count, 48);
    assert_eq!(outcome.seated_count, 47);
    assert_eq!(outcome.user_seat, None);
    assert!(engine.world().all_npcs_seated());

    let ended = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::GameEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[test]
fn default_venue_finishes_across_seed_sweep() {
    let mut slowest = 0;
    for seed in 0..100 {
        let mut engine = SimulationEngine::new(SimConfig::seeded(seed)).unwrap();
        run_checked(&mut engine, 2_000);
        assert_eq!(engine.phase(), GamePhase::Ended, "seed {}", seed);
        assert!(engine.world().all_npcs_seated(), "seed {}", seed);
        assert_eq!(engine.seated_count(), 47, "seed {}", seed);
        slowest = slowest.max(engine.elapsed_ticks());
    }
    assert!(slowest > 0);
}

#[test]
fn generated_layout_passes_checks() {
    let grid = generate_venue(&VenueConfig::default());
    let errors: Vec<_> = check_layout(&grid)
        .into_iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(grid.chairs().len(), 52);
}

#[test]
fn surplus_npcs_end_when_chairs_run_out() {
    // Minimum venue has one chair; two NPCs share it
    let config = SimConfig {
        venue: VenueConfig {
            width: 5,
            height: 8,
            agent_count: 3,
            user_index: 0,
        },
        ..SimConfig::seeded(5)
    };
    let mut engine = SimulationEngine::new(config).unwrap();
    run_checked(&mut engine, 1_000);
    assert_eq!(engine.seated_count(), 1);
    assert!(engine.world().open_chairs().is_empty());
}

#[test]
fn same_seed_same_game() {
    let play = |seed| {
        let mut engine = SimulationEngine::new(SimConfig::seeded(seed)).unwrap();
        for _ in 0..150 {
            engine.tick();
        }
        engine.snapshot().to_json().unwrap()
    };
    assert_eq!(play(31), play(31));
    assert_ne!(play(31), play(32));
}

#[test]
fn restart_builds_a_fresh_consistent_world() {
    let mut engine = SimulationEngine::new(SimConfig::seeded(8)).unwrap();
    for _ in 0..40 {
        engine.tick();
    }
    engine.request_user_move(Direction::Up);
    engine.restart();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, GamePhase::Running);
    assert_eq!(snap.tick, 0);
    assert_eq!(snap.user_moves, 0);
    assert_eq!(snap.seated_count, 0);
    assert!(engine.world().occupancy_mismatches().is_empty());

    run_checked(&mut engine, 5_000);
}

/// Step the user greedily toward the nearest open chair, any direction as a
/// fallback. The user may enter any chair, so the first one reached seats them.
fn walk_user(engine: &mut SimulationEngine) -> Option<UserMoveResult> {
    let world = engine.world();
    let me = world.user()?;
    let pos = world.position(me)?;
    let chair = nearest_open_chair(world, pos, &HashSet::new())?;
    let mut dirs = Vec::new();
    if chair.y < pos.y {
        dirs.push(Direction::Up);
    }
    if chair.x < pos.x {
        dirs.push(Direction::Left);
    } else if chair.x > pos.x {
        dirs.push(Direction::Right);
    }
    dirs.extend(Direction::ALL);
    dirs.into_iter()
        .map(|d| engine.request_user_move(d))
        .find(|r| r.is_applied())
}

#[test]
fn user_can_sit_and_is_ranked() {
    let mut engine = SimulationEngine::new(SimConfig::seeded(12)).unwrap();
    engine.start();
    let mut seated = None;
    for _ in 0..200 {
        if let Some(UserMoveResult::Seated { score, .. }) = walk_user(&mut engine) {
            seated = Some(score);
            break;
        }
        engine.tick();
    }
    let score = seated.expect("user never reached a chair");
    assert_eq!(engine.user_score(), Some(score));
    assert_eq!(
        engine.request_user_move(Direction::Down),
        UserMoveResult::Ignored(IgnoreReason::AlreadySeated)
    );

    run_checked(&mut engine, 5_000);
    let outcome = engine.outcome().unwrap();
    assert_eq!(outcome.user_seat.map(|s| s.score), Some(score));
    let rank = outcome.user_rank.unwrap();
    assert!(rank >= 1 && rank <= outcome.seated_count);
}

// Hand-built worlds for contention scenarios.

fn venue(width: i32, height: i32, chairs: &[GridPos], walls: &[GridPos]) -> Grid {
    let mut grid = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            let t = if edge { CellType::Wall } else { CellType::Hallway };
            grid.set_type(GridPos::new(x, y), t);
        }
    }
    for &w in walls {
        grid.set_type(w, CellType::Wall);
    }
    for (i, &c) in chairs.iter().enumerate() {
        grid.set_type(c, CellType::Chair);
        if let Some(cell) = grid.get_mut(c) {
            cell.chair_id = Some(i as u32);
            cell.score = Some(400 - i as u32);
        }
    }
    grid
}

fn npc(world: &mut World, id: u32, pos: GridPos, target: GridPos) -> (AgentId, hecs::Entity) {
    let mut builder = EntityBuilder::new();
    builder
        .add(Agent { id: AgentId(id) })
        .add(pos)
        .add(Npc)
        .add(MoveCadence::new(1, 1))
        .add(TargetSeat(target));
    (AgentId(id), world.spawn(builder.build()))
}

fn user(world: &mut World, id: u32, pos: GridPos) -> (AgentId, hecs::Entity) {
    let entity = world.spawn((Agent { id: AgentId(id) }, pos, UserControlled));
    (AgentId(id), entity)
}

/// One engine-style tick on a bare world.
fn step(world: &mut WorldState, tick: u64, rng: &mut StdRng, policy: SeatConflictPolicy) {
    resolve_seat_conflicts(world, policy);
    let plan = plan_npc_moves(world, tick, rng);
    world.apply_moves(&plan.moves, tick);
    for agent in plan.considered {
        world.reschedule(agent, tick);
    }
}

#[test]
fn adjacent_seats_share_one_approach_cell() {
    // Both NPCs can only step onto (2,2) on the first tick
    let left = GridPos::new(1, 1);
    let right = GridPos::new(2, 1);
    let grid = venue(5, 5, &[left, right], &[GridPos::new(3, 1)]);
    let mut agents = World::new();
    let roster = vec![
        npc(&mut agents, 0, GridPos::new(2, 3), right),
        npc(&mut agents, 1, GridPos::new(3, 2), left),
    ];
    let mut world = WorldState::from_parts(grid, agents, roster);
    let mut rng = StdRng::seed_from_u64(3);

    let plan = plan_npc_moves(&world, 1, &mut rng);
    assert!(plan.moves.iter().all(|m| m.to == GridPos::new(2, 2)));
    let outcomes = world.apply_moves(&plan.moves, 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 1);
    assert_eq!(world.agent_at(GridPos::new(2, 2)), Some(AgentId(0)));
    assert!(world.occupancy_mismatches().is_empty());

    for tick in 2..200 {
        step(&mut world, tick, &mut rng, SeatConflictPolicy::Reassign);
        assert!(world.occupancy_mismatches().is_empty());
        if world.all_npcs_seated() {
            break;
        }
    }
    assert_eq!(world.position(AgentId(0)), Some(right));
    assert_eq!(world.position(AgentId(1)), Some(left));
    assert!(world.all_npcs_seated());
}

fn stolen_seat_world() -> WorldState {
    let taken = GridPos::new(2, 1);
    let spare = GridPos::new(5, 1);
    let grid = venue(7, 6, &[taken, spare], &[]);
    let mut agents = World::new();
    let roster = vec![
        npc(&mut agents, 0, GridPos::new(2, 4), taken),
        user(&mut agents, 1, GridPos::new(2, 2)),
    ];
    let mut world = WorldState::from_parts(grid, agents, roster);
    let outcomes = world.apply_moves(&[PlannedMove { agent: AgentId(1), to: taken }], 0);
    assert!(matches!(outcomes[0], MoveOutcome::Seated { .. }));
    world
}

#[test]
fn stolen_seat_is_reassigned() {
    let mut world = stolen_seat_world();
    let mut rng = StdRng::seed_from_u64(11);
    for tick in 1..300 {
        step(&mut world, tick, &mut rng, SeatConflictPolicy::Reassign);
        if world.all_npcs_seated() {
            break;
        }
    }
    assert!(world.all_npcs_seated());
    assert_eq!(world.position(AgentId(0)), Some(GridPos::new(5, 1)));
}

#[test]
fn stolen_seat_waits_under_wait_policy() {
    let mut world = stolen_seat_world();
    let mut rng = StdRng::seed_from_u64(11);
    for tick in 1..300 {
        step(&mut world, tick, &mut rng, SeatConflictPolicy::Wait);
        assert!(world.occupancy_mismatches().is_empty());
    }
    assert!(!world.is_seated(AgentId(0)));
    assert_eq!(world.target_seat(AgentId(0)), Some(GridPos::new(2, 1)));
    assert_eq!(world.open_chairs(), vec![GridPos::new(5, 1)]);
}
