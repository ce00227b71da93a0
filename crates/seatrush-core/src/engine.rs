//! Simulation engine - main entry point for running a game

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::snapshot::WorldSnapshot;
use crate::systems::*;
use crate::world::{MoveOutcome, RejectReason, WorldState};

/// Game lifecycle. `Ended` is entered at most once per game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    NotStarted,
    Running,
    Ended,
}

/// Things that happened, queued for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    GameStarted,
    Seated {
        agent: AgentId,
        chair_id: u32,
        score: u32,
        is_user: bool,
        tick: u64,
    },
    SeatReassigned {
        agent: AgentId,
        from: GridPos,
        to: GridPos,
    },
    GameEnded {
        ticks: u64,
        user_score: Option<u32>,
    },
    GameRestarted,
}

/// Why a user move was not even attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    GameOver,
    AlreadySeated,
    NoUser,
}

/// Result of one user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserMoveResult {
    Moved(GridPos),
    Seated { chair_id: u32, score: u32 },
    Rejected(RejectReason),
    Ignored(IgnoreReason),
}

impl UserMoveResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, UserMoveResult::Moved(_) | UserMoveResult::Seated { .. })
    }
}

/// Per-tick batch statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// NPCs due to act this tick
    pub considered: usize,
    pub moved: usize,
    pub seated: usize,
    pub rejected: usize,
    pub waiting: usize,
    pub reassigned: usize,
    /// True on the one tick that ended the game
    pub ended: bool,
}

/// Final result of a game, available once it has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub ticks: u64,
    pub user_seat: Option<Seated>,
    /// 1-based rank of the user's score among everyone seated
    pub user_rank: Option<usize>,
    pub seated_count: usize,
    pub agent_count: usize,
}

/// Main simulation engine. Owns the world and the only RNG.
pub struct SimulationEngine {
    config: SimConfig,
    world: WorldState,
    rng: StdRng,
    phase: GamePhase,
    tick: u64,
    user_moves: u32,
    events: Vec<SimEvent>,
    /// Real seconds not yet spent on a tick
    accumulator: f32,
    outcome: Option<GameOutcome>,
}

impl SimulationEngine {
    /// Validate the config and build the first game.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let world = WorldState::generate(&config, &mut rng);
        info!(
            "Generated {}x{} venue: {} agents, {} chairs",
            config.venue.width,
            config.venue.height,
            world.agent_count(),
            world.grid().chairs().len()
        );
        Ok(Self {
            config,
            world,
            rng,
            phase: GamePhase::NotStarted,
            tick: 0,
            user_moves: 0,
            events: Vec::new(),
            accumulator: 0.0,
            outcome: None,
        })
    }

    /// Move from `NotStarted` to `Running`. No-op in any other phase.
    pub fn start(&mut self) {
        if self.phase != GamePhase::NotStarted {
            return;
        }
        self.phase = GamePhase::Running;
        self.events.push(SimEvent::GameStarted);
        info!("Game started with {} agents", self.world.agent_count());
    }

    /// Advance the logical clock by one tick.
    ///
    /// Order: resolve taken seats, plan every due NPC against the same world,
    /// seat NPCs already on their chair, apply the move batch, reschedule, and
    /// finally check for the end of the game.
    pub fn tick(&mut self) -> TickReport {
        if self.phase == GamePhase::Ended {
            return TickReport {
                tick: self.tick,
                ..Default::default()
            };
        }
        self.start();
        self.tick += 1;
        let tick = self.tick;

        let reassigned = resolve_seat_conflicts(&mut self.world, self.config.seat_policy);
        for r in &reassigned {
            debug!("{} lost {} and now heads for {}", r.agent, r.from, r.to);
            self.events.push(SimEvent::SeatReassigned {
                agent: r.agent,
                from: r.from,
                to: r.to,
            });
        }

        let plan = plan_npc_moves(&self.world, tick, &mut self.rng);
        let mut report = TickReport {
            tick,
            considered: plan.considered.len(),
            waiting: plan.waiting.len(),
            reassigned: reassigned.len(),
            ..Default::default()
        };

        for &agent in &plan.sit_downs {
            if let Some(seat) = self.world.seat_in_place(agent, tick) {
                self.record_seat(agent, seat);
                report.seated += 1;
            }
        }

        for outcome in self.world.apply_moves(&plan.moves, tick) {
            match outcome {
                MoveOutcome::Moved { .. } => report.moved += 1,
                MoveOutcome::Seated { agent, .. } => {
                    report.moved += 1;
                    report.seated += 1;
                    if let Some(seat) = self.world.seat_of(agent) {
                        self.record_seat(agent, seat);
                    }
                }
                MoveOutcome::Rejected { .. } => report.rejected += 1,
            }
        }

        for &agent in &plan.considered {
            self.world.reschedule(agent, tick);
        }

        trace!(
            "tick {}: {} due, {} moved, {} seated, {} rejected, {} waiting",
            tick,
            report.considered,
            report.moved,
            report.seated,
            report.rejected,
            report.waiting
        );

        report.ended = self.check_end();
        report
    }

    /// Feed real elapsed time. Fires as many whole ticks as have accumulated
    /// and returns how many ran.
    pub fn update(&mut self, delta_seconds: f32) -> u32 {
        if self.phase == GamePhase::Ended || !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return 0;
        }
        self.accumulator += delta_seconds;
        let step = self.config.tick_seconds;
        let mut fired = 0;
        while self.accumulator >= step && self.phase != GamePhase::Ended {
            self.accumulator -= step;
            self.tick();
            fired += 1;
        }
        if self.phase == GamePhase::Ended {
            self.accumulator = 0.0;
        }
        fired
    }

    /// Apply one user step immediately. Starts the game if it has not
    /// started yet.
    pub fn request_user_move(&mut self, direction: Direction) -> UserMoveResult {
        if self.phase == GamePhase::Ended {
            return UserMoveResult::Ignored(IgnoreReason::GameOver);
        }
        let Some(user) = self.world.user() else {
            return UserMoveResult::Ignored(IgnoreReason::NoUser);
        };
        if self.world.is_seated(user) {
            return UserMoveResult::Ignored(IgnoreReason::AlreadySeated);
        }
        self.start();

        let mv = match plan_user_move(&self.world, direction) {
            Ok(mv) => mv,
            Err(reason) => return UserMoveResult::Rejected(reason),
        };
        let outcomes = self.world.apply_moves(&[mv], self.tick);
        match outcomes.first().copied() {
            Some(MoveOutcome::Moved { to, .. }) => {
                self.user_moves += 1;
                UserMoveResult::Moved(to)
            }
            Some(MoveOutcome::Seated { chair_id, score, .. }) => {
                self.user_moves += 1;
                if let Some(seat) = self.world.seat_of(user) {
                    self.record_seat(user, seat);
                }
                UserMoveResult::Seated { chair_id, score }
            }
            Some(MoveOutcome::Rejected { reason, .. }) => UserMoveResult::Rejected(reason),
            None => UserMoveResult::Rejected(RejectReason::UnknownAgent),
        }
    }

    /// Throw the current game away and build a fresh one. The RNG stream
    /// carries on, so a seeded session stays reproducible across restarts.
    pub fn restart(&mut self) {
        self.world = WorldState::generate(&self.config, &mut self.rng);
        self.phase = GamePhase::NotStarted;
        self.tick = 0;
        self.user_moves = 0;
        self.accumulator = 0.0;
        self.outcome = None;
        self.events.push(SimEvent::GameRestarted);
        info!("Game restarted");
        self.start();
    }

    fn record_seat(&mut self, agent: AgentId, seat: Seated) {
        let is_user = self.world.is_user(agent);
        if is_user {
            info!("User {} sat in chair {} for {} points", agent, seat.chair_id, seat.score);
        } else {
            debug!("{} sat in chair {} ({} points)", agent, seat.chair_id, seat.score);
        }
        self.events.push(SimEvent::Seated {
            agent,
            chair_id: seat.chair_id,
            score: seat.score,
            is_user,
            tick: seat.tick,
        });
    }

    /// The game is over once the NPC clock can seat nobody else: every NPC
    /// is seated or every chair is taken.
    fn check_end(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        if !(self.world.all_npcs_seated() || self.world.open_chairs().is_empty()) {
            return false;
        }
        self.phase = GamePhase::Ended;
        let outcome = self.compute_outcome();
        self.events.push(SimEvent::GameEnded {
            ticks: outcome.ticks,
            user_score: outcome.user_seat.map(|s| s.score),
        });
        info!(
            "Game ended after {} ticks: {}/{} seated, user score {:?}, rank {:?}",
            outcome.ticks,
            outcome.seated_count,
            outcome.agent_count,
            outcome.user_seat.map(|s| s.score),
            outcome.user_rank
        );
        self.outcome = Some(outcome);
        true
    }

    fn compute_outcome(&self) -> GameOutcome {
        let user_seat = self.world.user().and_then(|u| self.world.seat_of(u));
        let scores: Vec<u32> = self
            .world
            .agents()
            .iter()
            .filter_map(|a| a.seated.map(|s| s.score))
            .collect();
        GameOutcome {
            ticks: self.tick,
            user_seat,
            user_rank: user_seat.map(|s| rank_of(s.score, &scores)),
            seated_count: scores.len(),
            agent_count: self.world.agent_count(),
        }
    }

    /// Immutable copy of everything a viewer needs.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world, self.phase, self.tick, self.user_moves)
    }

    /// Take all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.tick
    }

    pub fn user_moves(&self) -> u32 {
        self.user_moves
    }

    pub fn seated_count(&self) -> usize {
        self.world.seated_count()
    }

    /// The user's score if seated
    pub fn user_score(&self) -> Option<u32> {
        self.world
            .user()
            .and_then(|u| self.world.seat_of(u))
            .map(|s| s.score)
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
