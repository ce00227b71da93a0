//! World state - the authoritative grid plus the agent roster.
//!
//! Agents live in a `hecs::World`; the grid's `occupant` fields are a derived
//! index over agent positions. The only mutator that moves agents is
//! [`WorldState::apply_moves`], which re-validates every move against the
//! grid as it is being updated and resynchronizes the index afterwards.

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::SimConfig;
use crate::generation::{generate_venue, spawn_agents};
use crate::systems::check_target;

/// One intended single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub agent: AgentId,
    pub to: GridPos,
}

/// Why a move was not applied. Rejections are normal, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    UnknownAgent,
    AlreadySeated,
    NotAdjacent,
    OutOfBounds,
    Wall,
    Occupied(AgentId),
    /// Chair belongs to someone else's assignment
    ChairNotAssigned,
}

/// Result of applying one planned move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Moved {
        agent: AgentId,
        from: GridPos,
        to: GridPos,
    },
    Seated {
        agent: AgentId,
        from: GridPos,
        to: GridPos,
        chair_id: u32,
        score: u32,
    },
    Rejected {
        agent: AgentId,
        to: GridPos,
        reason: RejectReason,
    },
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MoveOutcome::Rejected { .. })
    }
}

/// Read-only view of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub pos: GridPos,
    pub is_user: bool,
    pub seated: Option<Seated>,
    pub target_seat: Option<GridPos>,
    pub next_move_tick: Option<u64>,
}

impl AgentView {
    pub fn is_seated(&self) -> bool {
        self.seated.is_some()
    }
}

/// Grid plus agents
pub struct WorldState {
    grid: Grid,
    agents: World,
    /// Agent id → entity, sorted by id
    roster: Vec<(AgentId, Entity)>,
    user: Option<AgentId>,
}

impl WorldState {
    /// Generate a fresh venue and crowd from config.
    pub fn generate(config: &SimConfig, rng: &mut impl Rng) -> Self {
        let grid = generate_venue(&config.venue);
        let mut agents = World::new();
        let roster = spawn_agents(
            &mut agents,
            &grid,
            &config.venue,
            (config.npc_min_interval, config.npc_max_interval),
            rng,
        );
        Self::from_parts(grid, agents, roster)
    }

    /// Assemble a world from an already-populated agent world and rebuild occupancy.
    pub fn from_parts(grid: Grid, agents: World, mut roster: Vec<(AgentId, Entity)>) -> Self {
        roster.sort_by_key(|(id, _)| *id);
        let user = roster
            .iter()
            .find(|(_, e)| agents.get::<&UserControlled>(*e).is_ok())
            .map(|(id, _)| *id);
        let mut world = Self {
            grid,
            agents,
            roster,
            user,
        };
        world.resync_occupancy();
        world
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell_at(&self, pos: GridPos) -> Option<&Cell> {
        self.grid.get(pos)
    }

    pub fn agent_at(&self, pos: GridPos) -> Option<AgentId> {
        self.grid.occupant(pos)
    }

    pub fn user(&self) -> Option<AgentId> {
        self.user
    }

    pub fn is_user(&self, id: AgentId) -> bool {
        self.user == Some(id)
    }

    pub fn agent_count(&self) -> usize {
        self.roster.len()
    }

    /// All agent ids in ascending order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.roster.iter().map(|(id, _)| *id)
    }

    fn entity(&self, id: AgentId) -> Option<Entity> {
        self.roster
            .binary_search_by_key(&id, |(agent, _)| *agent)
            .ok()
            .map(|i| self.roster[i].1)
    }

    pub fn position(&self, id: AgentId) -> Option<GridPos> {
        let entity = self.entity(id)?;
        self.agents.get::<&GridPos>(entity).ok().map(|p| *p)
    }

    pub fn is_seated(&self, id: AgentId) -> bool {
        self.entity(id)
            .is_some_and(|e| self.agents.get::<&Seated>(e).is_ok())
    }

    pub fn seat_of(&self, id: AgentId) -> Option<Seated> {
        let entity = self.entity(id)?;
        self.agents.get::<&Seated>(entity).ok().map(|s| *s)
    }

    pub fn target_seat(&self, id: AgentId) -> Option<GridPos> {
        let entity = self.entity(id)?;
        self.agents.get::<&TargetSeat>(entity).ok().map(|t| t.0)
    }

    pub fn cadence(&self, id: AgentId) -> Option<MoveCadence> {
        let entity = self.entity(id)?;
        self.agents.get::<&MoveCadence>(entity).ok().map(|c| *c)
    }

    pub fn agent(&self, id: AgentId) -> Option<AgentView> {
        Some(AgentView {
            id,
            pos: self.position(id)?,
            is_user: self.is_user(id),
            seated: self.seat_of(id),
            target_seat: self.target_seat(id),
            next_move_tick: self.cadence(id).map(|c| c.next_move_tick),
        })
    }

    /// Every agent, ascending by id.
    pub fn agents(&self) -> Vec<AgentView> {
        self.agent_ids().filter_map(|id| self.agent(id)).collect()
    }

    /// Unseated NPCs whose cadence allows a move at `tick`, ascending by id.
    pub fn due_npcs(&self, tick: u64) -> Vec<AgentId> {
        let mut due: Vec<AgentId> = self
            .agents
            .query::<(&Agent, &MoveCadence)>()
            .with::<&Npc>()
            .without::<&Seated>()
            .iter()
            .filter(|(_, (_, cadence))| cadence.is_due(tick))
            .map(|(_, (agent, _))| agent.id)
            .collect();
        due.sort();
        due
    }

    /// Unseated NPCs, ascending by id.
    pub fn unseated_npcs(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self
            .agents
            .query::<&Agent>()
            .with::<&Npc>()
            .without::<&Seated>()
            .iter()
            .map(|(_, agent)| agent.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn npc_count(&self) -> usize {
        self.agents.query::<&Npc>().iter().count()
    }

    pub fn seated_count(&self) -> usize {
        self.agents.query::<&Seated>().iter().count()
    }

    pub fn all_npcs_seated(&self) -> bool {
        self.unseated_npcs().is_empty()
    }

    /// Chairs nobody is sitting in, row-major.
    pub fn open_chairs(&self) -> Vec<GridPos> {
        self.grid
            .iter()
            .filter(|(_, c)| c.cell_type.is_chair() && c.occupant.is_none())
            .map(|(p, _)| p)
            .collect()
    }

    /// Full legality check for a single step: the mover must exist, be
    /// standing, move exactly one cell, and the target must pass
    /// [`check_target`]. Returns the mover's current position.
    pub fn check_move(&self, id: AgentId, to: GridPos) -> Result<GridPos, RejectReason> {
        let from = self.position(id).ok_or(RejectReason::UnknownAgent)?;
        if self.is_seated(id) {
            return Err(RejectReason::AlreadySeated);
        }
        if !from.is_adjacent(to) {
            return Err(RejectReason::NotAdjacent);
        }
        check_target(self, id, to)?;
        Ok(from)
    }

    /// Apply a batch of moves in order. Each move is re-validated against the
    /// grid as updated by the moves before it, so two movers aiming at the
    /// same cell cannot both land. Occupancy is fully rebuilt at the end.
    pub fn apply_moves(&mut self, moves: &[PlannedMove], tick: u64) -> Vec<MoveOutcome> {
        let mut outcomes = Vec::with_capacity(moves.len());
        for mv in moves {
            let outcome = match self.check_move(mv.agent, mv.to) {
                Ok(from) => self.commit_move(mv.agent, from, mv.to, tick),
                Err(reason) => MoveOutcome::Rejected {
                    agent: mv.agent,
                    to: mv.to,
                    reason,
                },
            };
            outcomes.push(outcome);
        }
        self.resync_occupancy();
        outcomes
    }

    fn commit_move(&mut self, id: AgentId, from: GridPos, to: GridPos, tick: u64) -> MoveOutcome {
        let Some(entity) = self.entity(id) else {
            return MoveOutcome::Rejected {
                agent: id,
                to,
                reason: RejectReason::UnknownAgent,
            };
        };
        if let Ok(mut pos) = self.agents.get::<&mut GridPos>(entity) {
            *pos = to;
        }
        if let Some(cell) = self.grid.get_mut(from) {
            if cell.occupant == Some(id) {
                cell.occupant = None;
            }
        }
        if let Some(cell) = self.grid.get_mut(to) {
            cell.occupant = Some(id);
        }

        match self.sit_if_on_chair(entity, to, tick) {
            Some(seat) => MoveOutcome::Seated {
                agent: id,
                from,
                to,
                chair_id: seat.chair_id,
                score: seat.score,
            },
            None => MoveOutcome::Moved { agent: id, from, to },
        }
    }

    fn sit_if_on_chair(&mut self, entity: Entity, pos: GridPos, tick: u64) -> Option<Seated> {
        let cell = self.grid.get(pos)?;
        if !cell.cell_type.is_chair() {
            return None;
        }
        let seat = Seated {
            chair_id: cell.chair_id.unwrap_or_default(),
            score: cell.score.unwrap_or_default(),
            tick,
        };
        self.agents.insert_one(entity, seat).ok()?;
        Some(seat)
    }

    /// Seat an agent that is already standing on a chair without moving it.
    pub fn seat_in_place(&mut self, id: AgentId, tick: u64) -> Option<Seated> {
        if self.is_seated(id) {
            return None;
        }
        let entity = self.entity(id)?;
        let pos = self.position(id)?;
        self.sit_if_on_chair(entity, pos, tick)
    }

    /// Point an NPC at a different chair.
    pub fn set_target_seat(&mut self, id: AgentId, seat: GridPos) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        self.agents.insert_one(entity, TargetSeat(seat)).is_ok()
    }

    /// Push an NPC's next move opportunity one interval past `tick`.
    pub fn reschedule(&mut self, id: AgentId, tick: u64) {
        if let Some(entity) = self.entity(id) {
            if let Ok(mut cadence) = self.agents.get::<&mut MoveCadence>(entity) {
                cadence.reschedule(tick);
            }
        }
    }

    /// Rebuild the occupancy index from agent positions.
    pub fn resync_occupancy(&mut self) {
        self.grid.clear_occupancy();
        for (_, (agent, pos)) in self.agents.query::<(&Agent, &GridPos)>().iter() {
            if let Some(cell) = self.grid.get_mut(*pos) {
                cell.occupant = Some(agent.id);
            }
        }
    }

    /// Describe every disagreement between the occupancy index and agent
    /// positions. Empty when the world is consistent.
    pub fn occupancy_mismatches(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = std::collections::HashMap::new();
        for view in self.agents() {
            if let Some(other) = seen.insert(view.pos, view.id) {
                problems.push(format!(
                    "{} and {} share cell {}",
                    other, view.id, view.pos
                ));
            }
            if self.grid.occupant(view.pos) != Some(view.id) {
                problems.push(format!(
                    "{} stands at {} but the cell lists {:?}",
                    view.id,
                    view.pos,
                    self.grid.occupant(view.pos)
                ));
            }
        }
        for (pos, cell) in self.grid.iter() {
            if let Some(id) = cell.occupant {
                if self.position(id) != Some(pos) {
                    problems.push(format!("cell {} lists stale occupant {}", pos, id));
                }
            }
        }
        problems
    }

    /// ASCII dump of the venue with agents drawn in.
    pub fn render_ascii(&self) -> String {
        self.grid
            .render_ascii(self.user, &|id| self.is_seated(id))
    }
}
