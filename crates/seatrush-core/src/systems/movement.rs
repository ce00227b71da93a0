//! Movement resolution - decides where agents try to step each tick.
//!
//! NPCs use a greedy local heuristic: step along one axis toward the target
//! seat, picking the axis order at random each move. When both greedy steps
//! are blocked they try the four cardinal directions in random order and take
//! the first legal one; if nothing is legal they wait for the crowd to clear.
//!
//! Planning only reads the world. All moves for a tick are planned against
//! the same state and then applied as one batch by
//! [`WorldState::apply_moves`].

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{AgentId, CellType, Direction, GridPos};
use crate::world::{PlannedMove, RejectReason, WorldState};

/// Target-cell legality for `agent` stepping onto `target`.
///
/// Out of bounds and walls are always illegal, as is a cell held by another
/// agent. Chairs are open to the user (any chair) and to an NPC only when the
/// chair is its own target seat. Every other cell is legal when free or
/// already held by the mover.
pub fn check_target(world: &WorldState, agent: AgentId, target: GridPos) -> Result<(), RejectReason> {
    let cell = world.cell_at(target).ok_or(RejectReason::OutOfBounds)?;
    if cell.cell_type == CellType::Wall {
        return Err(RejectReason::Wall);
    }
    if let Some(other) = cell.occupant {
        if other != agent {
            return Err(RejectReason::Occupied(other));
        }
    }
    if cell.cell_type.is_chair()
        && !world.is_user(agent)
        && world.target_seat(agent) != Some(target)
    {
        return Err(RejectReason::ChairNotAssigned);
    }
    Ok(())
}

pub fn is_valid_move(world: &WorldState, agent: AgentId, target: GridPos) -> bool {
    check_target(world, agent, target).is_ok()
}

/// What an NPC wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcDecision {
    /// Standing on its own seat: sit down without moving
    SitDown,
    Step(GridPos),
    /// Boxed in, already seated, or nowhere to go
    Wait,
}

/// Decide one NPC's move against the current world.
pub fn decide_npc_move<R: Rng + ?Sized>(world: &WorldState, agent: AgentId, rng: &mut R) -> NpcDecision {
    if world.is_seated(agent) {
        return NpcDecision::Wait;
    }
    let (Some(pos), Some(target)) = (world.position(agent), world.target_seat(agent)) else {
        return NpcDecision::Wait;
    };
    if pos == target {
        return NpcDecision::SitDown;
    }

    let dx = (target.x - pos.x).signum();
    let dy = (target.y - pos.y).signum();
    let horizontal = (dx != 0).then(|| GridPos::new(pos.x + dx, pos.y));
    let vertical = (dy != 0).then(|| GridPos::new(pos.x, pos.y + dy));

    let greedy = if rng.gen_bool(0.5) {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    };
    if let Some(step) = greedy
        .into_iter()
        .flatten()
        .find(|&cell| is_valid_move(world, agent, cell))
    {
        return NpcDecision::Step(step);
    }

    let mut directions = Direction::ALL;
    directions.shuffle(rng);
    directions
        .into_iter()
        .map(|d| pos.step(d))
        .find(|&cell| is_valid_move(world, agent, cell))
        .map_or(NpcDecision::Wait, NpcDecision::Step)
}

/// All NPC intentions for one tick.
#[derive(Debug, Clone, Default)]
pub struct NpcPlan {
    /// NPCs that were due to act this tick, ascending by id
    pub considered: Vec<AgentId>,
    pub moves: Vec<PlannedMove>,
    pub sit_downs: Vec<AgentId>,
    /// Due NPCs with no legal step
    pub waiting: Vec<AgentId>,
}

/// Plan moves for every unseated NPC due at `tick`. Decisions are made in
/// ascending id order against the same, unmodified world.
pub fn plan_npc_moves<R: Rng + ?Sized>(world: &WorldState, tick: u64, rng: &mut R) -> NpcPlan {
    let mut plan = NpcPlan {
        considered: world.due_npcs(tick),
        ..Default::default()
    };
    for &agent in &plan.considered {
        match decide_npc_move(world, agent, rng) {
            NpcDecision::Step(to) => plan.moves.push(PlannedMove { agent, to }),
            NpcDecision::SitDown => plan.sit_downs.push(agent),
            NpcDecision::Wait => plan.waiting.push(agent),
        }
    }
    plan
}

/// Validate one user step. Returns the move to apply.
pub fn plan_user_move(world: &WorldState, direction: Direction) -> Result<PlannedMove, RejectReason> {
    let agent = world.user().ok_or(RejectReason::UnknownAgent)?;
    if world.is_seated(agent) {
        return Err(RejectReason::AlreadySeated);
    }
    let pos = world.position(agent).ok_or(RejectReason::UnknownAgent)?;
    let to = pos.step(direction);
    check_target(world, agent, to)?;
    Ok(PlannedMove { agent, to })
}
