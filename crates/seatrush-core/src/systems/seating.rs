//! Seating - seat scores, contested seats and the reassignment policy.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::components::{AgentId, GridPos};
use crate::config::SeatConflictPolicy;
use crate::world::WorldState;

/// Score of a back-row seat
pub const MIN_SEAT_SCORE: u32 = 100;
/// Score of a seat at the podium edge
pub const MAX_SEAT_SCORE: u32 = 500;

/// Score for a chair in `chair_row` of a venue `total_rows` tall.
///
/// `MIN + (total_rows - chair_row) / total_rows * (MAX - MIN)`, rounded.
/// Rows nearer the podium (row 0) score higher; rows outside the grid are
/// clamped to its edges.
pub fn seat_score(chair_row: i32, total_rows: i32) -> u32 {
    if total_rows <= 0 {
        return MIN_SEAT_SCORE;
    }
    let row = chair_row.clamp(0, total_rows);
    let normalized = (total_rows - row) as f64 / total_rows as f64;
    let span = (MAX_SEAT_SCORE - MIN_SEAT_SCORE) as f64;
    (MIN_SEAT_SCORE as f64 + normalized * span).round() as u32
}

/// An NPC sent to a different chair because its own was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatReassignment {
    pub agent: AgentId,
    pub from: GridPos,
    pub to: GridPos,
}

/// Unseated NPCs whose target chair is now held by someone else.
pub fn contested_seats(world: &WorldState) -> Vec<(AgentId, GridPos)> {
    world
        .unseated_npcs()
        .into_iter()
        .filter_map(|id| {
            let target = world.target_seat(id)?;
            world
                .cell_at(target)
                .and_then(|c| c.occupant)
                .filter(|holder| *holder != id)
                .map(|_| (id, target))
        })
        .collect()
}

/// Nearest open chair to `from` by Manhattan distance, skipping `claimed`.
/// Ties go to the higher-scoring chair, then row-major order.
pub fn nearest_open_chair(world: &WorldState, from: GridPos, claimed: &HashSet<GridPos>) -> Option<GridPos> {
    world
        .open_chairs()
        .into_iter()
        .filter(|c| !claimed.contains(c))
        .min_by_key(|c| {
            let score = world.cell_at(*c).and_then(|cell| cell.score).unwrap_or(0);
            (from.manhattan(*c), Reverse(score), c.y, c.x)
        })
}

/// Apply the seat conflict policy to every NPC whose target chair is taken.
///
/// Under [`SeatConflictPolicy::Reassign`] each such NPC is pointed at the
/// nearest open chair no other unseated NPC is heading for, or failing that
/// the nearest open chair at all. Under [`SeatConflictPolicy::Wait`] nothing
/// changes and the NPC keeps waiting outside its old seat.
pub fn resolve_seat_conflicts(world: &mut WorldState, policy: SeatConflictPolicy) -> Vec<SeatReassignment> {
    if policy == SeatConflictPolicy::Wait {
        return Vec::new();
    }
    let contested = contested_seats(world);
    if contested.is_empty() {
        return Vec::new();
    }

    let mut claimed: HashSet<GridPos> = world
        .unseated_npcs()
        .into_iter()
        .filter_map(|id| world.target_seat(id))
        .collect();

    let mut reassigned = Vec::new();
    for (agent, old_seat) in contested {
        let Some(pos) = world.position(agent) else {
            continue;
        };
        let next = nearest_open_chair(world, pos, &claimed)
            .or_else(|| nearest_open_chair(world, pos, &HashSet::new()));
        if let Some(seat) = next {
            if world.set_target_seat(agent, seat) {
                claimed.insert(seat);
                reassigned.push(SeatReassignment {
                    agent,
                    from: old_seat,
                    to: seat,
                });
            }
        }
    }
    reassigned
}

/// 1-based rank of `score` among seated scores, highest first. Equal
/// scores share a rank.
pub fn rank_of(score: u32, seated_scores: &[u32]) -> usize {
    1 + seated_scores.iter().filter(|&&s| s > score).count()
}
