//! Crowd generation - spawns the user and NPCs and hands out seats

use hecs::{Entity, EntityBuilder, World};
use rand::seq::SliceRandom;
use rand::Rng;

use super::VenueConfig;
use crate::components::*;

/// Spawn `config.agent_count` agents on shuffled hallway cells.
///
/// The agent at `config.user_index` is user-controlled. Every other agent is
/// an NPC with a target seat taken from a shuffled chair list; when there are
/// more NPCs than chairs the list wraps, so several NPCs can share a seat.
/// Each NPC gets a move interval drawn from `interval_range` (inclusive) and a
/// staggered first move tick.
///
/// Returns the roster in id order. Agents beyond the number of hallway cells
/// are not spawned; validated configs never hit that case.
pub fn spawn_agents(
    world: &mut World,
    grid: &Grid,
    config: &VenueConfig,
    interval_range: (u32, u32),
    rng: &mut impl Rng,
) -> Vec<(AgentId, Entity)> {
    let mut spawn_cells = grid.positions_of(CellType::Hallway);
    spawn_cells.shuffle(rng);

    let mut chairs = grid.chairs();
    chairs.shuffle(rng);

    let (min_interval, max_interval) = interval_range;
    let min_interval = min_interval.max(1);
    let max_interval = max_interval.max(min_interval);

    let mut roster = Vec::with_capacity(config.agent_count as usize);
    let mut npc_index = 0usize;

    for (i, &pos) in spawn_cells
        .iter()
        .take(config.agent_count as usize)
        .enumerate()
    {
        let id = AgentId(i as u32);
        let agent = Agent { id };

        let entity = if i as u32 == config.user_index {
            world.spawn((agent, pos, UserControlled))
        } else {
            let interval = rng.gen_range(min_interval..=max_interval);
            let first_tick = 1 + rng.gen_range(0..interval) as u64;
            let cadence = MoveCadence::new(interval, first_tick);

            let mut builder = EntityBuilder::new();
            builder.add(agent).add(pos).add(Npc).add(cadence);
            if !chairs.is_empty() {
                builder.add(TargetSeat(chairs[npc_index % chairs.len()]));
            }
            npc_index += 1;
            world.spawn(builder.build())
        };

        roster.push((id, entity));
    }

    roster
}
