//! Agent components: identity, role markers, seat assignment and move cadence.

use serde::{Deserialize, Serialize};

use super::GridPos;

/// Stable agent identifier, unique within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity component attached to every agent entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
}

/// Marker for the user-controlled agent
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserControlled;

/// Marker for simulated agents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Npc;

/// The chair an NPC is heading for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSeat(pub GridPos);

/// Present only once an agent has sat down. Seated agents never move again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seated {
    pub chair_id: u32,
    pub score: u32,
    /// Tick at which the agent sat down
    pub tick: u64,
}

/// Per-NPC move cadence on the logical clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCadence {
    /// Ticks between move opportunities (at least 1)
    pub interval: u32,
    /// First tick at which the NPC may move again
    pub next_move_tick: u64,
}

impl MoveCadence {
    pub fn new(interval: u32, first_tick: u64) -> Self {
        Self {
            interval: interval.max(1),
            next_move_tick: first_tick,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        tick >= self.next_move_tick
    }

    /// Push the next opportunity one interval past `tick`.
    pub fn reschedule(&mut self, tick: u64) {
        self.next_move_tick = tick + self.interval as u64;
    }
}
