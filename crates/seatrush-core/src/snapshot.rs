//! Read-only snapshots of a game for viewers and tooling.

use serde::{Deserialize, Serialize};

use crate::components::Grid;
use crate::engine::GamePhase;
use crate::world::{AgentView, WorldState};

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub phase: GamePhase,
    pub tick: u64,
    pub user_moves: u32,
    pub seated_count: usize,
    pub agent_count: usize,
    pub grid: Grid,
    /// Ascending by agent id
    pub agents: Vec<AgentView>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState, phase: GamePhase, tick: u64, user_moves: u32) -> Self {
        Self {
            phase,
            tick,
            user_moves,
            seated_count: world.seated_count(),
            agent_count: world.agent_count(),
            grid: world.grid().clone(),
            agents: world.agents(),
        }
    }

    pub fn user(&self) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.is_user)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// ASCII frame with a one-line status header.
    pub fn render_ascii(&self) -> String {
        let seated: Vec<_> = self
            .agents
            .iter()
            .filter(|a| a.is_seated())
            .map(|a| a.id)
            .collect();
        let user = self.user().map(|a| a.id);
        format!(
            "{:?} tick {} | seated {}/{} | user moves {}\n{}",
            self.phase,
            self.tick,
            self.seated_count,
            self.agent_count,
            self.user_moves,
            self.grid.render_ascii(user, &|id| seated.contains(&id))
        )
    }
}
