//! SeatRush Core - Crowd Seating Simulation Engine
//!
//! A grid-based simulation of a crowd filing into a venue. Every NPC walks
//! toward its assigned chair with a greedy local heuristic while one
//! user-controlled agent races them for any open seat. Seats nearer the
//! podium score higher.
//!
//! # Architecture
//!
//! Agents are entities in a `hecs` world:
//! - **Components**: Pure data attached to agents (GridPos, TargetSeat, Seated, etc.)
//! - **Systems**: Movement planning and seat bookkeeping over a read-only world
//! - **World**: The grid plus agents; the only place moves are applied
//!
//! Each tick all NPC moves are planned against one snapshot of the world,
//! then applied in order with re-validation so no two agents ever share a
//! cell.
//!
//! # Example
//!
//! ```rust,no_run
//! use seatrush_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::seeded(7)).unwrap();
//!
//! while engine.phase() != GamePhase::Ended {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! println!("{:?}", engine.outcome());
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod snapshot;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{SeatConflictPolicy, SimConfig};
    pub use crate::engine::{GameOutcome, GamePhase, SimEvent, SimulationEngine, UserMoveResult};
    pub use crate::error::ConfigError;
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::world::{MoveOutcome, PlannedMove, RejectReason, WorldState};
}
