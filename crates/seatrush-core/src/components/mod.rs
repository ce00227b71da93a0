//! Component definitions.
//!
//! Components are pure data. Agents are `hecs` entities carrying these
//! components; the grid is a plain value owned by the world state.

mod agents;
mod grid;

pub use agents::*;
pub use grid::*;
