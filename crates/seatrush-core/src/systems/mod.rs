//! Systems - logic that operates on the world each tick

mod movement;
mod seating;

pub use movement::*;
pub use seating::*;
