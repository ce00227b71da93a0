//! Generation - procedural creation of the venue and the crowd.

mod roster;
mod venue;

pub use roster::*;
pub use venue::*;
