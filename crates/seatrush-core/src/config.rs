//! Simulation configuration.
//!
//! Everything needed to build a game: venue shape, random seed, clock rate,
//! NPC pacing and the double-booked seat policy. Loadable from JSON; missing
//! fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::ConfigError;
use crate::generation::VenueConfig;

/// What an NPC does when it finds its assigned chair taken by someone else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatConflictPolicy {
    /// Pick the nearest open chair and head there instead
    #[default]
    Reassign,
    /// Keep waiting outside the taken chair for the rest of the game
    Wait,
}

/// Top-level simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub venue: VenueConfig,
    /// Fixed seed for reproducible games; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Real seconds per logical tick when driven through `update`
    pub tick_seconds: f32,
    /// Fastest NPC pace, in ticks between moves
    pub npc_min_interval: u32,
    /// Slowest NPC pace, in ticks between moves
    pub npc_max_interval: u32,
    pub seat_policy: SeatConflictPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            seed: None,
            tick_seconds: 0.25,
            npc_min_interval: 1,
            npc_max_interval: 3,
            seat_policy: SeatConflictPolicy::Reassign,
        }
    }
}

impl SimConfig {
    /// Default config with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.venue.validate()?;
        if self.npc_min_interval == 0 || self.npc_min_interval > self.npc_max_interval {
            return Err(ConfigError::IntervalRange {
                min: self.npc_min_interval,
                max: self.npc_max_interval,
            });
        }
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            return Err(ConfigError::TickSeconds(self.tick_seconds));
        }
        Ok(())
    }
}
