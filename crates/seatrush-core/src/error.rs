//! Construction-time errors.
//!
//! The running simulation has no error path: illegal moves are reported as
//! rejections, not errors. Only building a game from bad parameters can fail.

/// Errors raised while reading or validating a simulation config
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    GridTooSmall { width: i32, height: i32, min_width: i32, min_height: i32 },
    GridTooLarge { width: i32, height: i32, max_width: i32, max_height: i32 },
    NoAgents,
    UserIndexOutOfRange { user_index: u32, agent_count: u32 },
    NotEnoughSpawnCells { agents: u32, cells: usize },
    IntervalRange { min: u32, max: u32 },
    TickSeconds(f32),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
            ConfigError::GridTooSmall {
                width,
                height,
                min_width,
                min_height,
            } => write!(
                f,
                "Grid {}x{} is too small: need at least {}x{}",
                width, height, min_width, min_height
            ),
            ConfigError::GridTooLarge {
                width,
                height,
                max_width,
                max_height,
            } => write!(
                f,
                "Grid {}x{} is too large: at most {}x{} is supported",
                width, height, max_width, max_height
            ),
            ConfigError::NoAgents => write!(f, "Agent count must be at least 1"),
            ConfigError::UserIndexOutOfRange {
                user_index,
                agent_count,
            } => write!(
                f,
                "User index {} is out of range for {} agents",
                user_index, agent_count
            ),
            ConfigError::NotEnoughSpawnCells { agents, cells } => write!(
                f,
                "Cannot place {} agents: only {} hallway cells",
                agents, cells
            ),
            ConfigError::IntervalRange { min, max } => write!(
                f,
                "NPC move interval range is invalid: min {} max {}",
                min, max
            ),
            ConfigError::TickSeconds(s) => {
                write!(f, "Tick length must be positive and finite, got {}", s)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_names_the_problem() {
        let err = ConfigError::UserIndexOutOfRange {
            user_index: 9,
            agent_count: 4,
        };
        assert_eq!(err.to_string(), "User index 9 is out of range for 4 agents");
        assert!(err.source().is_none());

        let err = ConfigError::GridTooLarge {
            width: 50_000,
            height: 50_000,
            max_width: 1024,
            max_height: 1024,
        };
        assert_eq!(err.to_string(), "Grid 50000x50000 is too large: at most 1024x1024 is supported");
    }

    #[test]
    fn test_json_error_keeps_source() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("Config parse error"));
        assert!(err.source().is_some());
    }
}
