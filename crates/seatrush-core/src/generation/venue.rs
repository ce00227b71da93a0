//! Venue generation - lays out walls, podium, chair rows and hallway

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::components::{CellType, Grid, GridPos};
use crate::error::ConfigError;
use crate::systems::seat_score;

/// Smallest grid that still fits wall, podium, one chair row and a hallway.
pub const MIN_WIDTH: i32 = 5;
pub const MIN_HEIGHT: i32 = 8;
/// Largest grid accepted by `VenueConfig::validate`.
pub const MAX_WIDTH: i32 = 1024;
pub const MAX_HEIGHT: i32 = 1024;

const FIRST_CHAIR_ROW: i32 = 4;
/// Hallway rows kept free below the last row-aisle for spawning
const MIN_HALLWAY_ROWS: i32 = 2;

/// Configuration for venue generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    /// Columns
    pub width: i32,
    /// Rows; row 0 is the podium end
    pub height: i32,
    /// Total agents including the user
    pub agent_count: u32,
    /// Which spawn index is the user-controlled agent
    pub user_index: u32,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 15,
            agent_count: 48,
            user_index: 24,
        }
    }
}

impl VenueConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
                min_width: MIN_WIDTH,
                min_height: MIN_HEIGHT,
            });
        }
        if self.width > MAX_WIDTH || self.height > MAX_HEIGHT {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
                max_width: MAX_WIDTH,
                max_height: MAX_HEIGHT,
            });
        }
        if self.agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.user_index >= self.agent_count {
            return Err(ConfigError::UserIndexOutOfRange {
                user_index: self.user_index,
                agent_count: self.agent_count,
            });
        }
        let cells = self.hallway_cells();
        if self.agent_count as usize > cells {
            return Err(ConfigError::NotEnoughSpawnCells {
                agents: self.agent_count,
                cells,
            });
        }
        Ok(())
    }

    /// Rows holding chairs. Each is followed by a row-aisle.
    pub fn chair_rows(&self) -> Vec<i32> {
        let last = self.height - MIN_HALLWAY_ROWS - 2;
        (FIRST_CHAIR_ROW..=last).step_by(2).collect()
    }

    /// First hallway row; everything from here to the bottom edge is hallway.
    pub fn hallway_start(&self) -> i32 {
        self.chair_rows()
            .last()
            .map(|row| row + 2)
            .unwrap_or(FIRST_CHAIR_ROW)
    }

    pub fn hallway_cells(&self) -> usize {
        let rows = (self.height - self.hallway_start()).max(0) as usize;
        let cols = (self.width - 2).max(0) as usize;
        rows.saturating_mul(cols)
    }

    /// Odd columns are aisles, so each chair sits alone between two aisle
    /// columns and can be reached from the row-aisle below it without
    /// crossing another chair in its own row.
    fn is_aisle_column(&self, x: i32) -> bool {
        x == 1 || x == self.width - 2 || (x - 1) % 2 == 0
    }

    fn podium_span(&self) -> std::ops::Range<i32> {
        let third = self.width / 3;
        third..self.width - third
    }
}

/// Build the venue grid. Chairs carry sequential ids (row-major) and a seat score.
///
/// The config is expected to be validated; undersized grids still produce a
/// grid, just not a playable one.
pub fn generate_venue(config: &VenueConfig) -> Grid {
    let (width, height) = (config.width, config.height);
    let mut grid = Grid::new(width, height);
    let chair_rows = config.chair_rows();
    let hallway_start = config.hallway_start();
    let podium = config.podium_span();

    for y in 0..height {
        for x in 0..width {
            let pos = GridPos::new(x, y);
            let cell_type = if y == 0 || x == 0 || x == width - 1 {
                CellType::Wall
            } else if y <= 2 {
                if podium.contains(&x) {
                    CellType::Podium
                } else {
                    CellType::Carpet
                }
            } else if y == 3 {
                CellType::Carpet
            } else if y >= hallway_start {
                CellType::Hallway
            } else if chair_rows.contains(&y) {
                if config.is_aisle_column(x) {
                    CellType::Aisle
                } else {
                    CellType::Chair
                }
            } else {
                CellType::RowAisle
            };
            grid.set_type(pos, cell_type);
        }
    }

    // Signs flank the podium at the front corners
    if height > 1 && width > 2 {
        grid.set_type(GridPos::new(1, 1), CellType::Sign);
        grid.set_type(GridPos::new(width - 2, 1), CellType::Sign);
    }

    let mut next_chair_id = 0u32;
    for pos in grid.chairs() {
        if let Some(cell) = grid.get_mut(pos) {
            cell.chair_id = Some(next_chair_id);
            cell.score = Some(seat_score(pos.y, height));
        }
        next_chair_id += 1;
    }

    grid
}

/// A layout validation finding.
#[derive(Debug, Clone)]
pub struct LayoutIssue {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Check the generation-time invariants: one connected podium region, a
/// hallway to enter from, and every chair reachable and next to a walkway.
pub fn check_layout(grid: &Grid) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();

    let podium_regions = count_regions(grid, CellType::Podium);
    if podium_regions != 1 {
        issues.push(LayoutIssue {
            category: "podium",
            severity: Severity::Error,
            message: format!("Expected one podium region, found {}", podium_regions),
        });
    }

    let hallway = grid.positions_of(CellType::Hallway);
    if hallway.is_empty() {
        issues.push(LayoutIssue {
            category: "hallway",
            severity: Severity::Error,
            message: "Venue has no hallway to spawn in".into(),
        });
        return issues;
    }

    let reachable = flood(grid, hallway[0], |t| t != CellType::Wall);
    for chair in grid.chairs() {
        if !reachable.contains(&chair) {
            issues.push(LayoutIssue {
                category: "reachability",
                severity: Severity::Error,
                message: format!("Chair at {} is walled off from the hallway", chair),
            });
        }
        let touches_walkway = grid
            .neighbors(chair)
            .any(|n| grid.cell_type(n).is_some_and(|t| t.is_walkway()));
        if !touches_walkway {
            issues.push(LayoutIssue {
                category: "access",
                severity: Severity::Error,
                message: format!("Chair at {} has no adjacent walkway", chair),
            });
        }
    }

    if grid.chairs().is_empty() {
        issues.push(LayoutIssue {
            category: "seating",
            severity: Severity::Warning,
            message: "Venue has no chairs".into(),
        });
    }

    issues
}

fn count_regions(grid: &Grid, cell_type: CellType) -> usize {
    let mut seen: HashSet<GridPos> = HashSet::new();
    let mut regions = 0;
    for pos in grid.positions_of(cell_type) {
        if seen.contains(&pos) {
            continue;
        }
        regions += 1;
        seen.extend(flood(grid, pos, |t| t == cell_type));
    }
    regions
}

fn flood(grid: &Grid, start: GridPos, passable: impl Fn(CellType) -> bool) -> HashSet<GridPos> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(pos) = queue.pop_front() {
        for next in grid.neighbors(pos) {
            if visited.contains(&next) {
                continue;
            }
            if grid.cell_type(next).is_some_and(&passable) {
                visited.insert(next);
                queue.push_back(next);
            }
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Direction;

    #[test]
    fn test_default_layout_rows() {
        let config = VenueConfig::default();
        assert_eq!(config.chair_rows(), vec![4, 6, 8, 10]);
        assert_eq!(config.hallway_start(), 12);
        assert_eq!(config.hallway_cells(), 3 * 28);
    }

    #[test]
    fn test_default_venue_is_valid() {
        let grid = generate_venue(&VenueConfig::default());
        let issues = check_layout(&grid);
        assert!(issues.is_empty(), "{:?}", issues);
        assert_eq!(grid.width(), 30);
        assert_eq!(grid.height(), 15);
    }

    #[test]
    fn test_enough_chairs_for_default_crowd() {
        let config = VenueConfig::default();
        let grid = generate_venue(&config);
        // 13 chairs per row across 4 rows
        assert_eq!(grid.chairs().len(), 52);
        assert!(grid.chairs().len() >= (config.agent_count - 1) as usize);
    }

    #[test]
    fn test_chairs_numbered_and_scored() {
        let grid = generate_venue(&VenueConfig::default());
        let chairs = grid.chairs();
        for (i, pos) in chairs.iter().enumerate() {
            let cell = grid.get(*pos).unwrap();
            assert_eq!(cell.chair_id, Some(i as u32));
            assert_eq!(cell.score, Some(seat_score(pos.y, 15)));
        }
        let front = grid.get(chairs[0]).unwrap().score.unwrap();
        let back = grid.get(*chairs.last().unwrap()).unwrap().score.unwrap();
        assert!(front > back);
    }

    #[test]
    fn test_every_chair_touches_an_aisle_column() {
        let grid = generate_venue(&VenueConfig::default());
        for chair in grid.chairs() {
            let beside_aisle = [chair.x - 1, chair.x + 1]
                .iter()
                .any(|&x| grid.cell_type(GridPos::new(x, chair.y)) == Some(CellType::Aisle));
            assert!(beside_aisle, "chair {} not beside an aisle", chair);
        }
    }

    #[test]
    fn test_minimum_venue() {
        let config = VenueConfig {
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
            agent_count: 2,
            user_index: 0,
        };
        assert!(config.validate().is_ok());
        let grid = generate_venue(&config);
        assert!(check_layout(&grid).is_empty());
        assert_eq!(grid.chairs(), vec![GridPos::new(2, 4)]);
    }

    #[test]
    fn test_chairs_stand_alone_in_their_row() {
        let grid = generate_venue(&VenueConfig::default());
        for chair in grid.chairs() {
            for dir in [Direction::Left, Direction::Right] {
                assert_eq!(grid.cell_type(chair.step(dir)), Some(CellType::Aisle), "chair {}", chair);
            }
            assert_eq!(grid.cell_type(chair.step(Direction::Down)), Some(CellType::RowAisle));
        }
    }

    #[test]
    fn test_validation_errors() {
        let small = VenueConfig {
            width: 4,
            ..Default::default()
        };
        assert!(matches!(small.validate(), Err(ConfigError::GridTooSmall { .. })));

        let crowded = VenueConfig {
            agent_count: 500,
            ..Default::default()
        };
        assert!(matches!(
            crowded.validate(),
            Err(ConfigError::NotEnoughSpawnCells { agents: 500, .. })
        ));

        let bad_user = VenueConfig {
            user_index: 48,
            ..Default::default()
        };
        assert!(matches!(
            bad_user.validate(),
            Err(ConfigError::UserIndexOutOfRange { .. })
        ));

    }

    #[test]
    fn test_oversized_grid_rejected() {
        let huge = VenueConfig {
            width: 50_000,
            height: 50_000,
            agent_count: 2,
            user_index: 0,
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::GridTooLarge { width: 50_000, height: 50_000, .. })
        ));

        let tall = VenueConfig {
            height: MAX_HEIGHT + 1,
            ..Default::default()
        };
        assert!(matches!(tall.validate(), Err(ConfigError::GridTooLarge { .. })));

        let largest = VenueConfig {
            width: MAX_WIDTH,
            height: MAX_HEIGHT,
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_walled_chair_detected() {
        let mut grid = generate_venue(&VenueConfig::default());
        let chair = grid.chairs()[0];
        for n in grid.neighbors(chair).collect::<Vec<_>>() {
            grid.set_type(n, CellType::Wall);
        }
        let issues = check_layout(&grid);
        assert!(issues.iter().any(|i| i.category == "reachability"));
        assert!(issues.iter().any(|i| i.category == "access"));
    }

    #[test]
    fn test_split_podium_detected() {
        let mut grid = generate_venue(&VenueConfig::default());
        // Cut the podium in two with a carpet column
        grid.set_type(GridPos::new(15, 1), CellType::Carpet);
        grid.set_type(GridPos::new(15, 2), CellType::Carpet);
        let issues = check_layout(&grid);
        assert!(issues.iter().any(|i| i.category == "podium"));
    }
}
