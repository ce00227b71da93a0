//! Grid components: cell types, coordinates, and the venue grid itself.

use serde::{Deserialize, Serialize};

use super::AgentId;

/// Integer cell coordinate. `x` is the column, `y` the row (row 0 is the podium end).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring coordinate one step in `dir`. May be out of bounds.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True if `other` is exactly one cardinal step away.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// (dx, dy) offset. Up decreases the row index.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// What a grid cell is made of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Empty,
    Chair,
    Wall,
    Hallway,
    Aisle,
    Carpet,
    Podium,
    RowAisle,
    Sign,
}

impl CellType {
    pub fn is_chair(self) -> bool {
        self == CellType::Chair
    }

    /// Cells anyone may stand on without a seat assignment.
    pub fn is_walkway(self) -> bool {
        !matches!(self, CellType::Wall | CellType::Chair)
    }

    /// Single-character glyph used by text dumps.
    pub fn glyph(self) -> char {
        match self {
            CellType::Empty => ' ',
            CellType::Chair => 'h',
            CellType::Wall => '#',
            CellType::Hallway => '.',
            CellType::Aisle => '|',
            CellType::Carpet => ',',
            CellType::Podium => 'P',
            CellType::RowAisle => '-',
            CellType::Sign => 'S',
        }
    }
}

/// A single grid cell. `occupant` is a derived index rebuilt from agent positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    pub occupant: Option<AgentId>,
    pub chair_id: Option<u32>,
    pub score: Option<u32>,
}

/// Fixed-size venue grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid of `width × height` empty cells. Callers bound the size;
    /// `VenueConfig::validate` caps venues at `MAX_WIDTH × MAX_HEIGHT`.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let len = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); len],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn get(&self, pos: GridPos) -> Option<&Cell> {
        let i = self.index(pos)?;
        self.cells.get(i)
    }

    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        let i = self.index(pos)?;
        self.cells.get_mut(i)
    }

    pub fn cell_type(&self, pos: GridPos) -> Option<CellType> {
        self.get(pos).map(|c| c.cell_type)
    }

    /// Set the type of a cell, ignoring out-of-bounds coordinates.
    pub fn set_type(&mut self, pos: GridPos, cell_type: CellType) {
        if let Some(cell) = self.get_mut(pos) {
            cell.cell_type = cell_type;
        }
    }

    pub fn occupant(&self, pos: GridPos) -> Option<AgentId> {
        self.get(pos).and_then(|c| c.occupant)
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Cell)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let i = i as i32;
            (GridPos::new(i % width, i / width), cell)
        })
    }

    /// Coordinates of every chair, row-major.
    pub fn chairs(&self) -> Vec<GridPos> {
        self.iter()
            .filter(|(_, c)| c.cell_type.is_chair())
            .map(|(p, _)| p)
            .collect()
    }

    /// Coordinates of every cell of the given type, row-major.
    pub fn positions_of(&self, cell_type: CellType) -> Vec<GridPos> {
        self.iter()
            .filter(|(_, c)| c.cell_type == cell_type)
            .map(|(p, _)| p)
            .collect()
    }

    /// In-bounds cardinal neighbours of `pos`.
    pub fn neighbors(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |d| pos.step(d))
            .filter(move |p| self.in_bounds(*p))
    }

    /// Drop every occupant entry. Used before a full resync.
    pub fn clear_occupancy(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }

    /// Text rendering with agents drawn as `@` (user) or `o`/`*` (standing/seated NPC).
    pub fn render_ascii(&self, user: Option<AgentId>, seated: &dyn Fn(AgentId) -> bool) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = &self.cells[(y * self.width + x) as usize];
                let ch = match cell.occupant {
                    Some(id) if Some(id) == user => '@',
                    Some(id) if seated(id) => '*',
                    Some(_) => 'o',
                    None => cell.cell_type.glyph(),
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}
