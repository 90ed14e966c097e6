//! Core types shared across the simulation

use std::fmt;

/// A unique identifier for a vehicle
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub usize);

/// A coordinate on the fine grid
///
/// The fine grid is `(2W+1) x (2H+1)` cells for a logical `W x H`
/// intersection lattice: odd indices are logical cells, even indices are the
/// walls/passages between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The neighboring cell one step in the given direction, if it stays in
    /// the `width x height` bounds
    pub fn step(&self, direction: Direction, width: usize, height: usize) -> Option<GridPos> {
        let (dx, dy) = direction.offset();
        let nx = self.x as i64 + dx as i64;
        let ny = self.y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
            return None;
        }
        Some(GridPos::new(nx as usize, ny as usize))
    }

    /// Cardinal direction from this cell to an adjacent cell
    ///
    /// Defaults to north for non-adjacent inputs; callers only pass
    /// consecutive route waypoints, which are always 4-adjacent.
    pub fn direction_to(&self, other: &GridPos) -> Direction {
        let dx = other.x as i64 - self.x as i64;
        let dy = other.y as i64 - self.y as i64;
        if dy < 0 {
            Direction::North
        } else if dy > 0 {
            Direction::South
        } else if dx > 0 {
            Direction::East
        } else {
            Direction::West
        }
    }

    pub fn manhattan_distance(&self, other: &GridPos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A cardinal direction of travel on the grid
///
/// North is decreasing `y`, matching the screen-space orientation of the
/// grid (row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The `(dx, dy)` grid offset of one step in this direction
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// The signal axis governing travel in this direction
    pub fn axis(&self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }
}

/// One of the two perpendicular traffic axes at an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::NorthSouth => write!(f, "ns"),
            Axis::EastWest => write!(f, "ew"),
        }
    }
}
