//! Node coordinates, encoded as `row*100 + col`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROWS: u16 = 8;
pub const COLS: u16 = 18;
pub const NODE_COUNT: usize = (ROWS as usize) * (COLS as usize);

/// A validated mesh coordinate. Construction rejects any `row*100+col`
/// encoding outside the 8x18 mesh (e.g. 199, which has a valid-looking
/// decimal shape but `col == 99`). Serializes as the bare `row*100+col`
/// integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Coord(u16);

impl From<Coord> for u16 {
    fn from(value: Coord) -> Self {
        value.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidCoord(pub u16);

impl fmt::Display for InvalidCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coordinate {} is not a valid row*100+col node address", self.0)
    }
}

impl std::error::Error for InvalidCoord {}

impl Coord {
    pub fn new(row: u16, col: u16) -> Option<Self> {
        if row < ROWS && col < COLS {
            Some(Self(row * 100 + col))
        } else {
            None
        }
    }

    pub fn row(self) -> u16 {
        self.0 / 100
    }

    pub fn col(self) -> u16 {
        self.0 % 100
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    /// Linear index into a `[T; NODE_COUNT]` array, row-major.
    pub fn index(self) -> usize {
        (self.row() as usize) * (COLS as usize) + (self.col() as usize)
    }

    pub fn from_index(index: usize) -> Self {
        let row = (index / COLS as usize) as u16;
        let col = (index % COLS as usize) as u16;
        Self(row * 100 + col)
    }

    /// `east` maps to `RIGHT` on even columns, `LEFT` on odd (§3.4).
    pub fn east_port_is_right(self) -> bool {
        self.col() % 2 == 0
    }

    /// `south` maps to `UP` on even rows, `DOWN` on odd (§3.4).
    pub fn south_port_is_up(self) -> bool {
        self.row() % 2 == 0
    }

    pub fn neighbor(self, dir: Direction) -> Option<Coord> {
        let (row, col) = (self.row() as i32, self.col() as i32);
        let (row, col) = match dir {
            Direction::North => (row - 1, col),
            Direction::South => (row + 1, col),
            Direction::East => (row, col + 1),
            Direction::West => (row, col - 1),
        };
        if row < 0 || col < 0 {
            return None;
        }
        Coord::new(row as u16, col as u16)
    }
}

impl TryFrom<u16> for Coord {
    type Error = InvalidCoord;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let row = value / 100;
        let col = value % 100;
        Coord::new(row, col).ok_or(InvalidCoord(value))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];
}
