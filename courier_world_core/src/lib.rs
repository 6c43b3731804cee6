use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod engine;
pub mod instruction;
pub mod keyring;
pub mod map;
pub mod parse;
pub mod pathfinding;
pub mod world;

/// A grid coordinate, addressed as (row, column) from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Returns the neighbouring cell in `direction`, or `None` if that would
    /// leave the non-negative quadrant. Upper bounds are the grid's concern.
    pub fn step(self, direction: Direction) -> Option<Cell> {
        let (dr, dc) = direction.delta();
        Some(Cell {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    /// Manhattan distance between two cells.
    pub fn manhattan_distance(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four axis-aligned moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by the path finder.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// (row, col) offset of a single step.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            "LEFT" => Some(Direction::Left),
            "RIGHT" => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        };
        f.write_str(word)
    }
}

/// Represents the colour shared by a key and the doors it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl KeyColor {
    pub const ALL: [KeyColor; 4] = [
        KeyColor::Red,
        KeyColor::Green,
        KeyColor::Blue,
        KeyColor::Yellow,
    ];

    /// Lowercase initial used for key cells in grid files.
    pub const fn initial(self) -> char {
        match self {
            KeyColor::Red => 'r',
            KeyColor::Green => 'g',
            KeyColor::Blue => 'b',
            KeyColor::Yellow => 'y',
        }
    }

    /// Maps a grid character to a colour, ignoring case.
    pub fn from_initial(c: char) -> Option<Self> {
        KeyColor::ALL
            .into_iter()
            .find(|color| color.initial() == c.to_ascii_lowercase())
    }

    /// Accepts a full colour name (`red`, `GREEN`) or its single-letter initial.
    pub fn from_word(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        match lower.as_str() {
            "red" => Some(KeyColor::Red),
            "green" => Some(KeyColor::Green),
            "blue" => Some(KeyColor::Blue),
            "yellow" => Some(KeyColor::Yellow),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyColor::from_initial(c),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyColor::Red => "RED",
            KeyColor::Green => "GREEN",
            KeyColor::Blue => "BLUE",
            KeyColor::Yellow => "YELLOW",
        };
        f.write_str(name)
    }
}
