use serde::{Deserialize, Serialize};

use crate::Cell;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Cell ({row}, {col}) is out of bounds for a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Cells are addressed by [`Cell`] (row, column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid filled by a generator function.
    ///
    /// The generator `f` is called once per cell, in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn from_generator<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(Cell) -> T,
    {
        let size = rows.checked_mul(cols).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(Cell { row, col }));
            }
        }
        Grid { rows, cols, cells }
    }

    /// Builds a grid from already-collected rows.
    ///
    /// Returns `None` if the rows do not all have the same width.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let row_count = rows.len();
        Some(Grid {
            rows: row_count,
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn cell_to_index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row * self.cols + cell.col)
        } else {
            None
        }
    }

    /// Checks if the given cell is within the grid boundaries.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Gets a reference to the value at `cell`, or `None` when out of bounds.
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.cells.get(self.cell_to_index(cell)?)
    }

    /// Like [`Grid::get`], but reports the failing coordinates.
    pub fn try_get(&self, cell: Cell) -> Result<&T, GridError> {
        self.get(cell).ok_or(GridError::OutOfBounds {
            row: cell.row,
            col: cell.col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Returns an iterator that yields `(Cell, &T)` in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Cell, &T)> {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(index, value)| {
            let cell = Cell {
                row: index / cols,
                col: index % cols,
            };
            (cell, value)
        })
    }
}
