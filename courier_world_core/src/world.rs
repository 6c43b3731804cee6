use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Cell, Direction, KeyColor,
    keyring::KeyRing,
    map::{Grid, GridError},
};

/// Represents the static type of a cell in the world grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Open,
    Wall,
    /// Passable only while the matching key is held.
    Door(KeyColor),
}

/// Errors raised while assembling a [`GridWorld`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("{what} at {cell} is placed inside a wall")]
    InsideWall { what: &'static str, cell: Cell },
}

/// The walled grid plus the fixed locations of keys and the two start cells.
///
/// Immutable once built; the simulation only ever reads from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWorld {
    terrain: Grid<CellKind>,
    key_locations: BTreeMap<KeyColor, Cell>,
    agent_start: Cell,
    human_start: Cell,
}

impl GridWorld {
    /// Validates that every placed entity is in bounds and not inside a wall.
    pub fn new(
        terrain: Grid<CellKind>,
        key_locations: BTreeMap<KeyColor, Cell>,
        agent_start: Cell,
        human_start: Cell,
    ) -> Result<Self, WorldError> {
        let placed = [("agent start", agent_start), ("human start", human_start)]
            .into_iter()
            .chain(key_locations.values().map(|cell| ("key", *cell)));
        for (what, cell) in placed {
            if *terrain.try_get(cell)? == CellKind::Wall {
                return Err(WorldError::InsideWall { what, cell });
            }
        }
        Ok(GridWorld {
            terrain,
            key_locations,
            agent_start,
            human_start,
        })
    }

    pub fn rows(&self) -> usize {
        self.terrain.rows()
    }

    pub fn cols(&self) -> usize {
        self.terrain.cols()
    }

    pub fn agent_start(&self) -> Cell {
        self.agent_start
    }

    pub fn human_start(&self) -> Cell {
        self.human_start
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.terrain.contains(cell)
    }

    /// Returns the kind of `cell`, or `None` when it lies outside the grid.
    pub fn cell_kind(&self, cell: Cell) -> Option<CellKind> {
        self.terrain.get(cell).copied()
    }

    /// True iff `cell` is in bounds, not a wall, and not a door whose key is
    /// missing from `keys`.
    pub fn is_passable(&self, cell: Cell, keys: &KeyRing) -> bool {
        match self.cell_kind(cell) {
            None | Some(CellKind::Wall) => false,
            Some(CellKind::Open) => true,
            Some(CellKind::Door(color)) => keys.contains(color),
        }
    }

    /// True iff `cell` is in bounds and not a wall. Doors count as walkable,
    /// which is the rule the scripted human follows.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        matches!(self.cell_kind(cell), Some(CellKind::Open | CellKind::Door(_)))
    }

    /// The cell one step from `from`, if it is inside the grid.
    pub fn neighbor(&self, from: Cell, direction: Direction) -> Option<Cell> {
        from.step(direction).filter(|cell| self.in_bounds(*cell))
    }

    pub fn key_location(&self, color: KeyColor) -> Option<Cell> {
        self.key_locations.get(&color).copied()
    }

    pub fn key_locations(&self) -> impl Iterator<Item = (KeyColor, Cell)> + '_ {
        self.key_locations.iter().map(|(color, cell)| (*color, *cell))
    }

    /// Finds all cells holding a door of the given colour.
    pub fn door_locations(&self, color: KeyColor) -> Vec<Cell> {
        self.terrain
            .enumerate()
            .filter_map(|(cell, kind)| match kind {
                CellKind::Door(door) if *door == color => Some(cell),
                _ => None,
            })
            .collect()
    }
}
