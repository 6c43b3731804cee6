//! A* search over the 4-connected grid, with door passability decided by a
//! [`KeyRing`] snapshot taken for the duration of a single call.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Cell, Direction, keyring::KeyRing, world::GridWorld};

/// One move of a path: the direction taken and the cell it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub direction: Direction,
    pub cell: Cell,
}

impl Step {
    pub const fn new(direction: Direction, cell: Cell) -> Self {
        Step { direction, cell }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no path from {from} to {to} with the keys currently held")]
    NoPath { from: Cell, to: Cell },
}

/// Frontier entry. Ordered so that `BinaryHeap` pops the lowest `f = g + h`
/// first, then the lowest `h`, then the earliest pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    f: usize,
    h: usize,
    seq: u64,
    cell: Cell,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on every key for min-heap behaviour
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds a minimal-step route from `start` to `goal`.
///
/// Doors whose colour is not in `keys` are treated as walls for this call
/// only. Neighbours are expanded in [`Direction::ALL`] order and frontier ties
/// are broken as described on [`Frontier`], so identical inputs always yield
/// the identical path.
///
/// Returns an empty path when `start == goal`, and [`PathError::NoPath`] when
/// the goal cannot be reached.
pub fn find_path(
    world: &GridWorld,
    keys: &KeyRing,
    start: Cell,
    goal: Cell,
) -> Result<Vec<Step>, PathError> {
    if start == goal {
        return Ok(Vec::new());
    }
    let no_path = PathError::NoPath {
        from: start,
        to: goal,
    };
    if !world.in_bounds(start) || !world.is_passable(goal, keys) {
        debug!(%start, %goal, "goal is not passable, skipping search");
        return Err(no_path);
    }

    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<Cell, (Cell, Direction)> = HashMap::new();
    let mut cost_so_far: HashMap<Cell, usize> = HashMap::new();
    let mut closed: HashSet<Cell> = HashSet::new();
    let mut seq = 0u64;

    let h = start.manhattan_distance(goal);
    frontier.push(Frontier {
        f: h,
        h,
        seq,
        cell: start,
    });
    cost_so_far.insert(start, 0);

    let mut expanded = 0usize;
    let mut goal_reached = false;

    while let Some(Frontier { cell: current, .. }) = frontier.pop() {
        if current == goal {
            goal_reached = true;
            break;
        }
        // Stale duplicates of an already-settled cell
        if !closed.insert(current) {
            continue;
        }
        expanded += 1;

        let current_cost = cost_so_far.get(&current).copied().unwrap_or(usize::MAX);
        for direction in Direction::ALL {
            let Some(neighbor) = world.neighbor(current, direction) else {
                continue;
            };
            if closed.contains(&neighbor) || !world.is_passable(neighbor, keys) {
                continue;
            }

            let new_cost = current_cost + 1;
            let improved = cost_so_far
                .get(&neighbor)
                .is_none_or(|known| new_cost < *known);
            if improved {
                cost_so_far.insert(neighbor, new_cost);
                came_from.insert(neighbor, (current, direction));
                let h = neighbor.manhattan_distance(goal);
                seq += 1;
                frontier.push(Frontier {
                    f: new_cost + h,
                    h,
                    seq,
                    cell: neighbor,
                });
            }
        }
    }

    trace!(%start, %goal, expanded, "A* search finished");

    if !goal_reached {
        debug!(%start, %goal, "no path");
        return Err(no_path);
    }

    // Reconstruct path
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let (previous, direction) = *came_from.get(&current).ok_or(no_path)?;
        path.push(Step::new(direction, current));
        current = previous;
    }
    path.reverse();

    debug!(%start, %goal, steps = path.len(), "path found");
    Ok(path)
}
