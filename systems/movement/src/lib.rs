#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement planner that searches the tile grid under a TU
//! budget.
//!
//! Movement is 4-connected and the cost of a path is the sum of the entry
//! costs of every tile it enters; the starting tile is free. Both searches
//! expand nodes in `(cost, tile index)` order, so equal-cost alternatives
//! resolve identically on every run.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};

use terror_site_core::{OccupancyView, TerrainView, TilePos};

/// Tiles a unit can reach with its current budget.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementRange {
    remaining: BTreeMap<TilePos, u32>,
}

impl MovementRange {
    /// Reports whether the tile can be reached.
    #[must_use]
    pub fn contains(&self, pos: TilePos) -> bool {
        self.remaining.contains_key(&pos)
    }

    /// Best TU left over after walking to the tile.
    #[must_use]
    pub fn remaining(&self, pos: TilePos) -> Option<u32> {
        self.remaining.get(&pos).copied()
    }

    /// Reachable tiles paired with the TU left after reaching them.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, u32)> + '_ {
        self.remaining.iter().map(|(pos, tu)| (*pos, *tu))
    }

    /// Reachable tiles in ascending position order.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.remaining.keys().copied()
    }

    /// Number of reachable tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    /// Reports whether no tile can be reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Computes every tile reachable from `origin` without exceeding `budget`.
///
/// A neighbour is a candidate when it lies on the map, is passable, is not
/// occupied and its entry cost fits in the TU left at the current tile. A
/// tile is revisited only when a route leaves more TU than any route found
/// before it. The origin itself is never part of the result.
#[must_use]
pub fn movement_range(
    terrain: &TerrainView<'_>,
    occupancy: OccupancyView<'_>,
    origin: TilePos,
    budget: u32,
) -> MovementRange {
    let mut range = MovementRange::default();
    let Some(origin_index) = terrain.index(origin) else {
        return range;
    };

    let node_count = node_count(terrain);
    let mut best: Vec<Option<u32>> = vec![None; node_count];
    let mut frontier = BinaryHeap::new();
    best[origin_index] = Some(budget);
    frontier.push((budget, Reverse(origin_index)));

    while let Some((left, Reverse(index))) = frontier.pop() {
        if best[index] != Some(left) {
            continue;
        }
        let Some(pos) = terrain.position(index) else {
            continue;
        };
        for neighbor in terrain.neighbors(pos) {
            if !occupancy.is_free(neighbor) {
                continue;
            }
            let Some(cost) = terrain.tu_cost(neighbor) else {
                continue;
            };
            let Some(after) = left.checked_sub(cost) else {
                continue;
            };
            let Some(neighbor_index) = terrain.index(neighbor) else {
                continue;
            };
            if best[neighbor_index].is_some_and(|recorded| recorded >= after) {
                continue;
            }
            best[neighbor_index] = Some(after);
            frontier.push((after, Reverse(neighbor_index)));
        }
    }

    for (index, left) in best.into_iter().enumerate() {
        if index == origin_index {
            continue;
        }
        if let (Some(left), Some(pos)) = (left, terrain.position(index)) {
            let _ = range.remaining.insert(pos, left);
        }
    }

    tracing::trace!(%origin, budget, reachable = range.len(), "movement range computed");
    range
}

/// Finds the cheapest 4-connected path from `start` to `end`.
///
/// The returned steps exclude `start` and end on `end`. Tiles occupied by
/// other units block the search unless they are the destination itself. The
/// unit's TU budget is not considered; callers truncate with
/// [`affordable_prefix`]. Returns `None` when no path exists, and an empty
/// path when `start == end`.
#[must_use]
pub fn find_path(
    terrain: &TerrainView<'_>,
    occupancy: OccupancyView<'_>,
    start: TilePos,
    end: TilePos,
) -> Option<Vec<TilePos>> {
    let start_index = terrain.index(start)?;
    let end_index = terrain.index(end)?;
    if start_index == end_index {
        return Some(Vec::new());
    }
    if !terrain.is_passable(end) {
        return None;
    }

    let node_count = node_count(terrain);
    let mut cost: Vec<Option<u32>> = vec![None; node_count];
    let mut came_from: Vec<Option<usize>> = vec![None; node_count];
    let mut frontier = BinaryHeap::new();
    cost[start_index] = Some(0);
    frontier.push(Reverse((0_u32, start_index)));

    while let Some(Reverse((spent, index))) = frontier.pop() {
        if index == end_index {
            break;
        }
        if cost[index] != Some(spent) {
            continue;
        }
        let Some(pos) = terrain.position(index) else {
            continue;
        };
        for neighbor in terrain.neighbors(pos) {
            let Some(neighbor_index) = terrain.index(neighbor) else {
                continue;
            };
            if neighbor_index != end_index && !occupancy.is_free(neighbor) {
                continue;
            }
            let Some(step) = terrain.tu_cost(neighbor) else {
                continue;
            };
            let total = spent.saturating_add(step);
            if cost[neighbor_index].is_some_and(|recorded| recorded <= total) {
                continue;
            }
            cost[neighbor_index] = Some(total);
            came_from[neighbor_index] = Some(index);
            frontier.push(Reverse((total, neighbor_index)));
        }
    }

    if cost[end_index].is_none() {
        return None;
    }
    let mut steps = Vec::new();
    let mut cursor = end_index;
    while cursor != start_index {
        steps.push(terrain.position(cursor)?);
        cursor = came_from[cursor]?;
    }
    steps.reverse();
    tracing::trace!(%start, %end, steps = steps.len(), "path found");
    Some(steps)
}

/// Total entry cost of the provided steps, `None` if any step is impassable.
#[must_use]
pub fn path_cost(terrain: &TerrainView<'_>, path: &[TilePos]) -> Option<u32> {
    path.iter()
        .try_fold(0_u32, |total, pos| Some(total.saturating_add(terrain.tu_cost(*pos)?)))
}

/// Number of leading steps of `path` whose summed cost fits in `budget`.
#[must_use]
pub fn affordable_prefix(terrain: &TerrainView<'_>, path: &[TilePos], budget: u32) -> usize {
    let mut left = budget;
    for (taken, pos) in path.iter().enumerate() {
        let Some(cost) = terrain.tu_cost(*pos) else {
            return taken;
        };
        let Some(after) = left.checked_sub(cost) else {
            return taken;
        };
        left = after;
    }
    path.len()
}

fn node_count(terrain: &TerrainView<'_>) -> usize {
    let (width, height) = terrain.dimensions();
    usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0)
}
