//! A* pathfinder over the farm walkability grid.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use farmhand_core::CellCoord;

use crate::grid::GridMap;

const ORTHOGONAL_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// A* search producing ordered cell paths between two grid coordinates.
///
/// The search expands 4-connected neighbors by default; diagonal movement
/// can be enabled at construction, switching the step costs and heuristic to
/// the weighted 14/10 scheme. Ties on equal `f = g + h` prefer the lower
/// heuristic and then the earliest-discovered node, so repeated searches over
/// the same grid are reproducible.
///
/// Search workspaces are owned by the value and reset at the start of every
/// call; no per-node state survives between searches. The search never
/// consults destination reservations: arbitration over target cells is the
/// caller's concern.
#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    diagonals: bool,
    nodes: Vec<NodeState>,
    open: BinaryHeap<OpenEntry>,
}

impl PathFinder {
    /// Creates a pathfinder restricted to 4-connected movement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pathfinder that may also step diagonally.
    #[must_use]
    pub fn with_diagonals() -> Self {
        Self {
            diagonals: true,
            ..Self::default()
        }
    }

    /// Finds a path from `start` to `target` over the provided grid.
    ///
    /// The returned sequence runs from the cell after `start` through
    /// `target`. It is empty when either endpoint is non-walkable, when the
    /// target cannot be reached, or when `start == target` (the caller
    /// resolves the at-target case without moving).
    pub fn find_path(
        &mut self,
        grid: &GridMap,
        start: CellCoord,
        target: CellCoord,
    ) -> Vec<CellCoord> {
        if start == target {
            return Vec::new();
        }
        if !grid.is_walkable(start) || !grid.is_walkable(target) {
            return Vec::new();
        }

        self.reset(grid);

        let mut sequence = 0_u64;
        let width = grid.width();
        let height = grid.height();

        let start_h = self.heuristic(start, target);
        if let Some(index) = node_index(width, height, start) {
            self.nodes[index] = NodeState {
                g_cost: 0,
                parent: None,
                reached: true,
                closed: false,
            };
            self.open.push(OpenEntry {
                f_cost: start_h,
                h_cost: start_h,
                sequence,
                cell: start,
            });
        }

        while let Some(entry) = self.open.pop() {
            let Some(current_index) = node_index(width, height, entry.cell) else {
                continue;
            };
            if self.nodes[current_index].closed {
                // Stale heap entry superseded by a cheaper rediscovery.
                continue;
            }
            self.nodes[current_index].closed = true;

            if entry.cell == target {
                return self.retrace(width, height, start, target);
            }

            let current_g = self.nodes[current_index].g_cost;
            for (neighbor, step_cost) in neighbors(entry.cell, width, height, self.diagonals) {
                if !grid.is_walkable(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = node_index(width, height, neighbor) else {
                    continue;
                };
                if self.nodes[neighbor_index].closed {
                    continue;
                }

                let tentative_g = current_g.saturating_add(step_cost);
                let h_cost = self.heuristic(neighbor, target);
                let node = &mut self.nodes[neighbor_index];
                if node.reached && tentative_g >= node.g_cost {
                    continue;
                }

                *node = NodeState {
                    g_cost: tentative_g,
                    parent: Some(entry.cell),
                    reached: true,
                    closed: false,
                };
                sequence += 1;
                self.open.push(OpenEntry {
                    f_cost: tentative_g.saturating_add(h_cost),
                    h_cost,
                    sequence,
                    cell: neighbor,
                });
            }
        }

        Vec::new()
    }

    fn reset(&mut self, grid: &GridMap) {
        let cell_count_u64 = u64::from(grid.width()) * u64::from(grid.height());
        let cell_count = usize::try_from(cell_count_u64).unwrap_or(0);
        self.nodes.clear();
        self.nodes.resize(cell_count, NodeState::default());
        self.open.clear();
    }

    fn heuristic(&self, from: CellCoord, to: CellCoord) -> u32 {
        let dx = from.column().abs_diff(to.column());
        let dy = from.row().abs_diff(to.row());
        if self.diagonals {
            let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
            DIAGONAL_COST.saturating_mul(short).saturating_add(
                ORTHOGONAL_COST.saturating_mul(long - short),
            )
        } else {
            ORTHOGONAL_COST.saturating_mul(dx.saturating_add(dy))
        }
    }

    fn retrace(
        &self,
        width: u32,
        height: u32,
        start: CellCoord,
        target: CellCoord,
    ) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut current = target;

        while current != start {
            path.push(current);
            let Some(index) = node_index(width, height, current) else {
                return Vec::new();
            };
            match self.nodes[index].parent {
                Some(parent) => current = parent,
                None => return Vec::new(),
            }
        }

        path.reverse();
        path
    }
}

/// Per-cell working state for one search. The heuristic for a discovered
/// node travels with its open-set entry.
#[derive(Clone, Copy, Debug, Default)]
struct NodeState {
    g_cost: u32,
    parent: Option<CellCoord>,
    reached: bool,
    closed: bool,
}

/// Heap entry ordered as a min-heap on `(f, h, sequence)`.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f_cost: u32,
    h_cost: u32,
    sequence: u64,
    cell: CellCoord,
}

impl OpenEntry {
    fn rank(&self) -> (u32, u32, u64) {
        (self.f_cost, self.h_cost, self.sequence)
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the std max-heap pops the smallest rank first.
        other.rank().cmp(&self.rank())
    }
}

fn node_index(width: u32, height: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() < width && cell.row() < height {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(width).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}

fn neighbors(
    cell: CellCoord,
    width: u32,
    height: u32,
    diagonals: bool,
) -> impl Iterator<Item = (CellCoord, u32)> {
    let mut candidates = [None; 8];
    let mut count = 0;
    let mut push = |column: Option<u32>, row: Option<u32>, cost: u32| {
        if let (Some(column), Some(row)) = (column, row) {
            if column < width && row < height && count < candidates.len() {
                candidates[count] = Some((CellCoord::new(column, row), cost));
                count += 1;
            }
        }
    };

    let column = cell.column();
    let row = cell.row();

    push(column.checked_add(1), Some(row), ORTHOGONAL_COST);
    push(column.checked_sub(1), Some(row), ORTHOGONAL_COST);
    push(Some(column), row.checked_add(1), ORTHOGONAL_COST);
    push(Some(column), row.checked_sub(1), ORTHOGONAL_COST);

    if diagonals {
        push(column.checked_add(1), row.checked_add(1), DIAGONAL_COST);
        push(column.checked_add(1), row.checked_sub(1), DIAGONAL_COST);
        push(column.checked_sub(1), row.checked_add(1), DIAGONAL_COST);
        push(column.checked_sub(1), row.checked_sub(1), DIAGONAL_COST);
    }

    candidates.into_iter().take(count).flatten()
}
