//! Static walkability grid and the grid/world coordinate round trip.

use farmhand_core::CellCoord;
use glam::Vec2;

/// Dense walkability oracle over the farm grid.
///
/// Walkability is computed once at construction from a static obstacle
/// predicate and never changes afterwards. Cells outside the grid bounds are
/// always reported as non-walkable. The map also owns the mapping between
/// grid coordinates and the continuous world frame used for agent transit.
#[derive(Clone, Debug)]
pub struct GridMap {
    width: u32,
    height: u32,
    cell_size: f32,
    walkable: Vec<bool>,
}

impl GridMap {
    /// Builds a grid map, caching the obstacle state of every cell.
    ///
    /// The predicate is queried exactly once per cell, mirroring a static
    /// obstacle sweep at initialization time.
    #[must_use]
    pub fn generate<F>(width: u32, height: u32, cell_size: f32, mut is_blocked: F) -> Self
    where
        F: FnMut(CellCoord) -> bool,
    {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut walkable = vec![false; capacity];

        for row in 0..height {
            for column in 0..width {
                let cell = CellCoord::new(column, row);
                if let Some(index) = index_for(width, height, cell) {
                    walkable[index] = !is_blocked(cell);
                }
            }
        }

        Self {
            width,
            height,
            cell_size,
            walkable,
        }
    }

    /// Builds a fully open grid map with no obstacles.
    #[must_use]
    pub fn open(width: u32, height: u32, cell_size: f32) -> Self {
        Self::generate(width, height, cell_size, |_| false)
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reports whether the cell can be traversed.
    ///
    /// Out-of-bounds coordinates are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        index_for(self.width, self.height, cell)
            .map_or(false, |index| self.walkable.get(index).copied().unwrap_or(false))
    }

    /// Converts a grid coordinate to its world-frame cell center.
    #[must_use]
    pub fn to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            cell.column() as f32 * self.cell_size,
            cell.row() as f32 * self.cell_size,
        )
    }

    /// Converts a world-frame position back to the nearest grid coordinate.
    ///
    /// Returns `None` for positions that round outside the grid bounds. For
    /// every in-bounds cell `c`, `to_grid(to_world(c)) == Some(c)`.
    #[must_use]
    pub fn to_grid(&self, position: Vec2) -> Option<CellCoord> {
        let column = (position.x / self.cell_size).round();
        let row = (position.y / self.cell_size).round();
        if column < 0.0 || row < 0.0 {
            return None;
        }

        let cell = CellCoord::new(column as u32, row as u32);
        if cell.column() < self.width && cell.row() < self.height {
            Some(cell)
        } else {
            None
        }
    }
}

fn index_for(width: u32, height: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() < width && cell.row() < height {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(width).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}
