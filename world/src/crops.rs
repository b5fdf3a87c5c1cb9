//! Crop and deposit entities anchored to farm cells.

use farmhand_core::{CellCoord, PlantSnapshot};

/// Crop growing on a single planted cell.
///
/// A plant is seeded once at farm construction and never destroyed; after
/// harvesting it remains as a terminal record excluded from task candidacy.
#[derive(Clone, Debug)]
pub struct Plant {
    cell: CellCoord,
    maturity: u32,
    watered: bool,
    harvested: bool,
}

impl Plant {
    pub(crate) const fn seeded_at(cell: CellCoord) -> Self {
        Self {
            cell,
            maturity: 0,
            watered: false,
            harvested: false,
        }
    }

    /// Cell occupied by the plant.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Growth counter, capped at the configured maturity threshold.
    #[must_use]
    pub const fn maturity(&self) -> u32 {
        self.maturity
    }

    /// Whether the plant has been harvested.
    #[must_use]
    pub const fn is_harvested(&self) -> bool {
        self.harvested
    }

    /// Reports whether the plant would accept water.
    #[must_use]
    pub fn needs_water(&self, maturity_threshold: u32) -> bool {
        !self.watered && !self.harvested && self.maturity < maturity_threshold
    }

    /// Reports whether the plant is ready to be harvested.
    #[must_use]
    pub fn is_ready_for_harvest(&self, maturity_threshold: u32) -> bool {
        self.maturity >= maturity_threshold && !self.harvested
    }

    /// Stores water for the next growth increment.
    pub(crate) fn water(&mut self) {
        self.watered = true;
    }

    /// Consumes stored water to advance maturity by one level.
    ///
    /// Returns whether the plant actually grew; unwatered, harvested, and
    /// fully mature plants are untouched.
    pub(crate) fn grow(&mut self, maturity_threshold: u32) -> bool {
        if self.watered && !self.harvested && self.maturity < maturity_threshold {
            self.maturity += 1;
            self.watered = false;
            true
        } else {
            false
        }
    }

    /// Marks the plant as harvested. Terminal.
    pub(crate) fn harvest(&mut self) {
        self.harvested = true;
    }

    #[cfg(feature = "farm_scaffolding")]
    pub(crate) fn set_growth(&mut self, maturity: u32, watered: bool) {
        self.maturity = maturity;
        self.watered = watered;
    }

    /// Captures the plant's state for queries.
    #[must_use]
    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot {
            cell: self.cell,
            maturity: self.maturity,
            watered: self.watered,
            harvested: self.harvested,
        }
    }
}

/// Single deposit sink accumulating harvested wheat.
#[derive(Clone, Debug)]
pub struct Silo {
    cell: CellCoord,
    total_deposited: u64,
}

impl Silo {
    pub(crate) const fn at(cell: CellCoord) -> Self {
        Self {
            cell,
            total_deposited: 0,
        }
    }

    /// Cell occupied by the silo.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Total wheat units deposited since construction. Never decreases.
    #[must_use]
    pub const fn total_deposited(&self) -> u64 {
        self.total_deposited
    }

    /// Adds the provided amount to the accumulated total.
    pub(crate) fn deposit(&mut self, amount: u32) {
        self.total_deposited = self.total_deposited.saturating_add(u64::from(amount));
    }
}
