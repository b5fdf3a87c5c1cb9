#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Farmhand engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative farm world, and pure systems. The scheduler submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and observers to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a single farm cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new farm cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Unique identifier assigned to a tractor agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Activity an agent can be engaged in, with the destination cell for every
/// non-idle variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    /// Resting state; the agent awaits its next assignment.
    Idle,
    /// Drive to the target plant and water it.
    Watering {
        /// Cell occupied by the plant to water.
        target: CellCoord,
    },
    /// Drive to the target plant and harvest it.
    Harvesting {
        /// Cell occupied by the plant to harvest.
        target: CellCoord,
    },
    /// Drive to the silo and deposit the carried wheat.
    Depositing {
        /// Cell occupied by the silo.
        target: CellCoord,
    },
}

impl Task {
    /// Destination cell of the task, if it has one.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        match self {
            Self::Idle => None,
            Self::Watering { target }
            | Self::Harvesting { target }
            | Self::Depositing { target } => Some(*target),
        }
    }

    /// Reports whether the task is the resting state.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Result of an agent's terminal action upon arriving at its task target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    /// The plant at the destination was watered.
    Watered,
    /// The plant at the destination was harvested into the agent's hopper.
    Harvested,
    /// The agent's wheat load was transferred to the silo.
    Deposited {
        /// Number of wheat units transferred.
        amount: u32,
    },
    /// The precondition no longer held on arrival; nothing happened.
    Skipped,
}

/// Reasons a task assignment request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// No identifier matched a known agent.
    UnknownAgent,
    /// The agent already carries a non-idle task.
    AgentBusy,
    /// The agent has no fuel left and may not begin a new task.
    OutOfFuel,
    /// The resting state cannot be assigned as a task.
    IdleTask,
    /// The pathfinder produced no route to the target cell.
    Unreachable,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the farm from the provided configuration.
    ConfigureFarm {
        /// Validated simulation parameters.
        config: SimulationConfig,
    },
    /// Advances every plant's growth once. Starts a simulation step.
    GrowPlants,
    /// Requests that an idle agent take on the provided task.
    AssignTask {
        /// Identifier of the agent receiving the task.
        agent: AgentId,
        /// Task the agent should perform.
        task: Task,
    },
    /// Advances every agent one movement increment along its path.
    AdvanceAgents,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Fired once after farm construction completes, before the first step.
    SimulationInitialized {
        /// Number of agents placed on the farm.
        agents: u32,
        /// Number of plants seeded into the planted region.
        plants: u32,
    },
    /// Announces that a simulation step began.
    StepStarted {
        /// Zero-based index of the step that is starting.
        step_index: u64,
    },
    /// Reports that a plant's maturity advanced during the growth phase.
    PlantGrew {
        /// Cell occupied by the plant.
        cell: CellCoord,
        /// Maturity level reached after growing.
        maturity: u32,
    },
    /// Confirms that an agent accepted a task and reserved its destination.
    TaskAssigned {
        /// Identifier of the agent that accepted the task.
        agent: AgentId,
        /// Task the agent will perform.
        task: Task,
    },
    /// Reports that a task assignment request was rejected.
    TaskRejected {
        /// Identifier of the agent named in the request.
        agent: AgentId,
        /// Task that was requested.
        task: Task,
        /// Specific reason the assignment failed.
        reason: RejectReason,
    },
    /// Confirms that an agent completed a movement increment onto a new cell.
    AgentMoved {
        /// Identifier of the agent that moved.
        agent: AgentId,
        /// Cell the agent occupied before moving.
        from: CellCoord,
        /// Cell the agent occupies after the move.
        to: CellCoord,
    },
    /// Confirms that an agent arrived at its destination and resolved its
    /// task, releasing the destination reservation.
    TaskCompleted {
        /// Identifier of the agent that finished.
        agent: AgentId,
        /// Task that was resolved.
        task: Task,
        /// What actually happened on arrival.
        outcome: TaskOutcome,
    },
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Grid cell currently occupied by the agent.
    pub cell: CellCoord,
    /// Task the agent is engaged in.
    pub task: Task,
    /// Remaining water units.
    pub water_level: u32,
    /// Remaining fuel units.
    pub fuel_level: u32,
    /// Wheat units currently carried.
    pub wheat_level: u32,
}

/// Read-only snapshot describing all agents working the farm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single plant's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantSnapshot {
    /// Cell occupied by the plant.
    pub cell: CellCoord,
    /// Growth counter, capped at the configured maturity threshold.
    pub maturity: u32,
    /// Whether the plant holds water for its next growth increment.
    pub watered: bool,
    /// Whether the plant has been harvested. Terminal.
    pub harvested: bool,
}

impl PlantSnapshot {
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
}

/// Read-only snapshot describing all plants in the planted region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlantView {
    snapshots: Vec<PlantSnapshot>,
}

impl PlantView {
    /// Creates a new plant view from the provided snapshots.
    ///
    /// Snapshots are kept in row-major order so candidate scans are
    /// reproducible regardless of how the caller collected them.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlantSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.cell.row(), snapshot.cell.column()));
        Self { snapshots }
    }

    /// Iterator over the captured plant snapshots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &PlantSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PlantSnapshot> {
        self.snapshots
    }
}

/// Read-only state captured once per step for rendering and reporting
/// collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// Zero-based index of the step the snapshot was captured after.
    pub step_index: u64,
    /// Agent states in ascending id order.
    pub agents: Vec<AgentSnapshot>,
    /// Plant states in row-major order.
    pub plants: Vec<PlantSnapshot>,
    /// Total wheat units accumulated by the silo.
    pub silo_total: u64,
}

/// Simulation parameters accepted at the initialization boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of planted columns in the inner region.
    pub plant_grid_width: u32,
    /// Number of planted rows in the inner region.
    pub plant_grid_height: u32,
    /// Width of the open path ringing the planted region, in cells.
    pub path_border_width: u32,
    /// Number of tractor agents to place on the border path.
    pub num_agents: u32,
    /// Water units each agent starts with.
    pub water_capacity: u32,
    /// Fuel units each agent starts with. Fuel only decreases.
    pub fuel_capacity: u32,
    /// Wheat units an agent can carry before it must deposit.
    pub wheat_capacity: u32,
    /// Number of steps the simulation runs before finishing.
    pub total_steps: u64,
    /// Steps fired per second of accumulated real time.
    pub steps_per_second: f32,
    /// Maturity level at which a plant becomes harvestable.
    pub maturity_threshold: u32,
    /// Side length of a square cell in world units.
    pub cell_size: f32,
    /// Seed for the deterministic agent placement shuffle.
    pub rng_seed: u64,
    /// Enables diagonal movement in the pathfinder.
    pub diagonal_movement: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            plant_grid_width: 5,
            plant_grid_height: 5,
            path_border_width: 2,
            num_agents: 3,
            water_capacity: 20,
            fuel_capacity: 100,
            wheat_capacity: 5,
            total_steps: 200,
            steps_per_second: 2.0,
            maturity_threshold: 5,
            cell_size: 5.0,
            rng_seed: 0x7a3d_90c4_51b2_ee08,
            diagonal_movement: false,
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration and derives the farm geometry.
    ///
    /// Malformed input never reaches the world: every rejection happens here,
    /// before any simulation state exists.
    pub fn validate(&self) -> Result<FarmLayout, ConfigError> {
        FarmLayout::from_config(self)
    }
}

/// Reasons a configuration is rejected at the initialization boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The planted region must span at least one cell in each dimension.
    #[error("planted region must be at least 1x1 cells")]
    EmptyPlantGrid,
    /// The border path must be at least one cell wide.
    #[error("path border width must be at least 1 cell")]
    MissingBorder,
    /// At least one agent is required to work the farm.
    #[error("at least one agent is required")]
    NoAgents,
    /// Capacities of zero would deadlock the priority policy.
    #[error("water, fuel and wheat capacities must all be at least 1")]
    ZeroCapacity,
    /// The simulation must run for at least one step.
    #[error("total steps must be at least 1")]
    NoSteps,
    /// The step rate must be a positive, finite number.
    #[error("steps per second must be positive and finite")]
    InvalidStepRate,
    /// The cell size must be a positive, finite number.
    #[error("cell size must be positive and finite")]
    InvalidCellSize,
    /// The requested grid does not fit into the coordinate space.
    #[error("grid dimensions overflow the coordinate space")]
    GridTooLarge,
    /// More agents were requested than border cells exist to hold them.
    #[error("{requested} agents requested but only {available} border cells exist")]
    TooManyAgents {
        /// Number of agents the configuration asked for.
        requested: u32,
        /// Number of border path cells available for placement.
        available: u32,
    },
}

/// Farm geometry derived from a validated [`SimulationConfig`].
///
/// The planted region sits centered inside the grid, ringed by an open path
/// of `path_border_width` cells on every side. The silo occupies the
/// top-right corner path cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FarmLayout {
    grid_width: u32,
    grid_height: u32,
    border: u32,
    plant_width: u32,
    plant_height: u32,
}

impl FarmLayout {
    /// Derives and validates the farm geometry from raw configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        if config.plant_grid_width == 0 || config.plant_grid_height == 0 {
            return Err(ConfigError::EmptyPlantGrid);
        }
        if config.path_border_width == 0 {
            return Err(ConfigError::MissingBorder);
        }
        if config.num_agents == 0 {
            return Err(ConfigError::NoAgents);
        }
        if config.water_capacity == 0 || config.fuel_capacity == 0 || config.wheat_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if config.total_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        if !(config.steps_per_second.is_finite() && config.steps_per_second > 0.0) {
            return Err(ConfigError::InvalidStepRate);
        }
        if !(config.cell_size.is_finite() && config.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize);
        }

        let ring = config
            .path_border_width
            .checked_mul(2)
            .ok_or(ConfigError::GridTooLarge)?;
        let grid_width = config
            .plant_grid_width
            .checked_add(ring)
            .ok_or(ConfigError::GridTooLarge)?;
        let grid_height = config
            .plant_grid_height
            .checked_add(ring)
            .ok_or(ConfigError::GridTooLarge)?;
        let cell_count = u64::from(grid_width)
            .checked_mul(u64::from(grid_height))
            .ok_or(ConfigError::GridTooLarge)?;
        if usize::try_from(cell_count).is_err() {
            return Err(ConfigError::GridTooLarge);
        }

        let layout = Self {
            grid_width,
            grid_height,
            border: config.path_border_width,
            plant_width: config.plant_grid_width,
            plant_height: config.plant_grid_height,
        };

        let available = layout.border_cell_count();
        if config.num_agents > available {
            return Err(ConfigError::TooManyAgents {
                requested: config.num_agents,
                available,
            });
        }

        Ok(layout)
    }

    /// Total number of grid columns, border included.
    #[must_use]
    pub const fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Total number of grid rows, border included.
    #[must_use]
    pub const fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Width of the open path ringing the planted region.
    #[must_use]
    pub const fn border(&self) -> u32 {
        self.border
    }

    /// Cell occupied by the silo: the top-right corner of the border path.
    #[must_use]
    pub const fn silo_cell(&self) -> CellCoord {
        CellCoord::new(self.grid_width - 1, 0)
    }

    /// Reports whether the cell lies inside the planted region.
    #[must_use]
    pub fn is_planted(&self, cell: CellCoord) -> bool {
        cell.column() >= self.border
            && cell.column() < self.border + self.plant_width
            && cell.row() >= self.border
            && cell.row() < self.border + self.plant_height
    }

    /// Enumerates the planted cells in row-major order.
    pub fn plant_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.border..self.border + self.plant_width;
        (self.border..self.border + self.plant_height)
            .flat_map(move |row| columns.clone().map(move |column| CellCoord::new(column, row)))
    }

    /// Enumerates the border path cells in row-major order.
    #[must_use]
    pub fn border_cells(&self) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        for row in 0..self.grid_height {
            for column in 0..self.grid_width {
                let cell = CellCoord::new(column, row);
                if !self.is_planted(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Number of border path cells available for agent placement.
    #[must_use]
    pub fn border_cell_count(&self) -> u32 {
        let total = u64::from(self.grid_width) * u64::from(self.grid_height);
        let planted = u64::from(self.plant_width) * u64::from(self.plant_height);
        u32::try_from(total - planted).unwrap_or(u32::MAX)
    }
}
