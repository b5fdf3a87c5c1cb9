#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative farm state management for Farmhand.
//!
//! The world owns every entity of the simulation (grid, plants, silo,
//! agents, and the destination reservations shared between them) and
//! mutates deterministically through [`apply`]. All reads go through the
//! [`query`] module, which exposes immutable snapshots and views.

pub mod crops;
pub mod grid;
pub mod pathfinding;

use std::collections::BTreeSet;

use farmhand_core::{
    AgentId, CellCoord, Command, Event, RejectReason, SimulationConfig, Task, TaskOutcome,
};
use glam::Vec2;

use crate::crops::{Plant, Silo};
use crate::grid::GridMap;
use crate::pathfinding::PathFinder;

/// Cells traveled per advance increment.
const MOVE_SPEED_CELLS: f32 = 1.0;
/// Fraction of a cell within which a waypoint counts as reached.
const WAYPOINT_TOLERANCE: f32 = 0.1;

/// Represents the authoritative Farmhand world state.
#[derive(Debug)]
pub struct FarmWorld {
    config: SimulationConfig,
    grid: GridMap,
    pathfinder: PathFinder,
    plants: Vec<Plant>,
    silo: Silo,
    agents: Vec<Agent>,
    reservations: OccupancyTracker,
    step_index: u64,
}

impl FarmWorld {
    /// Creates a new farm world from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        let config = SimulationConfig::default();
        let mut world = Self {
            grid: GridMap::open(1, 1, 1.0),
            pathfinder: PathFinder::new(),
            plants: Vec::new(),
            silo: Silo::at(CellCoord::new(0, 0)),
            agents: Vec::new(),
            reservations: OccupancyTracker::new(),
            step_index: 0,
            config,
        };
        let mut events = Vec::new();
        world.rebuild(SimulationConfig::default(), |_| false, &mut events);
        world
    }

    fn rebuild<F>(&mut self, config: SimulationConfig, is_blocked: F, out_events: &mut Vec<Event>)
    where
        F: FnMut(CellCoord) -> bool,
    {
        let layout = match config.validate() {
            Ok(layout) => layout,
            Err(error) => {
                tracing::warn!(%error, "rejected farm configuration");
                return;
            }
        };

        self.grid = GridMap::generate(
            layout.grid_width(),
            layout.grid_height(),
            config.cell_size,
            is_blocked,
        );
        self.pathfinder = if config.diagonal_movement {
            PathFinder::with_diagonals()
        } else {
            PathFinder::new()
        };
        self.plants = layout.plant_cells().map(Plant::seeded_at).collect();
        self.silo = Silo::at(layout.silo_cell());
        self.agents = place_agents(&config, &layout.border_cells(), &self.grid);
        self.reservations.clear();
        self.step_index = 0;
        self.config = config;

        out_events.push(Event::SimulationInitialized {
            agents: u32::try_from(self.agents.len()).unwrap_or(u32::MAX),
            plants: u32::try_from(self.plants.len()).unwrap_or(u32::MAX),
        });
    }

    fn grow_plants(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::StepStarted {
            step_index: self.step_index,
        });
        self.step_index = self.step_index.saturating_add(1);

        let threshold = self.config.maturity_threshold;
        for plant in &mut self.plants {
            if plant.grow(threshold) {
                out_events.push(Event::PlantGrew {
                    cell: plant.cell(),
                    maturity: plant.maturity(),
                });
            }
        }
    }

    fn assign_task(&mut self, agent_id: AgentId, task: Task, out_events: &mut Vec<Event>) {
        let Some(target) = task.target() else {
            out_events.push(Event::TaskRejected {
                agent: agent_id,
                task,
                reason: RejectReason::IdleTask,
            });
            return;
        };

        let Some(agent) = self.agents.iter_mut().find(|agent| agent.id == agent_id) else {
            out_events.push(Event::TaskRejected {
                agent: agent_id,
                task,
                reason: RejectReason::UnknownAgent,
            });
            return;
        };

        if !agent.task.is_idle() {
            out_events.push(Event::TaskRejected {
                agent: agent_id,
                task,
                reason: RejectReason::AgentBusy,
            });
            return;
        }

        if agent.fuel_level == 0 {
            out_events.push(Event::TaskRejected {
                agent: agent_id,
                task,
                reason: RejectReason::OutOfFuel,
            });
            return;
        }

        let path = if agent.cell == target {
            // Already standing on the target; the next advance phase performs
            // the terminal action without moving.
            Vec::new()
        } else {
            let path = self.pathfinder.find_path(&self.grid, agent.cell, target);
            if path.is_empty() {
                tracing::debug!(
                    agent = agent_id.get(),
                    ?task,
                    "no path to task target; agent stays idle"
                );
                out_events.push(Event::TaskRejected {
                    agent: agent_id,
                    task,
                    reason: RejectReason::Unreachable,
                });
                return;
            }
            path
        };

        agent.task = task;
        agent.path = path;
        agent.path_index = 0;
        let _ = self.reservations.reserve(target);
        out_events.push(Event::TaskAssigned {
            agent: agent_id,
            task,
        });
    }

    fn advance_agents(&mut self, out_events: &mut Vec<Event>) {
        let Self {
            agents,
            plants,
            silo,
            reservations,
            grid,
            config,
            ..
        } = self;

        for agent in agents.iter_mut() {
            if agent.task.is_idle() {
                continue;
            }
            if agent.fuel_level == 0 {
                // Frozen in place: the task, path, and reservation are all
                // retained until fuel is modeled externally.
                continue;
            }

            if agent.path_index < agent.path.len() {
                let waypoint = agent.path[agent.path_index];
                let target_pos = grid.to_world(waypoint);
                let step_length = grid.cell_size() * MOVE_SPEED_CELLS;
                let tolerance = grid.cell_size() * WAYPOINT_TOLERANCE;
                let delta = target_pos - agent.world_pos;
                let distance = delta.length();

                if distance <= step_length + tolerance {
                    let from = agent.cell;
                    agent.world_pos = target_pos;
                    agent.cell = waypoint;
                    agent.fuel_level = agent.fuel_level.saturating_sub(1);
                    agent.path_index += 1;
                    out_events.push(Event::AgentMoved {
                        agent: agent.id,
                        from,
                        to: waypoint,
                    });
                } else {
                    agent.world_pos += delta / distance * step_length;
                }
            }

            if agent.path_index >= agent.path.len() {
                let task = agent.task;
                let outcome = perform_task(agent, plants, silo, config);
                if let Some(target) = task.target() {
                    let _ = reservations.release(target);
                }
                agent.task = Task::Idle;
                agent.path.clear();
                agent.path_index = 0;
                out_events.push(Event::TaskCompleted {
                    agent: agent.id,
                    task,
                    outcome,
                });
            }
        }
    }
}

impl Default for FarmWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut FarmWorld, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureFarm { config } => world.rebuild(config, |_| false, out_events),
        Command::GrowPlants => world.grow_plants(out_events),
        Command::AssignTask { agent, task } => world.assign_task(agent, task, out_events),
        Command::AdvanceAgents => world.advance_agents(out_events),
    }
}

/// Resolves an arrived agent's terminal action against the farm entities.
///
/// A stale precondition, such as a plant already watered or harvested by a
/// faster agent, resolves as a silent no-op recorded in the returned
/// outcome.
fn perform_task(
    agent: &mut Agent,
    plants: &mut [Plant],
    silo: &mut Silo,
    config: &SimulationConfig,
) -> TaskOutcome {
    match agent.task {
        Task::Idle => TaskOutcome::Skipped,
        Task::Watering { .. } => {
            let threshold = config.maturity_threshold;
            match plant_at_mut(plants, agent.cell) {
                Some(plant) if plant.needs_water(threshold) && agent.water_level > 0 => {
                    plant.water();
                    agent.water_level -= 1;
                    TaskOutcome::Watered
                }
                _ => TaskOutcome::Skipped,
            }
        }
        Task::Harvesting { .. } => {
            let threshold = config.maturity_threshold;
            match plant_at_mut(plants, agent.cell) {
                Some(plant)
                    if plant.is_ready_for_harvest(threshold)
                        && agent.wheat_level < config.wheat_capacity =>
                {
                    plant.harvest();
                    agent.wheat_level += 1;
                    TaskOutcome::Harvested
                }
                _ => TaskOutcome::Skipped,
            }
        }
        Task::Depositing { .. } => {
            let amount = agent.wheat_level;
            silo.deposit(amount);
            agent.wheat_level = 0;
            TaskOutcome::Deposited { amount }
        }
    }
}

/// First unharvested plant occupying the cell, if any.
fn plant_at_mut(plants: &mut [Plant], cell: CellCoord) -> Option<&mut Plant> {
    plants
        .iter_mut()
        .find(|plant| plant.cell() == cell && !plant.is_harvested())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use farmhand_core::{
        AgentSnapshot, AgentView, CellCoord, PlantView, SimulationConfig, StepSnapshot,
    };

    use super::FarmWorld;
    use crate::grid::GridMap;

    /// Captures a read-only view of the agents working the farm.
    #[must_use]
    pub fn agent_view(world: &FarmWorld) -> AgentView {
        AgentView::from_snapshots(world.agents.iter().map(super::Agent::snapshot).collect())
    }

    /// Captures a read-only view of the plants in row-major order.
    #[must_use]
    pub fn plant_view(world: &FarmWorld) -> PlantView {
        PlantView::from_snapshots(world.plants.iter().map(super::Plant::snapshot).collect())
    }

    /// Cell occupied by the silo.
    #[must_use]
    pub fn silo_cell(world: &FarmWorld) -> CellCoord {
        world.silo.cell()
    }

    /// Total wheat units accumulated by the silo.
    #[must_use]
    pub fn silo_total(world: &FarmWorld) -> u64 {
        world.silo.total_deposited()
    }

    /// Provides read-only access to the walkability grid.
    #[must_use]
    pub fn grid(world: &FarmWorld) -> &GridMap {
        &world.grid
    }

    /// Provides read-only access to the active configuration.
    #[must_use]
    pub fn config(world: &FarmWorld) -> &SimulationConfig {
        &world.config
    }

    /// Destination cells currently reserved by agents, in ascending order.
    #[must_use]
    pub fn reserved_cells(world: &FarmWorld) -> Vec<CellCoord> {
        world.reservations.cells()
    }

    /// Captures the per-step snapshot exposed to rendering and reporting
    /// collaborators.
    #[must_use]
    pub fn step_snapshot(world: &FarmWorld) -> StepSnapshot {
        let agents: Vec<AgentSnapshot> = world.agents.iter().map(super::Agent::snapshot).collect();
        StepSnapshot {
            step_index: world.step_index.saturating_sub(1),
            agents,
            plants: world.plants.iter().map(super::Plant::snapshot).collect(),
            silo_total: world.silo.total_deposited(),
        }
    }
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    cell: CellCoord,
    world_pos: Vec2,
    task: Task,
    path: Vec<CellCoord>,
    path_index: usize,
    water_level: u32,
    fuel_level: u32,
    wheat_level: u32,
}

impl Agent {
    fn placed_at(id: AgentId, cell: CellCoord, grid: &GridMap, config: &SimulationConfig) -> Self {
        Self {
            id,
            cell,
            world_pos: grid.to_world(cell),
            task: Task::Idle,
            path: Vec::new(),
            path_index: 0,
            water_level: config.water_capacity,
            fuel_level: config.fuel_capacity,
            wheat_level: 0,
        }
    }

    fn snapshot(&self) -> farmhand_core::AgentSnapshot {
        farmhand_core::AgentSnapshot {
            id: self.id,
            cell: self.cell,
            task: self.task,
            water_level: self.water_level,
            fuel_level: self.fuel_level,
            wheat_level: self.wheat_level,
        }
    }
}

/// Set of grid cells currently reserved as task destinations.
///
/// Each agent owns the reservation for its task target from path acceptance
/// until completion or abandonment. Only destinations are tracked;
/// intermediate path cells stay unreserved, so two agents may traverse the
/// same cell mid-route.
#[derive(Clone, Debug)]
struct OccupancyTracker {
    cells: BTreeSet<CellCoord>,
}

impl OccupancyTracker {
    fn new() -> Self {
        Self {
            cells: BTreeSet::new(),
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
    }

    fn reserve(&mut self, cell: CellCoord) -> bool {
        self.cells.insert(cell)
    }

    fn release(&mut self, cell: CellCoord) -> bool {
        self.cells.remove(&cell)
    }

    fn cells(&self) -> Vec<CellCoord> {
        self.cells.iter().copied().collect()
    }
}

fn place_agents(config: &SimulationConfig, border_cells: &[CellCoord], grid: &GridMap) -> Vec<Agent> {
    let mut cells: Vec<CellCoord> = border_cells.to_vec();

    let mut rng_state = config.rng_seed;
    for index in (1..cells.len()).rev() {
        rng_state = next_random(rng_state);
        let swap_index = (rng_state % (index as u64 + 1)) as usize;
        cells.swap(index, swap_index);
    }

    let count = usize::try_from(config.num_agents).unwrap_or(0);
    cells
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(index, cell)| {
            let id = AgentId::new(u32::try_from(index).unwrap_or(u32::MAX));
            Agent::placed_at(id, cell, grid, config)
        })
        .collect()
}

fn next_random(state: u64) -> u64 {
    state.wrapping_mul(636_413_622_384_679_3005).wrapping_add(1)
}

/// Direct state manipulation for scenario tests.
///
/// Everything here bypasses the command surface; it exists so integration
/// tests can pin down edge cases (ready plants, drained tanks, custom
/// obstacle layouts) without replaying hundreds of steps.
#[cfg(feature = "farm_scaffolding")]
pub mod scaffolding {
    use farmhand_core::{AgentId, CellCoord, Event, SimulationConfig};

    use super::{Agent, FarmWorld};

    /// Rebuilds the farm with a custom obstacle predicate.
    pub fn configure_with_obstacles<F>(
        world: &mut FarmWorld,
        config: SimulationConfig,
        is_blocked: F,
        out_events: &mut Vec<Event>,
    ) where
        F: FnMut(CellCoord) -> bool,
    {
        world.rebuild(config, is_blocked, out_events);
    }

    /// Seeds an additional plant directly on the provided cell.
    pub fn place_plant(world: &mut FarmWorld, cell: CellCoord, maturity: u32, watered: bool) {
        let mut plant = super::Plant::seeded_at(cell);
        plant.set_growth(maturity, watered);
        world.plants.push(plant);
    }

    /// Removes every plant from the farm.
    pub fn clear_plants(world: &mut FarmWorld) {
        world.plants.clear();
    }

    /// Removes every agent from the farm.
    pub fn clear_agents(world: &mut FarmWorld) {
        world.agents.clear();
    }

    /// Places an additional agent directly on the provided cell.
    pub fn place_agent(world: &mut FarmWorld, cell: CellCoord, fuel_level: u32) -> AgentId {
        let id = AgentId::new(u32::try_from(world.agents.len()).unwrap_or(u32::MAX));
        let mut agent = Agent::placed_at(id, cell, &world.grid, &world.config);
        agent.fuel_level = fuel_level;
        world.agents.push(agent);
        id
    }

    /// Overwrites an agent's carried wheat.
    pub fn set_agent_wheat(world: &mut FarmWorld, agent: AgentId, wheat_level: u32) {
        if let Some(agent) = world.agents.iter_mut().find(|entry| entry.id == agent) {
            agent.wheat_level = wheat_level;
        }
    }
}
