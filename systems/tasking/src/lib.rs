#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic priority policy that assigns tasks to idle agents.

use farmhand_core::{AgentSnapshot, AgentView, CellCoord, Command, Event, PlantView, Task};

/// Configuration parameters required to construct the tasking system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    wheat_capacity: u32,
    maturity_threshold: u32,
}

impl Config {
    /// Creates a new configuration from the relevant capacity thresholds.
    #[must_use]
    pub const fn new(wheat_capacity: u32, maturity_threshold: u32) -> Self {
        Self {
            wheat_capacity,
            maturity_threshold,
        }
    }
}

/// Pure system that emits task assignments in strict priority order.
///
/// The policy is evaluated once per idle agent per step, independently: two
/// agents may be sent toward the same plant within one step. Arrival order
/// decides which of them acts; the loser's terminal action resolves as a
/// no-op in the world. Destination reservations are deliberately not
/// consulted here.
#[derive(Debug)]
pub struct Tasking {
    wheat_capacity: u32,
    maturity_threshold: u32,
}

impl Tasking {
    /// Creates a new tasking system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            wheat_capacity: config.wheat_capacity,
            maturity_threshold: config.maturity_threshold,
        }
    }

    /// Consumes events and immutable views to emit assignment commands.
    ///
    /// Assignments are only produced when a step actually started; agents are
    /// visited in ascending id order and plants scanned in row-major order,
    /// so the emitted command batch is reproducible.
    pub fn handle(
        &self,
        events: &[Event],
        agents: &AgentView,
        plants: &PlantView,
        silo_cell: CellCoord,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::StepStarted { .. }))
        {
            return;
        }

        for agent in agents.iter() {
            if !agent.task.is_idle() {
                continue;
            }

            if let Some(task) = self.select_task(agent, plants, silo_cell) {
                out.push(Command::AssignTask {
                    agent: agent.id,
                    task,
                });
            }
        }
    }

    /// Applies the priority ladder to a single idle agent.
    fn select_task(
        &self,
        agent: &AgentSnapshot,
        plants: &PlantView,
        silo_cell: CellCoord,
    ) -> Option<Task> {
        if agent.fuel_level == 0 {
            return None;
        }

        if agent.wheat_level >= self.wheat_capacity {
            return Some(Task::Depositing { target: silo_cell });
        }

        let thirsty = plants
            .iter()
            .find(|plant| plant.needs_water(self.maturity_threshold));
        if let Some(plant) = thirsty {
            if agent.water_level > 0 {
                return Some(Task::Watering { target: plant.cell });
            }
        }

        let ready = plants
            .iter()
            .find(|plant| plant.is_ready_for_harvest(self.maturity_threshold));
        if let Some(plant) = ready {
            if agent.wheat_level < self.wheat_capacity {
                return Some(Task::Harvesting { target: plant.cell });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmhand_core::{AgentId, PlantSnapshot};

    fn idle_agent(id: u32, water: u32, fuel: u32, wheat: u32) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            cell: CellCoord::new(0, 0),
            task: Task::Idle,
            water_level: water,
            fuel_level: fuel,
            wheat_level: wheat,
        }
    }

    fn plant(cell: CellCoord, maturity: u32, watered: bool) -> PlantSnapshot {
        PlantSnapshot {
            cell,
            maturity,
            watered,
            harvested: false,
        }
    }

    #[test]
    fn no_commands_without_a_step_event() {
        let tasking = Tasking::new(Config::new(5, 5));
        let agents = AgentView::from_snapshots(vec![idle_agent(0, 5, 5, 0)]);
        let plants = PlantView::from_snapshots(vec![plant(CellCoord::new(1, 1), 0, false)]);

        let mut out = Vec::new();
        tasking.handle(&[], &agents, &plants, CellCoord::new(3, 0), &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn depositing_outranks_watering() {
        let tasking = Tasking::new(Config::new(2, 5));
        let agents = AgentView::from_snapshots(vec![idle_agent(0, 5, 5, 2)]);
        let plants = PlantView::from_snapshots(vec![plant(CellCoord::new(1, 1), 0, false)]);
        let silo = CellCoord::new(3, 0);

        let mut out = Vec::new();
        tasking.handle(
            &[Event::StepStarted { step_index: 0 }],
            &agents,
            &plants,
            silo,
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::AssignTask {
                agent: AgentId::new(0),
                task: Task::Depositing { target: silo },
            }]
        );
    }

    #[test]
    fn dry_agents_skip_watering_and_harvest_instead() {
        let tasking = Tasking::new(Config::new(5, 5));
        let agents = AgentView::from_snapshots(vec![idle_agent(0, 0, 5, 0)]);
        let plants = PlantView::from_snapshots(vec![
            plant(CellCoord::new(1, 1), 0, false),
            plant(CellCoord::new(2, 1), 5, false),
        ]);

        let mut out = Vec::new();
        tasking.handle(
            &[Event::StepStarted { step_index: 0 }],
            &agents,
            &plants,
            CellCoord::new(3, 0),
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::AssignTask {
                agent: AgentId::new(0),
                task: Task::Harvesting {
                    target: CellCoord::new(2, 1),
                },
            }]
        );
    }

    #[test]
    fn out_of_fuel_agents_stay_idle() {
        let tasking = Tasking::new(Config::new(5, 5));
        let agents = AgentView::from_snapshots(vec![idle_agent(0, 5, 0, 5)]);
        let plants = PlantView::from_snapshots(vec![plant(CellCoord::new(1, 1), 0, false)]);

        let mut out = Vec::new();
        tasking.handle(
            &[Event::StepStarted { step_index: 0 }],
            &agents,
            &plants,
            CellCoord::new(3, 0),
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn busy_agents_are_not_reassigned() {
        let tasking = Tasking::new(Config::new(5, 5));
        let mut busy = idle_agent(0, 5, 5, 0);
        busy.task = Task::Watering {
            target: CellCoord::new(1, 1),
        };
        let agents = AgentView::from_snapshots(vec![busy]);
        let plants = PlantView::from_snapshots(vec![plant(CellCoord::new(1, 1), 0, false)]);

        let mut out = Vec::new();
        tasking.handle(
            &[Event::StepStarted { step_index: 0 }],
            &agents,
            &plants,
            CellCoord::new(3, 0),
            &mut out,
        );

        assert!(out.is_empty());
    }
}
