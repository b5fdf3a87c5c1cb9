#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step driver that executes the farm simulation phases in order.
//!
//! Each step runs the load-bearing phase sequence (plant growth, then task
//! assignment, then agent advancement) and then captures the snapshot exposed to
//! rendering and reporting collaborators. Completion events are drained into
//! the returned [`StepReport`] at a fixed point, so observers see them in the
//! order the world produced them.

use std::time::Duration;

use farmhand_core::{
    AgentId, Command, ConfigError, Event, SimulationConfig, StepSnapshot, Task, TaskOutcome,
};
use farmhand_system_tasking::{Config as TaskingConfig, Tasking};
use farmhand_world::{self as world, query, FarmWorld};

/// Everything observable about one executed simulation step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// State of the farm after the step completed.
    pub snapshot: StepSnapshot,
    /// Events emitted by the world during the step, in emission order.
    pub events: Vec<Event>,
}

impl StepReport {
    /// Iterator over the task completions that resolved during the step.
    pub fn completions(&self) -> impl Iterator<Item = (AgentId, Task, TaskOutcome)> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::TaskCompleted {
                agent,
                task,
                outcome,
            } => Some((*agent, *task, *outcome)),
            _ => None,
        })
    }
}

/// Converts accumulated real time into whole simulation steps.
///
/// A step fires whenever the accumulator crosses `1 / steps_per_second`;
/// leftover time carries into the next call, so pacing drifts by at most one
/// frame regardless of how irregular the caller's clock is.
#[derive(Clone, Debug)]
pub struct StepTimer {
    interval: Duration,
    accumulator: Duration,
}

impl StepTimer {
    /// Creates a timer firing at the provided rate.
    ///
    /// The rate must be positive and finite, as enforced by
    /// [`SimulationConfig::validate`].
    #[must_use]
    pub fn new(steps_per_second: f32) -> Self {
        debug_assert!(steps_per_second.is_finite() && steps_per_second > 0.0);
        Self {
            interval: Duration::from_secs_f32(1.0 / steps_per_second),
            accumulator: Duration::ZERO,
        }
    }

    /// Accumulates elapsed time and returns how many steps are due.
    pub fn advance(&mut self, dt: Duration) -> usize {
        self.accumulator = self.accumulator.saturating_add(dt);

        let mut due = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            due += 1;
        }
        due
    }
}

/// Fixed-step scheduler owning the farm world and its assignment policy.
#[derive(Debug)]
pub struct Scheduler {
    world: FarmWorld,
    tasking: Tasking,
    timer: StepTimer,
    total_steps: u64,
    steps_executed: u64,
    init_events: Vec<Event>,
}

impl Scheduler {
    /// Validates the configuration and builds a ready-to-run simulation.
    ///
    /// On success the initialization events, including
    /// [`Event::SimulationInitialized`], are retained and observable through
    /// [`Scheduler::initialization`] before the first step runs.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let mut farm = FarmWorld::new();
        let mut init_events = Vec::new();
        world::apply(
            &mut farm,
            Command::ConfigureFarm {
                config: config.clone(),
            },
            &mut init_events,
        );
        Self::with_world(config, farm, init_events)
    }

    /// Wraps an already-constructed world, validating the configuration.
    ///
    /// This is the seam for embedders that build worlds with custom obstacle
    /// layouts or pre-arranged entities; [`Scheduler::new`] is the common
    /// path.
    pub fn with_world(
        config: SimulationConfig,
        farm: FarmWorld,
        init_events: Vec<Event>,
    ) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        tracing::info!(
            grid_width = layout.grid_width(),
            grid_height = layout.grid_height(),
            agents = config.num_agents,
            total_steps = config.total_steps,
            "simulation initialized"
        );

        Ok(Self {
            world: farm,
            tasking: Tasking::new(TaskingConfig::new(
                config.wheat_capacity,
                config.maturity_threshold,
            )),
            timer: StepTimer::new(config.steps_per_second),
            total_steps: config.total_steps,
            steps_executed: 0,
            init_events,
        })
    }

    /// Events emitted while the farm was constructed, before the first step.
    #[must_use]
    pub fn initialization(&self) -> &[Event] {
        &self.init_events
    }

    /// Number of steps executed so far.
    #[must_use]
    pub const fn steps_executed(&self) -> u64 {
        self.steps_executed
    }

    /// Reports whether the configured step budget has been spent.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.steps_executed >= self.total_steps
    }

    /// Captures the current farm state without advancing the simulation.
    #[must_use]
    pub fn snapshot(&self) -> StepSnapshot {
        query::step_snapshot(&self.world)
    }

    /// Executes exactly one simulation step.
    ///
    /// Phase order is load-bearing: growth precedes assignment, assignment
    /// precedes advancement, and the snapshot is captured last. A failure
    /// inside one agent's logic surfaces as an event and never prevents the
    /// remaining phases from running.
    pub fn step(&mut self) -> StepReport {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::GrowPlants, &mut events);

        let mut commands = Vec::new();
        self.tasking.handle(
            &events,
            &query::agent_view(&self.world),
            &query::plant_view(&self.world),
            query::silo_cell(&self.world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        world::apply(&mut self.world, Command::AdvanceAgents, &mut events);

        self.steps_executed = self.steps_executed.saturating_add(1);

        for event in &events {
            if let Event::TaskCompleted {
                agent,
                task,
                outcome,
            } = event
            {
                tracing::debug!(agent = agent.get(), ?task, ?outcome, "task completed");
            }
        }

        StepReport {
            snapshot: query::step_snapshot(&self.world),
            events,
        }
    }

    /// Feeds elapsed real time to the step timer and executes every step
    /// that came due, stopping at the configured step budget.
    pub fn advance(&mut self, dt: Duration) -> Vec<StepReport> {
        let due = self.timer.advance(dt);
        let mut reports = Vec::new();
        for _ in 0..due {
            if self.is_finished() {
                break;
            }
            reports.push(self.step());
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_accumulates_partial_frames() {
        let mut timer = StepTimer::new(2.0);

        assert_eq!(timer.advance(Duration::from_millis(400)), 0);
        assert_eq!(timer.advance(Duration::from_millis(200)), 1);
        assert_eq!(timer.advance(Duration::from_millis(1600)), 3);
    }

    #[test]
    fn scheduler_rejects_malformed_configuration() {
        let config = SimulationConfig {
            plant_grid_width: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            Scheduler::new(config).err(),
            Some(ConfigError::EmptyPlantGrid)
        );
    }

    #[test]
    fn initialization_signal_precedes_the_first_step() {
        let scheduler = Scheduler::new(SimulationConfig::default()).expect("valid config");

        assert!(scheduler
            .initialization()
            .iter()
            .any(|event| matches!(event, Event::SimulationInitialized { .. })));
        assert_eq!(scheduler.steps_executed(), 0);
        assert!(!scheduler.is_finished());
    }

    #[test]
    fn advance_respects_the_step_budget() {
        let mut scheduler = Scheduler::new(SimulationConfig {
            total_steps: 3,
            ..SimulationConfig::default()
        })
        .expect("valid config");

        let reports = scheduler.advance(Duration::from_secs(60));
        assert_eq!(reports.len(), 3);
        assert!(scheduler.is_finished());
        assert!(scheduler.advance(Duration::from_secs(60)).is_empty());
    }
}
