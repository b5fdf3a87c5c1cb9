#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Farmhand simulation headlessly.

use std::{
    fs,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use farmhand_core::{Event, SimulationConfig, StepSnapshot, Task};
use farmhand_scheduler::{Scheduler, StepReport};
use tracing_subscriber::EnvFilter;

/// Granularity of the wall-clock poll while pacing in real time.
const REALTIME_POLL: Duration = Duration::from_millis(10);

/// Headless runner for the Farmhand simulation.
#[derive(Debug, Parser)]
#[command(name = "farmhand", version, about)]
struct Options {
    /// Path to a TOML file with simulation parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of planted columns in the inner region.
    #[arg(long)]
    plant_grid_width: Option<u32>,

    /// Number of planted rows in the inner region.
    #[arg(long)]
    plant_grid_height: Option<u32>,

    /// Width of the open path ringing the planted region, in cells.
    #[arg(long)]
    path_border_width: Option<u32>,

    /// Number of tractor agents working the farm.
    #[arg(long)]
    num_agents: Option<u32>,

    /// Water units each agent starts with.
    #[arg(long)]
    water_capacity: Option<u32>,

    /// Fuel units each agent starts with.
    #[arg(long)]
    fuel_capacity: Option<u32>,

    /// Wheat units an agent can carry before it must deposit.
    #[arg(long)]
    wheat_capacity: Option<u32>,

    /// Number of steps to simulate.
    #[arg(long)]
    total_steps: Option<u64>,

    /// Steps fired per second when pacing in real time.
    #[arg(long)]
    steps_per_second: Option<f32>,

    /// Maturity level at which plants become harvestable.
    #[arg(long)]
    maturity_threshold: Option<u32>,

    /// Seed for the deterministic agent placement shuffle.
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Enables diagonal movement in the pathfinder.
    #[arg(long)]
    diagonal: bool,

    /// Paces steps against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Suppresses the per-step report lines.
    #[arg(long)]
    quiet: bool,
}

impl Options {
    /// Resolves the effective configuration: file values first, then
    /// explicit flag overrides on top.
    fn resolve_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => SimulationConfig::default(),
        };

        if let Some(value) = self.plant_grid_width {
            config.plant_grid_width = value;
        }
        if let Some(value) = self.plant_grid_height {
            config.plant_grid_height = value;
        }
        if let Some(value) = self.path_border_width {
            config.path_border_width = value;
        }
        if let Some(value) = self.num_agents {
            config.num_agents = value;
        }
        if let Some(value) = self.water_capacity {
            config.water_capacity = value;
        }
        if let Some(value) = self.fuel_capacity {
            config.fuel_capacity = value;
        }
        if let Some(value) = self.wheat_capacity {
            config.wheat_capacity = value;
        }
        if let Some(value) = self.total_steps {
            config.total_steps = value;
        }
        if let Some(value) = self.steps_per_second {
            config.steps_per_second = value;
        }
        if let Some(value) = self.maturity_threshold {
            config.maturity_threshold = value;
        }
        if let Some(value) = self.rng_seed {
            config.rng_seed = value;
        }
        if self.diagonal {
            config.diagonal_movement = true;
        }

        Ok(config)
    }
}

/// Entry point for the Farmhand command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = Options::parse();
    let config = options.resolve_config()?;
    let mut scheduler = Scheduler::new(config).context("initializing simulation")?;

    for event in scheduler.initialization() {
        if let Event::SimulationInitialized { agents, plants } = event {
            println!("simulation initialized: {agents} agents, {plants} plants");
        }
    }

    if options.realtime {
        run_realtime(&mut scheduler, options.quiet);
    } else {
        run_flat_out(&mut scheduler, options.quiet);
    }

    print_summary(&scheduler.snapshot(), scheduler.steps_executed());
    Ok(())
}

fn run_flat_out(scheduler: &mut Scheduler, quiet: bool) {
    while !scheduler.is_finished() {
        let report = scheduler.step();
        if !quiet {
            print_report(&report);
        }
    }
}

fn run_realtime(scheduler: &mut Scheduler, quiet: bool) {
    let mut last = Instant::now();
    while !scheduler.is_finished() {
        let now = Instant::now();
        let dt = now.duration_since(last);
        last = now;

        for report in scheduler.advance(dt) {
            if !quiet {
                print_report(&report);
            }
        }
        thread::sleep(REALTIME_POLL);
    }
}

fn print_report(report: &StepReport) {
    let snapshot = &report.snapshot;
    let mut line = format!(
        "step {:>4} | silo {:>3}",
        snapshot.step_index, snapshot.silo_total
    );
    for agent in &snapshot.agents {
        line.push_str(&format!(
            " | #{} ({},{}) {} w{} f{} c{}",
            agent.id.get(),
            agent.cell.column(),
            agent.cell.row(),
            task_label(agent.task),
            agent.water_level,
            agent.fuel_level,
            agent.wheat_level,
        ));
    }
    println!("{line}");
}

fn print_summary(snapshot: &StepSnapshot, steps: u64) {
    let harvested = snapshot
        .plants
        .iter()
        .filter(|plant| plant.harvested)
        .count();
    println!(
        "finished after {steps} steps: {} wheat in the silo, {harvested}/{} plants harvested",
        snapshot.silo_total,
        snapshot.plants.len(),
    );
    for agent in &snapshot.agents {
        println!(
            "  agent #{}: at ({},{}), {}, water {}, fuel {}, cargo {}",
            agent.id.get(),
            agent.cell.column(),
            agent.cell.row(),
            task_label(agent.task),
            agent.water_level,
            agent.fuel_level,
            agent.wheat_level,
        );
    }
}

const fn task_label(task: Task) -> &'static str {
    match task {
        Task::Idle => "idle",
        Task::Watering { .. } => "watering",
        Task::Harvesting { .. } => "harvesting",
        Task::Depositing { .. } => "depositing",
    }
}
