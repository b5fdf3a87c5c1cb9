use farmhand_core::{
    AgentId, AgentSnapshot, AgentView, CellCoord, Command, Event, PlantSnapshot, PlantView,
    SimulationConfig, Task,
};
use farmhand_system_tasking::{Config, Tasking};
use farmhand_world::{self as world, query, FarmWorld};

fn idle_agent(id: u32) -> AgentSnapshot {
    AgentSnapshot {
        id: AgentId::new(id),
        cell: CellCoord::new(0, 0),
        task: Task::Idle,
        water_level: 10,
        fuel_level: 10,
        wheat_level: 0,
    }
}

fn thirsty_plant(cell: CellCoord) -> PlantSnapshot {
    PlantSnapshot {
        cell,
        maturity: 0,
        watered: false,
        harvested: false,
    }
}

#[test]
fn first_plant_in_scan_order_wins() {
    let tasking = Tasking::new(Config::new(5, 5));
    let plant_a = CellCoord::new(1, 1);
    let plant_b = CellCoord::new(2, 1);
    let agents = AgentView::from_snapshots(vec![idle_agent(0), idle_agent(1)]);
    let plants = PlantView::from_snapshots(vec![thirsty_plant(plant_b), thirsty_plant(plant_a)]);

    let mut out = Vec::new();
    tasking.handle(
        &[Event::StepStarted { step_index: 0 }],
        &agents,
        &plants,
        CellCoord::new(3, 0),
        &mut out,
    );

    // Both idle agents are pointed at the first plant in row-major order;
    // arrival order later decides which one actually waters it.
    assert_eq!(
        out,
        vec![
            Command::AssignTask {
                agent: AgentId::new(0),
                task: Task::Watering { target: plant_a },
            },
            Command::AssignTask {
                agent: AgentId::new(1),
                task: Task::Watering { target: plant_a },
            },
        ]
    );
}

#[test]
fn assignments_flow_into_the_world() {
    let mut farm = FarmWorld::new();
    let mut events = Vec::new();
    world::apply(
        &mut farm,
        Command::ConfigureFarm {
            config: SimulationConfig {
                plant_grid_width: 2,
                plant_grid_height: 2,
                path_border_width: 1,
                num_agents: 2,
                ..SimulationConfig::default()
            },
        },
        &mut events,
    );

    let config = query::config(&farm).clone();
    let tasking = Tasking::new(Config::new(config.wheat_capacity, config.maturity_threshold));

    events.clear();
    world::apply(&mut farm, Command::GrowPlants, &mut events);

    let mut commands = Vec::new();
    tasking.handle(
        &events,
        &query::agent_view(&farm),
        &query::plant_view(&farm),
        query::silo_cell(&farm),
        &mut commands,
    );

    assert_eq!(commands.len(), 2, "both idle agents receive work");
    for command in &commands {
        assert!(matches!(
            command,
            Command::AssignTask {
                task: Task::Watering { .. },
                ..
            }
        ));
    }

    let mut follow_up = Vec::new();
    for command in commands {
        world::apply(&mut farm, command, &mut follow_up);
    }
    assert!(follow_up
        .iter()
        .all(|event| matches!(event, Event::TaskAssigned { .. })));
    for agent in query::agent_view(&farm).iter() {
        assert!(!agent.task.is_idle());
    }
}

#[test]
fn exhausted_farm_leaves_agents_idle() {
    let tasking = Tasking::new(Config::new(5, 5));
    let agents = AgentView::from_snapshots(vec![idle_agent(0)]);
    // Every plant harvested: no watering or harvesting candidates remain.
    let plants = PlantView::from_snapshots(vec![PlantSnapshot {
        cell: CellCoord::new(1, 1),
        maturity: 5,
        watered: false,
        harvested: true,
    }]);

    let mut out = Vec::new();
    tasking.handle(
        &[Event::StepStarted { step_index: 3 }],
        &agents,
        &plants,
        CellCoord::new(3, 0),
        &mut out,
    );

    assert!(out.is_empty());
}
