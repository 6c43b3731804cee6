//! End-to-end runs from grid text and instruction text to the action log.

use courier_world_core::{
    Cell, Direction, KeyColor,
    config::SimulationConfig,
    engine::{Diagnostic, OutputFact, Simulation, simulate},
    instruction::Instruction,
    parse::{load_grid, load_instructions, parse_grid, parse_instructions},
};
use pretty_assertions::assert_eq;

#[test]
fn key_behind_a_wall_cannot_be_fetched() {
    let world = parse_grid("m . W r h").unwrap();
    let mut sim = Simulation::new(&world, SimulationConfig::default());
    let mut log = Vec::new();
    sim.run(&[Instruction::RequestKey { color: KeyColor::Red }], &mut log);

    assert_eq!(
        log,
        vec![
            OutputFact::AgentStart { cell: Cell::new(0, 0) },
            OutputFact::Diagnostic(Diagnostic::NoPath {
                from: Cell::new(0, 0),
                to: Cell::new(0, 3),
            }),
        ]
    );
    assert_eq!(sim.agent_position(), Cell::new(0, 0));
    assert!(sim.keys().is_empty());
}

#[test]
fn human_stepping_off_the_grid_stays_put() {
    let world = parse_grid("m . h").unwrap();
    let mut sim = Simulation::new(&world, SimulationConfig::default());
    let mut log = Vec::new();
    sim.run(&parse_instructions("Move RIGHT"), &mut log);

    assert_eq!(sim.human_position(), Cell::new(0, 2));
    assert_eq!(log, vec![OutputFact::AgentStart { cell: Cell::new(0, 0) }]);
}

#[test]
fn key_is_fetched_and_delivered() {
    let world = parse_grid("m r h").unwrap();
    let mut sim = Simulation::new(&world, SimulationConfig::default());
    let mut log = Vec::new();
    sim.run(&[Instruction::RequestKey { color: KeyColor::Red }], &mut log);

    assert_eq!(
        log,
        vec![
            OutputFact::AgentStart { cell: Cell::new(0, 0) },
            OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 1) },
            OutputFact::KeyPickedUp { color: KeyColor::Red },
            OutputFact::LocateHuman { cell: Cell::new(0, 2) },
            OutputFact::MoveToHuman,
            OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 2) },
            OutputFact::KeyDropped { color: KeyColor::Red },
        ]
    );
    assert!(sim.keys().is_empty());
    assert_eq!(sim.agent_position(), sim.human_position());
}

#[test]
fn unlock_twice_reports_the_missing_key() {
    let world = parse_grid("m . h").unwrap();
    let log = simulate(
        &world,
        SimulationConfig::default(),
        &parse_instructions("Pick_up_RED_key\nUnlock_RED_door\nUnlock_RED_door"),
    );
    assert_eq!(
        log.last(),
        Some(&OutputFact::Diagnostic(Diagnostic::UnlockWithoutKey {
            color: KeyColor::Red
        }))
    );
}

#[test]
fn script_from_files_produces_the_expected_log() {
    let data = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
    let world = load_grid(format!("{data}/1_grid.txt")).unwrap();
    let script = load_instructions(format!("{data}/1_human.txt")).unwrap();
    let rendered: Vec<String> = simulate(&world, SimulationConfig::default(), &script)
        .iter()
        .map(ToString::to_string)
        .collect();

    let expected = std::fs::read_to_string(format!("{data}/1_result.txt")).unwrap();
    let expected: Vec<&str> = expected.lines().collect();
    assert_eq!(rendered, expected);
}

#[test]
fn simulation_continues_after_every_kind_of_failure() {
    let world = parse_grid("m . W b\n. . W h").unwrap();
    let script = parse_instructions(
        "Instruction: Pick up GREEN key\n\
         Instruction: Pick up BLUE key\n\
         Unlock_YELLOW_door\n\
         Flap arms\n\
         Move UP",
    );
    let log = simulate(&world, SimulationConfig::default(), &script);
    assert_eq!(
        log,
        vec![
            OutputFact::AgentStart { cell: Cell::new(0, 0) },
            OutputFact::Diagnostic(Diagnostic::KeyNotFound { color: KeyColor::Green }),
            OutputFact::Diagnostic(Diagnostic::NoPath {
                from: Cell::new(0, 0),
                to: Cell::new(0, 3),
            }),
            OutputFact::Diagnostic(Diagnostic::UnlockWithoutKey { color: KeyColor::Yellow }),
            OutputFact::HumanMoved { cell: Cell::new(0, 3) },
        ]
    );
}
