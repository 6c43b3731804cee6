//! Drives the human's instruction script against the world, moving the agent
//! with the path finder and recording what happened as [`OutputFact`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Cell, Direction, KeyColor,
    config::{DeliveryPolicy, SimulationConfig},
    instruction::Instruction,
    keyring::{KeyRing, KeyRingError},
    pathfinding::{PathError, Step, find_path},
    world::GridWorld,
};

/// A recovered failure, reported in the log instead of halting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    NoPath { from: Cell, to: Cell },
    KeyNotFound { color: KeyColor },
    UnlockWithoutKey { color: KeyColor },
}

/// One entry of the action log, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum OutputFact {
    AgentStart { cell: Cell },
    HumanMoved { cell: Cell },
    AgentMoved { direction: Direction, cell: Cell },
    KeyPickedUp { color: KeyColor },
    LocateHuman { cell: Cell },
    MoveToHuman,
    KeyDropped { color: KeyColor },
    DoorUnlocked { color: KeyColor },
    Diagnostic(Diagnostic),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoPath { from, to } => write!(f, "No_path {from} -> {to}"),
            Diagnostic::KeyNotFound { color } => write!(f, "Key_not_found {color}"),
            Diagnostic::UnlockWithoutKey { color } => write!(f, "Cannot_unlock_{color}_door"),
        }
    }
}

impl fmt::Display for OutputFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFact::AgentStart { cell } => write!(f, "My_position {cell}"),
            OutputFact::HumanMoved { cell } => write!(f, "Human_position {cell}"),
            OutputFact::AgentMoved { direction, cell } => write!(f, "Move {direction} {cell}"),
            OutputFact::KeyPickedUp { color } => write!(f, "Pick_up_{color}_key"),
            OutputFact::LocateHuman { cell } => write!(f, "Locate_human: {cell}"),
            OutputFact::MoveToHuman => f.write_str("Move_to_Human:"),
            OutputFact::KeyDropped { color } => write!(f, "Drop_{color}_key"),
            OutputFact::DoorUnlocked { color } => write!(f, "Unlock_{color}_door"),
            OutputFact::Diagnostic(diagnostic) => diagnostic.fmt(f),
        }
    }
}

/// Destination for output facts. The engine never formats or writes anything
/// itself; it only hands facts over in order.
pub trait FactSink {
    fn record(&mut self, fact: OutputFact);
}

impl FactSink for Vec<OutputFact> {
    fn record(&mut self, fact: OutputFact) {
        self.push(fact);
    }
}

/// Failures raised while applying one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    NoPath(#[from] PathError),
    #[error("cannot unlock: {0}")]
    NotHeld(#[from] KeyRingError),
    #[error("no {0} key exists in this grid")]
    UnknownKey(KeyColor),
}

impl From<SimulationError> for Diagnostic {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::NoPath(PathError::NoPath { from, to }) => Diagnostic::NoPath { from, to },
            SimulationError::NotHeld(KeyRingError::NotHeld(color)) => {
                Diagnostic::UnlockWithoutKey { color }
            }
            SimulationError::UnknownKey(color) => Diagnostic::KeyNotFound { color },
        }
    }
}

/// Mutable simulation state over a shared, read-only [`GridWorld`].
#[derive(Debug, Clone)]
pub struct Simulation<'w> {
    world: &'w GridWorld,
    config: SimulationConfig,
    keys: KeyRing,
    agent: Cell,
    human: Cell,
}

impl<'w> Simulation<'w> {
    /// Places the agent and the human on their start cells with no keys held.
    pub fn new(world: &'w GridWorld, config: SimulationConfig) -> Self {
        Simulation {
            world,
            config,
            keys: KeyRing::new(),
            agent: world.agent_start(),
            human: world.human_start(),
        }
    }

    pub fn agent_position(&self) -> Cell {
        self.agent
    }

    pub fn human_position(&self) -> Cell {
        self.human
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Processes every instruction in order. The first fact recorded is
    /// always the agent's start cell.
    pub fn run<S: FactSink>(&mut self, instructions: &[Instruction], sink: &mut S) {
        sink.record(OutputFact::AgentStart { cell: self.agent });
        for (index, instruction) in instructions.iter().enumerate() {
            self.process_instruction(instruction, &instructions[index + 1..], sink);
        }
        debug!(
            agent = %self.agent,
            human = %self.human,
            held = ?self.keys,
            "instruction stream exhausted"
        );
    }

    /// Applies a single instruction. `upcoming` is the rest of the script and
    /// is only consulted by [`DeliveryPolicy::FollowScriptedMoves`].
    ///
    /// Failures are recovered here: they are logged and recorded as a
    /// [`Diagnostic`] fact, and the simulation carries on.
    #[tracing::instrument(level = "debug", skip(self, upcoming, sink))]
    pub fn process_instruction<S: FactSink>(
        &mut self,
        instruction: &Instruction,
        upcoming: &[Instruction],
        sink: &mut S,
    ) {
        if let Err(err) = self.apply(instruction, upcoming, sink) {
            warn!(%err, agent = %self.agent, "instruction could not be completed");
            sink.record(OutputFact::Diagnostic(err.into()));
        }
    }

    fn apply<S: FactSink>(
        &mut self,
        instruction: &Instruction,
        upcoming: &[Instruction],
        sink: &mut S,
    ) -> Result<(), SimulationError> {
        match *instruction {
            Instruction::Move { direction } => {
                match self.human_step(self.human, direction) {
                    Some(cell) => {
                        self.human = cell;
                        sink.record(OutputFact::HumanMoved { cell });
                    }
                    None => debug!(human = %self.human, %direction, "human move blocked"),
                }
                Ok(())
            }
            Instruction::RequestKey { color } => self.request_key(color, upcoming, sink),
            Instruction::PickUp { color } => {
                self.keys.add(color);
                sink.record(OutputFact::KeyPickedUp { color });
                Ok(())
            }
            Instruction::Unlock { color } => {
                self.keys.remove(color)?;
                debug!(doors = ?self.world.door_locations(color), %color, "door unlocked");
                sink.record(OutputFact::DoorUnlocked { color });
                Ok(())
            }
            Instruction::Unparsed { line, ref text } => {
                debug!(line, text = %text, "skipping unparsed instruction");
                Ok(())
            }
        }
    }

    /// Fetches the key (unless already held) and carries it to the human.
    fn request_key<S: FactSink>(
        &mut self,
        color: KeyColor,
        upcoming: &[Instruction],
        sink: &mut S,
    ) -> Result<(), SimulationError> {
        if self.keys.contains(color) && self.agent == self.human {
            self.keys.remove(color)?;
            sink.record(OutputFact::KeyDropped { color });
            return Ok(());
        }

        if !self.keys.contains(color) {
            let key_cell = self
                .world
                .key_location(color)
                .ok_or(SimulationError::UnknownKey(color))?;
            let to_key = find_path(self.world, &self.keys, self.agent, key_cell)?;
            self.walk(to_key, sink);
            self.keys.add(color);
            sink.record(OutputFact::KeyPickedUp { color });
        }

        // Planned with the key in hand, since it may open a door on the way.
        let target = self.delivery_target(upcoming);
        let to_human = find_path(self.world, &self.keys, self.agent, target)?;
        sink.record(OutputFact::LocateHuman { cell: target });
        sink.record(OutputFact::MoveToHuman);
        self.walk(to_human, sink);
        self.keys.remove(color)?;
        sink.record(OutputFact::KeyDropped { color });
        Ok(())
    }

    fn delivery_target(&self, upcoming: &[Instruction]) -> Cell {
        match self.config.delivery_policy {
            DeliveryPolicy::FreezeAtRequest => self.human,
            DeliveryPolicy::FollowScriptedMoves => upcoming
                .iter()
                .map_while(|instruction| match instruction {
                    Instruction::Move { direction } => Some(*direction),
                    _ => None,
                })
                .fold(self.human, |at, direction| {
                    self.human_step(at, direction).unwrap_or(at)
                }),
        }
    }

    /// Where a human move from `from` lands, or `None` if it is blocked.
    fn human_step(&self, from: Cell, direction: Direction) -> Option<Cell> {
        self.world
            .neighbor(from, direction)
            .filter(|cell| self.world.is_walkable(*cell))
    }

    fn walk<S: FactSink>(&mut self, path: Vec<Step>, sink: &mut S) {
        for Step { direction, cell } in path {
            sink.record(OutputFact::AgentMoved { direction, cell });
            self.agent = cell;
        }
    }
}

/// Runs a whole script from a fresh state and returns the collected log.
pub fn simulate(
    world: &GridWorld,
    config: SimulationConfig,
    instructions: &[Instruction],
) -> Vec<OutputFact> {
    let mut log = Vec::new();
    Simulation::new(world, config).run(instructions, &mut log);
    log
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse::parse_grid;

    fn moves(directions: &[Direction]) -> Vec<Instruction> {
        directions
            .iter()
            .map(|direction| Instruction::Move {
                direction: *direction,
            })
            .collect()
    }

    #[test]
    fn human_moves_are_absorbed_at_walls_and_edges() {
        let world = parse_grid("m h W\n. . .").unwrap();
        let mut sim = Simulation::new(&world, SimulationConfig::default());
        let mut log = Vec::new();
        sim.run(
            &moves(&[Direction::Right, Direction::Up, Direction::Down, Direction::Left]),
            &mut log,
        );
        assert_eq!(
            log,
            vec![
                OutputFact::AgentStart { cell: Cell::new(0, 0) },
                OutputFact::HumanMoved { cell: Cell::new(1, 1) },
                OutputFact::HumanMoved { cell: Cell::new(1, 0) },
            ]
        );
        assert_eq!(sim.human_position(), Cell::new(1, 0));
    }

    #[test]
    fn human_walks_through_doors() {
        let world = parse_grid("m h R .").unwrap();
        let log = simulate(&world, SimulationConfig::default(), &moves(&[Direction::Right]));
        assert_eq!(log[1], OutputFact::HumanMoved { cell: Cell::new(0, 2) });
    }

    #[test]
    fn unlock_consumes_the_key_once() {
        let world = parse_grid("m . h").unwrap();
        let script = [
            Instruction::PickUp { color: KeyColor::Red },
            Instruction::Unlock { color: KeyColor::Red },
            Instruction::Unlock { color: KeyColor::Red },
        ];
        let mut sim = Simulation::new(&world, SimulationConfig::default());
        let mut log = Vec::new();
        sim.run(&script, &mut log);
        assert_eq!(
            log[1..],
            [
                OutputFact::KeyPickedUp { color: KeyColor::Red },
                OutputFact::DoorUnlocked { color: KeyColor::Red },
                OutputFact::Diagnostic(Diagnostic::UnlockWithoutKey { color: KeyColor::Red }),
            ]
        );
        assert!(sim.keys().is_empty());
    }

    #[test]
    fn request_for_missing_key_is_reported() {
        let world = parse_grid("m . h").unwrap();
        let log = simulate(
            &world,
            SimulationConfig::default(),
            &[Instruction::RequestKey { color: KeyColor::Blue }],
        );
        assert_eq!(
            log[1],
            OutputFact::Diagnostic(Diagnostic::KeyNotFound { color: KeyColor::Blue })
        );
    }

    #[test]
    fn held_key_is_handed_over_in_place() {
        let world = parse_grid("m r h").unwrap();
        let mut sim = Simulation::new(&world, SimulationConfig::default());
        sim.human = sim.agent;
        sim.keys.add(KeyColor::Red);
        let mut log = Vec::new();
        sim.process_instruction(&Instruction::RequestKey { color: KeyColor::Red }, &[], &mut log);
        assert_eq!(log, vec![OutputFact::KeyDropped { color: KeyColor::Red }]);
        assert!(sim.keys().is_empty());
        assert_eq!(sim.agent_position(), Cell::new(0, 0));
    }

    #[test]
    fn held_key_away_from_human_skips_the_fetch_leg() {
        let world = parse_grid("m . h").unwrap();
        let script = [
            Instruction::PickUp { color: KeyColor::Green },
            Instruction::RequestKey { color: KeyColor::Green },
        ];
        let log = simulate(&world, SimulationConfig::default(), &script);
        assert_eq!(
            log[2..],
            [
                OutputFact::LocateHuman { cell: Cell::new(0, 2) },
                OutputFact::MoveToHuman,
                OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 1) },
                OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 2) },
                OutputFact::KeyDropped { color: KeyColor::Green },
            ]
        );
    }

    #[test]
    fn fetched_key_opens_the_door_to_the_human() {
        // The human sits behind a red door; the red key is on the agent's side.
        let world = parse_grid("m r R h").unwrap();
        let mut sim = Simulation::new(&world, SimulationConfig::default());
        let mut log = Vec::new();
        sim.run(&[Instruction::RequestKey { color: KeyColor::Red }], &mut log);
        assert_eq!(
            log,
            vec![
                OutputFact::AgentStart { cell: Cell::new(0, 0) },
                OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 1) },
                OutputFact::KeyPickedUp { color: KeyColor::Red },
                OutputFact::LocateHuman { cell: Cell::new(0, 3) },
                OutputFact::MoveToHuman,
                OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 2) },
                OutputFact::AgentMoved { direction: Direction::Right, cell: Cell::new(0, 3) },
                OutputFact::KeyDropped { color: KeyColor::Red },
            ]
        );
        assert_eq!(sim.agent_position(), Cell::new(0, 3));
        assert!(sim.keys().is_empty());
    }

    #[test]
    fn blocked_delivery_keeps_the_key() {
        let world = parse_grid("m r W h").unwrap();
        let mut sim = Simulation::new(&world, SimulationConfig::default());
        let mut log = Vec::new();
        sim.run(&[Instruction::RequestKey { color: KeyColor::Red }], &mut log);
        assert_eq!(
            log.last(),
            Some(&OutputFact::Diagnostic(Diagnostic::NoPath {
                from: Cell::new(0, 1),
                to: Cell::new(0, 3),
            }))
        );
        assert_eq!(sim.agent_position(), Cell::new(0, 1));
        assert!(sim.keys().contains(KeyColor::Red));
    }

    #[test]
    fn delivery_policies_pick_different_targets() {
        let world = parse_grid("m r h . .").unwrap();
        let mut script = vec![Instruction::RequestKey { color: KeyColor::Red }];
        script.extend(moves(&[Direction::Right, Direction::Right, Direction::Right]));
        script.push(Instruction::Unlock { color: KeyColor::Red });
        script.extend(moves(&[Direction::Left]));

        let frozen = simulate(&world, SimulationConfig::default(), &script);
        assert!(frozen.contains(&OutputFact::LocateHuman { cell: Cell::new(0, 2) }));

        let following = simulate(
            &world,
            SimulationConfig::default().with_delivery_policy(DeliveryPolicy::FollowScriptedMoves),
            &script,
        );
        // Two moves succeed, the third runs off the edge, the trailing Left is
        // past the Unlock and is not looked at.
        assert!(following.contains(&OutputFact::LocateHuman { cell: Cell::new(0, 4) }));
        // The projection does not move the human early.
        let human_moves: Vec<_> = following
            .iter()
            .filter(|fact| matches!(fact, OutputFact::HumanMoved { .. }))
            .collect();
        assert_eq!(human_moves.len(), 3);
    }

    #[test]
    fn unparsed_records_are_skipped() {
        let world = parse_grid("m . h").unwrap();
        let log = simulate(
            &world,
            SimulationConfig::default(),
            &[Instruction::Unparsed {
                line: 1,
                text: "Dance wildly".to_string(),
            }],
        );
        assert_eq!(log, vec![OutputFact::AgentStart { cell: Cell::new(0, 0) }]);
    }

    #[test]
    fn facts_render_in_result_file_format() {
        let rendered: Vec<String> = [
            OutputFact::AgentStart { cell: Cell::new(0, 0) },
            OutputFact::AgentMoved { direction: Direction::Down, cell: Cell::new(1, 0) },
            OutputFact::KeyPickedUp { color: KeyColor::Blue },
            OutputFact::LocateHuman { cell: Cell::new(2, 3) },
            OutputFact::MoveToHuman,
            OutputFact::KeyDropped { color: KeyColor::Blue },
            OutputFact::DoorUnlocked { color: KeyColor::Yellow },
            OutputFact::Diagnostic(Diagnostic::KeyNotFound { color: KeyColor::Green }),
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(
            rendered,
            vec![
                "My_position (0, 0)",
                "Move DOWN (1, 0)",
                "Pick_up_BLUE_key",
                "Locate_human: (2, 3)",
                "Move_to_Human:",
                "Drop_BLUE_key",
                "Unlock_YELLOW_door",
                "Key_not_found GREEN",
            ]
        );
    }

    #[test]
    fn facts_serialize_with_a_kind_tag() {
        let json = serde_json::to_string(&OutputFact::KeyPickedUp { color: KeyColor::Red }).unwrap();
        assert_eq!(json, r#"{"fact":"key_picked_up","color":"red"}"#);
    }
}
