//! Text loaders for grid files and human instruction scripts.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    Cell, Direction, KeyColor,
    instruction::Instruction,
    map::Grid,
    world::{CellKind, GridWorld, WorldError},
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("grid has no rows")]
    EmptyGrid,
    #[error("inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("no '{0}' marker found in grid")]
    MissingMarker(char),
    #[error("multiple '{marker}' markers found, at {first} and {second}")]
    DuplicateMarker {
        marker: char,
        first: Cell,
        second: Cell,
    },
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Parses a grid where every non-whitespace character is one cell.
///
/// `W` is a wall, `r g b y` a key of that colour lying on open floor,
/// `R G B Y` a door of that colour, `m` the agent start and `h` the human
/// start. Any other character is open floor. Blank lines are ignored.
pub fn parse_grid(text: &str) -> Result<GridWorld, ParseError> {
    let mut rows: Vec<Vec<CellKind>> = Vec::new();
    let mut agent: Option<Cell> = None;
    let mut human: Option<Cell> = None;
    let mut keys: BTreeMap<KeyColor, Cell> = BTreeMap::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let row = rows.len();
        let mut kinds = Vec::new();
        for (col, code) in line.chars().filter(|c| !c.is_whitespace()).enumerate() {
            let cell = Cell { row, col };
            let kind = match code {
                'W' => CellKind::Wall,
                'm' => {
                    place_marker(&mut agent, 'm', cell)?;
                    CellKind::Open
                }
                'h' => {
                    place_marker(&mut human, 'h', cell)?;
                    CellKind::Open
                }
                c if c.is_ascii_lowercase() => {
                    if let Some(color) = KeyColor::from_initial(c) {
                        if let Some(first) = keys.insert(color, cell) {
                            return Err(ParseError::DuplicateMarker {
                                marker: c,
                                first,
                                second: cell,
                            });
                        }
                    }
                    CellKind::Open
                }
                c if c.is_ascii_uppercase() => match KeyColor::from_initial(c) {
                    Some(color) => CellKind::Door(color),
                    None => CellKind::Open,
                },
                _ => CellKind::Open,
            };
            kinds.push(kind);
        }
        if let Some(first) = rows.first() {
            if first.len() != kinds.len() {
                return Err(ParseError::RaggedRow {
                    row,
                    expected: first.len(),
                    found: kinds.len(),
                });
            }
        }
        rows.push(kinds);
    }

    if rows.first().is_none_or(Vec::is_empty) {
        return Err(ParseError::EmptyGrid);
    }
    let agent = agent.ok_or(ParseError::MissingMarker('m'))?;
    let human = human.ok_or(ParseError::MissingMarker('h'))?;
    let row_count = rows.len();
    let terrain = Grid::from_rows(rows).ok_or(ParseError::RaggedRow {
        row: row_count,
        expected: 0,
        found: 0,
    })?;
    Ok(GridWorld::new(terrain, keys, agent, human)?)
}

fn place_marker(slot: &mut Option<Cell>, marker: char, cell: Cell) -> Result<(), ParseError> {
    match slot.replace(cell) {
        Some(first) => Err(ParseError::DuplicateMarker {
            marker,
            first,
            second: cell,
        }),
        None => Ok(()),
    }
}

/// Decodes a human instruction script, one record per non-blank line.
///
/// Lines that cannot be decoded become [`Instruction::Unparsed`] so that line
/// numbering in the script and in the log stay in step.
pub fn parse_instructions(text: &str) -> Vec<Instruction> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_no = index + 1;
            parse_instruction_line(line).unwrap_or_else(|| {
                warn!(line = line_no, text = line.trim(), "unrecognized instruction line");
                Instruction::Unparsed {
                    line: line_no,
                    text: line.trim().to_string(),
                }
            })
        })
        .collect()
}

fn parse_instruction_line(line: &str) -> Option<Instruction> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["Move", direction, ..] => Some(Instruction::Move {
            direction: Direction::from_word(direction)?,
        }),
        ["Instruction:", pick, up, color, ..] if pick.eq_ignore_ascii_case("pick")
            && up.eq_ignore_ascii_case("up") =>
        {
            Some(Instruction::RequestKey {
                color: KeyColor::from_word(color)?,
            })
        }
        [word, ..] => {
            if let Some(rest) = word.strip_prefix("Pick_up_") {
                // Pick_up_RED_key
                let color = rest.split('_').next()?;
                Some(Instruction::PickUp {
                    color: KeyColor::from_word(color)?,
                })
            } else if let Some(rest) = word.strip_prefix("Unlock_") {
                // Unlock_BLUE_door
                let color = rest.split('_').next()?;
                Some(Instruction::Unlock {
                    color: KeyColor::from_word(color)?,
                })
            } else {
                None
            }
        }
        [] => None,
    }
}

/// Reads and parses a grid file.
pub fn load_grid(path: impl AsRef<Path>) -> Result<GridWorld, ParseError> {
    parse_grid(&read(path.as_ref())?)
}

/// Reads and parses an instruction script.
pub fn load_instructions(path: impl AsRef<Path>) -> Result<Vec<Instruction>, ParseError> {
    Ok(parse_instructions(&read(path.as_ref())?))
}

fn read(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
