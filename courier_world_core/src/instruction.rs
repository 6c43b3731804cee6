use serde::{Deserialize, Serialize};

use crate::{Direction, KeyColor};

/// A single record of the human's script, already decoded from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    /// The human steps one cell.
    Move { direction: Direction },
    /// The human asks the agent to fetch a key and bring it over.
    RequestKey { color: KeyColor },
    /// The agent gains a key without travelling.
    PickUp { color: KeyColor },
    /// The agent spends a held key on the matching door.
    Unlock { color: KeyColor },
    /// A script line the parser could not decode. The engine skips it.
    Unparsed { line: usize, text: String },
}
