use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::KeyColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyRingError {
    #[error("no {0} key is held")]
    NotHeld(KeyColor),
}

/// The set of key colours the agent currently carries.
///
/// Ordered so that snapshots compare and print deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRing {
    held: BTreeSet<KeyColor>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, color: KeyColor) -> bool {
        self.held.contains(&color)
    }

    /// Adds a key. Holding two keys of one colour is the same as holding one.
    pub fn add(&mut self, color: KeyColor) {
        self.held.insert(color);
    }

    /// Removes a held key, failing without side effects if it is absent.
    pub fn remove(&mut self, color: KeyColor) -> Result<(), KeyRingError> {
        if self.held.remove(&color) {
            Ok(())
        } else {
            Err(KeyRingError::NotHeld(color))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyColor> + '_ {
        self.held.iter().copied()
    }
}

impl FromIterator<KeyColor> for KeyRing {
    fn from_iter<I: IntoIterator<Item = KeyColor>>(iter: I) -> Self {
        KeyRing {
            held: iter.into_iter().collect(),
        }
    }
}
