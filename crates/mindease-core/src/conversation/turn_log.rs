//! Append-only conversation transcript.

use super::turn::Turn;

/// Ordered, append-only sequence of turns owned by one conversational surface.
///
/// There is no removal operation and no size cap here; retention is a caller
/// concern (see `SessionLimits` in the application layer).
#[derive(Debug, Clone, Default)]
pub struct TurnLog {
    turns: Vec<Turn>,
}

impl TurnLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log seeded with a single synthetic greeting.
    pub fn seeded(greeting: Turn) -> Self {
        Self {
            turns: vec![greeting],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns an owned copy of the transcript.
    ///
    /// Requests are built from snapshots so later appends never affect a
    /// request that is already in flight.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
