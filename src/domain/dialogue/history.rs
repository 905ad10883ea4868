//! Bounded conversation history used as generation context.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of turns kept per session.
pub const DEFAULT_MAX_HISTORY: usize = 8;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in the history window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Ring of the most recent turns, oldest first.
///
/// After every append the window holds at most `max_turns` entries. Eviction
/// works from the front, and an assistant turn left at the front without its
/// user turn is dropped as well, so the window never opens on a dangling reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl HistoryWindow {
    /// Creates an empty window. A capacity of zero is raised to one.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    pub fn append(&mut self, role: TurnRole, text: impl Into<String>) {
        self.turns.push_back(Turn::new(role, text));
        let mut evicted = false;
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
            evicted = true;
        }
        if evicted {
            while self.turns.len() > 1
                && self.turns.front().map(|t| t.role) == Some(TurnRole::Assistant)
            {
                self.turns.pop_front();
            }
        }
    }

    /// Returns the turns oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
