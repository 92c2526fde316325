//! Commands queued for the host's input channel.

use serde::{Deserialize, Serialize};

/// A single host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Intent {
    /// Switch to an inventory slot.
    Equip {
        /// Slot index as the host numbers it.
        slot: u8,
    },
    /// Press the attack input once.
    Fire,
}

/// Append-only queue of intents, drained by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentQueue {
    intents: Vec<Intent>,
}

impl IntentQueue {
    /// An empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            intents: Vec::new(),
        }
    }

    /// Appends one intent.
    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Removes and returns every queued intent, oldest first.
    pub fn drain(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.intents)
    }

    /// Number of queued intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Queued intents, oldest first, without draining them.
    #[must_use]
    pub fn as_slice(&self) -> &[Intent] {
        &self.intents
    }
}

impl Extend<Intent> for IntentQueue {
    fn extend<I: IntoIterator<Item = Intent>>(&mut self, iter: I) {
        self.intents.extend(iter);
    }
}
