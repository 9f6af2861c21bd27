//! Append-only record of successful generation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::{GenerationKind, GenerationOutput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: GenerationKind,
    pub content: GenerationOutput,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(kind: GenerationKind, content: GenerationOutput) -> Self {
        Self {
            kind,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Insertion-ordered log kept for the whole process lifetime.
///
/// Entries are never mutated or removed; only the most recent few are shown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `count` entries, most recent first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Every entry in insertion order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
