//! Ordered queue of whole documents to concatenate.

use serde::Serialize;

use crate::page_model::Direction;

/// One input file waiting to be merged.
#[derive(Debug)]
pub struct MergeEntry {
    id: u64,
    name: String,
    bytes: Vec<u8>,
}

impl MergeEntry {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn summary(&self) -> MergeEntrySummary {
        MergeEntrySummary {
            id: self.id,
            name: self.name.clone(),
            size_bytes: self.bytes.len(),
        }
    }
}

/// Serializable view of a queue entry (no bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeEntrySummary {
    pub id: u64,
    pub name: String,
    pub size_bytes: usize,
}

/// Ids are assigned monotonically and never reused, so removal by id stays
/// unambiguous after any reordering.
#[derive(Debug, Default)]
pub struct MergeQueue {
    entries: Vec<MergeEntry>,
    next_id: u64,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file and return its id.
    pub fn push(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(MergeEntry {
            id,
            name: name.into(),
            bytes,
        });
        id
    }

    /// Remove the entry with `id`. Returns false if no such entry exists.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Swap the entry with `id` and its neighbor in `direction`.
    ///
    /// Returns false for unknown ids and for entries already at that end.
    pub fn swap_adjacent(&mut self, id: u64, direction: Direction) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let neighbor = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&n| n < self.entries.len()),
        };
        match neighbor {
            Some(neighbor) => {
                self.entries.swap(index, neighbor);
                true
            }
            None => false,
        }
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    pub fn summaries(&self) -> Vec<MergeEntrySummary> {
        self.entries.iter().map(MergeEntry::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
