//! Per-line history store.
//!
//! Maps a line index (position in the round's output) to the last snapshot
//! observed there. Entries are overwritten on every observation and never
//! evicted; the map grows with the longest output seen.

use std::collections::HashMap;
use std::ops::Range;

/// The last observation of one line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub fingerprint: u32,
    pub ranges: Vec<Range<usize>>,
    /// `values[i]` is the integer parsed from `ranges[i]`.
    pub values: Vec<i64>,
}

impl Snapshot {
    pub fn field_count(&self) -> usize {
        self.ranges.len()
    }
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: HashMap<usize, Snapshot>,
    /// Observations that replaced an entry whose shape differed.
    rebaselines: u64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, line_index: usize) -> Option<&Snapshot> {
        self.entries.get(&line_index)
    }

    /// Store `snapshot` for `line_index`, returning the entry it replaced.
    pub fn replace(&mut self, line_index: usize, snapshot: Snapshot) -> Option<Snapshot> {
        self.entries.insert(line_index, snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn note_rebaseline(&mut self) {
        self.rebaselines += 1;
    }

    pub fn rebaselines(&self) -> u64 {
        self.rebaselines
    }
}
