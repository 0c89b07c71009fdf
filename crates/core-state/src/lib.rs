//! Line tracking state: history store and delta calculation.
//!
//! `LineTracker::observe` is the single entry point. For each line it
//! tokenizes, parses the numeric fields, fingerprints the remaining structure
//! and compares against the previous snapshot at the same line index.
//!
//! Delta eligibility:
//! - a previous snapshot exists for the index;
//! - the line has at least one numeric field;
//! - field counts match;
//! - under `ShapeMatch::CountAndFingerprint`, fingerprints match too.
//!
//! When any condition fails the observation carries no delta and the caller
//! renders the line raw. The store is overwritten in every case so the next
//! round compares against the newest shape.

pub mod error;
pub mod history;

pub use error::TrackError;
pub use history::{HistoryStore, Snapshot};

use core_text::{Fingerprint, Heuristic, tokenize_with};
use std::fmt;
use std::ops::Range;
use tracing::trace;

/// How strictly two observations must agree before a delta is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeMatch {
    /// Same field count and same skeleton fingerprint.
    #[default]
    CountAndFingerprint,
    /// Same field count only.
    CountOnly,
}

impl ShapeMatch {
    pub fn name(self) -> &'static str {
        match self {
            ShapeMatch::CountAndFingerprint => "strict",
            ShapeMatch::CountOnly => "count",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(ShapeMatch::CountAndFingerprint),
            "count" => Some(ShapeMatch::CountOnly),
            _ => None,
        }
    }
}

/// Why an observation has no delta. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeChange {
    FirstSight,
    NoFields,
    FieldCount { previous: usize, current: usize },
    Fingerprint,
}

impl fmt::Display for ShapeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeChange::FirstSight => f.write_str("first_sight"),
            ShapeChange::NoFields => f.write_str("no_fields"),
            ShapeChange::FieldCount { .. } => f.write_str("field_count"),
            ShapeChange::Fingerprint => f.write_str("fingerprint"),
        }
    }
}

/// Result of observing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub line_index: usize,
    pub fingerprint: u32,
    pub ranges: Vec<Range<usize>>,
    pub values: Vec<i64>,
    /// `current - previous` per field, `None` when the shape changed.
    pub delta: Option<Vec<i64>>,
    pub shape_change: Option<ShapeChange>,
}

impl Observation {
    pub fn has_delta(&self) -> bool {
        self.delta.is_some()
    }

    /// True when the line starts with a numeric field.
    pub fn first_is_number(&self) -> bool {
        self.ranges.first().is_some_and(|r| r.start == 0)
    }
}

/// Parse every range of `line` as a signed integer.
pub fn parse_numbers(line: &str, ranges: &[Range<usize>]) -> Result<Vec<i64>, TrackError> {
    ranges
        .iter()
        .map(|r| {
            let text = line.get(r.clone()).unwrap_or_default();
            text.parse::<i64>()
                .map_err(|_| TrackError::MalformedNumber {
                    range: r.clone(),
                    text: text.to_string(),
                })
        })
        .collect()
}

/// Elementwise `current - previous`.
pub fn compute_delta(current: &[i64], previous: &[i64]) -> Result<Vec<i64>, TrackError> {
    current
        .iter()
        .zip(previous)
        .enumerate()
        .map(|(field, (c, p))| c.checked_sub(*p).ok_or(TrackError::DeltaOverflow { field }))
        .collect()
}

#[derive(Debug, Default)]
pub struct LineTracker {
    store: HistoryStore,
    shape: ShapeMatch,
}

impl LineTracker {
    pub fn new(shape: ShapeMatch) -> Self {
        Self {
            store: HistoryStore::new(),
            shape,
        }
    }

    pub fn shape(&self) -> ShapeMatch {
        self.shape
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Observe `line` at `line_index`, updating the history.
    ///
    /// A malformed numeric token aborts before the history is touched. A delta
    /// overflow is reported after the new snapshot has been stored.
    pub fn observe(
        &mut self,
        line_index: usize,
        line: &str,
        heuristic: Heuristic,
    ) -> Result<Observation, TrackError> {
        let ranges = tokenize_with(line, heuristic);
        let values = parse_numbers(line, &ranges)?;
        let fingerprint = Fingerprint::of(line, &ranges).hash;

        let shape_change = match self.store.get(line_index) {
            None => Some(ShapeChange::FirstSight),
            Some(_) if ranges.is_empty() => Some(ShapeChange::NoFields),
            Some(prev) if prev.field_count() != ranges.len() => Some(ShapeChange::FieldCount {
                previous: prev.field_count(),
                current: ranges.len(),
            }),
            Some(prev)
                if self.shape == ShapeMatch::CountAndFingerprint
                    && prev.fingerprint != fingerprint =>
            {
                Some(ShapeChange::Fingerprint)
            }
            Some(_) => None,
        };

        let delta = match (shape_change, self.store.get(line_index)) {
            (None, Some(prev)) => Some(compute_delta(&values, &prev.values)),
            _ => None,
        };

        if let Some(change) = shape_change {
            if !matches!(change, ShapeChange::FirstSight) {
                self.store.note_rebaseline();
            }
            trace!(
                target: "state.history",
                line_index,
                fields = ranges.len(),
                reason = %change,
                "shape_rebaseline"
            );
        }

        self.store.replace(
            line_index,
            Snapshot {
                fingerprint,
                ranges: ranges.clone(),
                values: values.clone(),
            },
        );

        Ok(Observation {
            line_index,
            fingerprint,
            ranges,
            values,
            delta: delta.transpose()?,
            shape_change,
        })
    }
}
