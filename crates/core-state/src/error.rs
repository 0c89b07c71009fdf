use std::ops::Range;
use thiserror::Error;

/// Failures while turning a line into an observation.
///
/// Both variants mean the input line cannot be tracked as numbers; they are
/// never produced by an ordinary shape change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("numeric token {text:?} at {range:?} does not fit a signed 64-bit integer")]
    MalformedNumber { range: Range<usize>, text: String },
    #[error("delta for field {field} overflows a signed 64-bit integer")]
    DeltaOverflow { field: usize },
}
