//! Line scanning primitives: numeric tokenizer, separator heuristics and the
//! structural fingerprint used to recognise a line across polls.
//!
//! Everything here is pure and allocation-light; state (history, display
//! policy) lives in higher crates.

pub mod fingerprint;
pub mod heuristic;
pub mod ranges;

pub use fingerprint::Fingerprint;
pub use heuristic::Heuristic;
pub use ranges::tokenize;

use std::ops::Range;

/// Tokenize `line` with the separators of heuristic `h`.
#[inline]
pub fn tokenize_with(line: &str, h: Heuristic) -> Vec<Range<usize>> {
    tokenize(line, |c| h.is_separator(c))
}

/// Ranges covering everything in `0..len` not covered by `xs`, empty gaps removed.
pub fn complement_ranges(xs: &[Range<usize>], len: usize) -> Vec<Range<usize>> {
    let mut out = Vec::with_capacity(xs.len() + 1);
    let mut first = 0;
    for x in xs {
        out.push(first..x.start);
        first = x.end;
    }
    out.push(first..len);
    out.retain(|r| r.start != r.end);
    out
}

/// Non-numeric text spans of `line`, in order.
pub fn text_spans<'a>(line: &'a str, ranges: &[Range<usize>]) -> Vec<&'a str> {
    complement_ranges(ranges, line.len())
        .into_iter()
        .map(|r| &line[r])
        .collect()
}
