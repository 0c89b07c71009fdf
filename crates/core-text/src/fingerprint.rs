//! Structural fingerprint of a line.
//!
//! The skeleton of a line is its text with every numeric token removed and
//! every remaining ASCII digit dropped, minus the final character. Two polls of
//! "the same" line (same labels, same punctuation, numbers moved) share a
//! skeleton and therefore a fingerprint.
//!
//! Hashing strategy: `ahash` over the skeleton bytes, folded to 32 bits. The
//! hasher uses fixed keys so fingerprints are stable for the process lifetime,
//! which is the only scope they are compared in.

use ahash::AHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hash: u32,
    pub skeleton: String,
}

impl Fingerprint {
    pub fn of(line: &str, ranges: &[Range<usize>]) -> Self {
        let skeleton = skeleton(line, ranges);
        Self {
            hash: hash_skeleton(&skeleton),
            skeleton,
        }
    }
}

/// Build the skeleton for `line`. `ranges` must be sorted and disjoint, as
/// produced by [`crate::tokenize`].
pub fn skeleton(line: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending = ranges.iter().peekable();
    for (offset, c) in line.char_indices() {
        while pending.next_if(|r| r.end <= offset).is_some() {}
        let inside = pending.peek().is_some_and(|r| r.contains(&offset));
        if !inside && !c.is_ascii_digit() {
            out.push(c);
        }
    }
    out.pop();
    out
}

pub fn hash_skeleton(skeleton: &str) -> u32 {
    let mut hasher = AHasher::default();
    skeleton.hash(&mut hasher);
    let h = hasher.finish();
    ((h >> 32) ^ h) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Heuristic, tokenize};

    fn fp(line: &str) -> Fingerprint {
        let h = Heuristic::Extended;
        let ranges = tokenize(line, |c| h.is_separator(c));
        Fingerprint::of(line, &ranges)
    }

    #[test]
    fn skeleton_drops_tokens_stray_digits_and_last_char() {
        let line = "eth0: 1234 packets 56;";
        let ranges = tokenize(line, |c| Heuristic::Minimal.is_separator(c));
        assert_eq!(ranges.len(), 2);
        assert_eq!(skeleton(line, &ranges), "eth:  packets ");
    }

    #[test]
    fn empty_line_has_empty_skeleton() {
        assert_eq!(skeleton("", &[]), "");
        assert_eq!(skeleton("7", &[0..1]), "");
    }

    #[test]
    fn moved_values_keep_the_fingerprint() {
        assert_eq!(fp("cpu: 5 10 idle").hash, fp("cpu: 6 2000 idle").hash);
        assert_eq!(fp("rx=1 tx=2").hash, fp("rx=100 tx=2000").hash);
    }

    #[test]
    fn changed_labels_change_the_fingerprint() {
        assert_ne!(fp("cpu: 5 10 idle").hash, fp("mem: 5 10 idle").hash);
        assert_ne!(fp("a 1 b 2 c").hash, fp("a 1 b c 2").hash);
    }

    #[test]
    fn trailing_character_is_ignored() {
        assert_eq!(fp("total 10!").hash, fp("total 10?").hash);
    }
}
