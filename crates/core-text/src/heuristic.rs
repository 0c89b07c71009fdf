//! Separator heuristics for the numeric tokenizer.
//!
//! A heuristic decides how aggressively punctuation is treated as a field
//! boundary. Whitespace is always a separator; each preset adds a fixed set of
//! punctuation characters on top. Presets form an ordered cycle so a live
//! toggle can step through them (`Heuristic::cycle`).

use std::fmt;

const MINIMAL: &str = ",:;()";
const EXTENDED: &str = ",:;().{}[]=";
const AGGRESSIVE: &str = ",:;().{}[]=<>'`\"|";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Heuristic {
    /// Whitespace plus `, : ; ( )`.
    Minimal,
    /// Minimal plus `. { } [ ] =`.
    #[default]
    Extended,
    /// Extended plus quotes, angle brackets and pipes.
    Aggressive,
}

impl Heuristic {
    pub const ALL: [Heuristic; 3] = [
        Heuristic::Minimal,
        Heuristic::Extended,
        Heuristic::Aggressive,
    ];

    /// Resolve an index from the shared control cell. Out-of-range indices wrap.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        match self {
            Heuristic::Minimal => 0,
            Heuristic::Extended => 1,
            Heuristic::Aggressive => 2,
        }
    }

    /// Next preset in the cycle.
    pub fn cycle(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Heuristic::Minimal => "minimal",
            Heuristic::Extended => "extended",
            Heuristic::Aggressive => "aggressive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|h| h.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn punctuation(self) -> &'static str {
        match self {
            Heuristic::Minimal => MINIMAL,
            Heuristic::Extended => EXTENDED,
            Heuristic::Aggressive => AGGRESSIVE,
        }
    }

    #[inline]
    pub fn is_separator(self, c: char) -> bool {
        c.is_whitespace() || self.punctuation().contains(c)
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_through_all_presets() {
        let mut h = Heuristic::Minimal;
        let mut seen = Vec::new();
        for _ in 0..Heuristic::ALL.len() {
            seen.push(h);
            h = h.cycle();
        }
        assert_eq!(seen, Heuristic::ALL.to_vec());
        assert_eq!(h, Heuristic::Minimal);
    }

    #[test]
    fn extended_adds_dot_and_brackets() {
        assert!(!Heuristic::Minimal.is_separator('.'));
        assert!(Heuristic::Extended.is_separator('.'));
        assert!(Heuristic::Extended.is_separator('='));
        assert!(Heuristic::Extended.is_separator(']'));
        assert!(!Heuristic::Extended.is_separator('|'));
        assert!(Heuristic::Aggressive.is_separator('|'));
    }

    #[test]
    fn whitespace_is_always_a_separator() {
        for h in Heuristic::ALL {
            assert!(h.is_separator(' '));
            assert!(h.is_separator('\t'));
        }
    }

    #[test]
    fn names_round_trip_case_insensitively() {
        assert_eq!(Heuristic::from_name("MINIMAL"), Some(Heuristic::Minimal));
        assert_eq!(Heuristic::from_name(" extended "), Some(Heuristic::Extended));
        assert_eq!(Heuristic::from_name("bogus"), None);
        assert_eq!(Heuristic::from_index(4), Heuristic::Extended);
    }
}
