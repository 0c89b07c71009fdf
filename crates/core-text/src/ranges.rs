//! Numeric range scanner.
//!
//! Scans a line once and reports the byte ranges of integer tokens. A token is
//! an optional run of signs followed by ASCII digits, delimited on both sides by
//! separators (or line start / end). Digits glued to other characters (`eth0`,
//! `12ms`) are not tokens.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Seeking,
    Sign,
    Digits,
}

/// Return the byte ranges of numeric tokens in `line`, left to right.
pub fn tokenize<F>(line: &str, is_separator: F) -> Vec<Range<usize>>
where
    F: Fn(char) -> bool,
{
    let mut ranges = Vec::new();
    let mut state = State::Seeking;
    let mut start = 0usize;

    for (offset, c) in line.char_indices() {
        state = match state {
            State::Outside => {
                if is_separator(c) {
                    State::Seeking
                } else {
                    State::Outside
                }
            }
            State::Seeking => {
                if c.is_ascii_digit() {
                    start = offset;
                    State::Digits
                } else if c == '+' || c == '-' {
                    start = offset;
                    State::Sign
                } else if is_separator(c) {
                    State::Seeking
                } else {
                    State::Outside
                }
            }
            State::Sign => {
                if c.is_ascii_digit() {
                    State::Digits
                } else if c == '+' || c == '-' {
                    start = offset;
                    State::Sign
                } else if is_separator(c) {
                    State::Seeking
                } else {
                    State::Outside
                }
            }
            State::Digits => {
                if is_separator(c) {
                    ranges.push(start..offset);
                    State::Seeking
                } else if c.is_ascii_digit() {
                    State::Digits
                } else {
                    State::Outside
                }
            }
        };
    }

    if state == State::Digits {
        ranges.push(start..line.len());
    }

    ranges
}
