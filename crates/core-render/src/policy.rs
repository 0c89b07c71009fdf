//! Display policies for numeric fields.
//!
//! A policy turns one `(value, delta)` pair into the spans printed in place of
//! the number. The active policy is fixed for a whole round; the
//! `PolicyEngine` carries the only per-round state (the field counter), which
//! `reset` clears once every command of the round has been rendered.
//!
//! Selection cycles modulo the reachable list: with diff mode off only
//! `Counter` and `RawValue` are reachable, with diff mode on all six are.

use crate::style::Span;
use crossterm::style::Color;
use std::fmt;
use std::time::Duration;

const GIGA: f64 = 1_000_000_000.0;
const MEGA: f64 = 1_000_000.0;
const KILO: f64 = 1_000.0;
/// Four-digit rates stay exact; the `K` tier starts here.
const KILO_THRESHOLD: f64 = 10_000.0;

const ARROW: &str = "⟶";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayPolicy {
    /// `[n]`, numbering fields within a round.
    Counter,
    /// Current value.
    #[default]
    RawValue,
    /// Current value, then `⟶delta/i` when the delta is nonzero.
    ValueAndDelta,
    /// Nonzero delta only.
    DeltaOnly,
    /// Positive rate per second, scaled.
    Rate,
    /// Current value, then positive rate and bit rate.
    RateAndBits,
}

impl DisplayPolicy {
    pub const ALL: [DisplayPolicy; 6] = [
        DisplayPolicy::Counter,
        DisplayPolicy::RawValue,
        DisplayPolicy::ValueAndDelta,
        DisplayPolicy::DeltaOnly,
        DisplayPolicy::Rate,
        DisplayPolicy::RateAndBits,
    ];

    /// Policies reachable while diff mode is off.
    pub const PLAIN: [DisplayPolicy; 2] = [DisplayPolicy::Counter, DisplayPolicy::RawValue];

    pub fn select(index: usize, diff_mode: bool) -> Self {
        if diff_mode {
            Self::ALL[index % Self::ALL.len()]
        } else {
            Self::PLAIN[index % Self::PLAIN.len()]
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        match self {
            DisplayPolicy::Counter => "counter",
            DisplayPolicy::RawValue => "value",
            DisplayPolicy::ValueAndDelta => "value+delta",
            DisplayPolicy::DeltaOnly => "delta",
            DisplayPolicy::Rate => "rate",
            DisplayPolicy::RateAndBits => "rate+bits",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for DisplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    PerSecond,
    Bits,
}

/// `delta` per second over `interval`. Zero when the interval is zero.
pub fn rate_per_sec(delta: i64, interval: Duration) -> f64 {
    let micros = interval.as_micros();
    if micros == 0 {
        return 0.0;
    }
    delta as f64 * 1_000_000.0 / micros as f64
}

/// Format `value` with up to two decimals, trailing zeros trimmed.
fn trim_decimals(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Scale `value` into G/M/K units.
pub fn format_scaled(value: f64, unit: RateUnit) -> String {
    let (scaled, prefix) = match value {
        v if v >= GIGA => (v / GIGA, "G"),
        v if v >= MEGA => (v / MEGA, "M"),
        v if v >= KILO_THRESHOLD => (v / KILO, "K"),
        v => (v, ""),
    };
    match unit {
        RateUnit::PerSecond => format!("{}{prefix}", trim_decimals(scaled)),
        RateUnit::Bits => format!("{}{prefix}bps", trim_decimals(scaled)),
    }
}

/// Renders numeric fields under the policy of the current round.
#[derive(Debug)]
pub struct PolicyEngine {
    policy: DisplayPolicy,
    interval: Duration,
    counter: u64,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(DisplayPolicy::default(), Duration::from_secs(1))
    }
}

impl PolicyEngine {
    pub fn new(policy: DisplayPolicy, interval: Duration) -> Self {
        Self {
            policy,
            interval,
            counter: 0,
        }
    }

    /// Fix the policy and rate interval for the next round.
    pub fn configure(&mut self, policy: DisplayPolicy, interval: Duration) {
        self.policy = policy;
        self.interval = interval;
    }

    /// End-of-round reset; restarts the field counter.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn render(&mut self, value: i64, delta: i64) -> Vec<Span> {
        match self.policy {
            DisplayPolicy::Counter => {
                self.counter += 1;
                vec![Span::colored(format!("[{}]", self.counter), Color::Yellow)]
            }
            DisplayPolicy::RawValue => vec![Span::colored(value.to_string(), Color::Blue)],
            DisplayPolicy::ValueAndDelta => {
                let mut out = vec![Span::colored(value.to_string(), Color::Blue)];
                if delta != 0 {
                    out.push(Span::plain(ARROW));
                    out.push(Span::colored(format!("{delta}/i"), Color::Red));
                }
                out
            }
            DisplayPolicy::DeltaOnly => {
                if delta == 0 {
                    Vec::new()
                } else {
                    vec![Span::colored(delta.to_string(), Color::Red)]
                }
            }
            DisplayPolicy::Rate => {
                let rate = rate_per_sec(delta, self.interval);
                if rate > 0.0 {
                    vec![Span::colored(
                        format!("{}/sec", format_scaled(rate, RateUnit::PerSecond)),
                        Color::Red,
                    )]
                } else {
                    Vec::new()
                }
            }
            DisplayPolicy::RateAndBits => {
                let mut out = vec![Span::colored(value.to_string(), Color::Magenta)];
                let rate = rate_per_sec(delta, self.interval);
                if rate > 0.0 {
                    out.push(Span::plain(ARROW));
                    out.push(Span::colored(
                        format!("{}/sec", format_scaled(rate, RateUnit::PerSecond)),
                        Color::Red,
                    ));
                    out.push(Span::plain(" "));
                    out.push(Span::colored(
                        format_scaled(rate * 8.0, RateUnit::Bits),
                        Color::Green,
                    ));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(spans: &[Span]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn counter_numbers_fields_and_resets_per_round() {
        let mut e = PolicyEngine::new(DisplayPolicy::Counter, Duration::from_secs(1));
        let round: Vec<String> = (0..5).map(|_| texts(&e.render(42, 0))).collect();
        assert_eq!(round, vec!["[1]", "[2]", "[3]", "[4]", "[5]"]);
        e.reset();
        assert_eq!(texts(&e.render(42, 0)), "[1]");
    }

    #[test]
    fn stateless_policies_ignore_reset() {
        let mut e = PolicyEngine::new(DisplayPolicy::RawValue, Duration::from_secs(1));
        assert_eq!(texts(&e.render(7, 3)), "7");
        e.reset();
        assert_eq!(texts(&e.render(7, 3)), "7");
    }

    #[test]
    fn value_and_delta_hides_zero_delta() {
        let mut e = PolicyEngine::new(DisplayPolicy::ValueAndDelta, Duration::from_secs(1));
        assert_eq!(texts(&e.render(10, 0)), "10");
        assert_eq!(texts(&e.render(10, -4)), "10⟶-4/i");
    }

    #[test]
    fn delta_only_renders_nonzero_deltas() {
        let mut e = PolicyEngine::new(DisplayPolicy::DeltaOnly, Duration::from_secs(1));
        assert!(e.render(10, 0).is_empty());
        assert_eq!(texts(&e.render(10, 5)), "5");
    }

    #[test]
    fn rate_below_kilo_threshold_is_exact() {
        let mut e = PolicyEngine::new(DisplayPolicy::Rate, Duration::from_micros(1_000_000));
        assert_eq!(texts(&e.render(0, 5000)), "5000/sec");
        assert_eq!(texts(&e.render(0, 5_000_000)), "5M/sec");
        assert!(e.render(0, 0).is_empty());
        assert!(e.render(0, -10).is_empty());
    }

    #[test]
    fn rate_scales_with_interval() {
        let mut e = PolicyEngine::new(DisplayPolicy::Rate, Duration::from_millis(500));
        assert_eq!(texts(&e.render(0, 50)), "100/sec");
        e.configure(DisplayPolicy::Rate, Duration::ZERO);
        assert!(e.render(0, 50).is_empty());
    }

    #[test]
    fn rate_and_bits_appends_bit_rate() {
        let mut e = PolicyEngine::new(DisplayPolicy::RateAndBits, Duration::from_secs(1));
        assert_eq!(texts(&e.render(900, 0)), "900");
        assert_eq!(texts(&e.render(900, 1_500_000)), "900⟶1.5M/sec 12Mbps");
    }

    #[test]
    fn scaled_formatting_tiers() {
        assert_eq!(format_scaled(500.0, RateUnit::PerSecond), "500");
        assert_eq!(format_scaled(2.5, RateUnit::PerSecond), "2.5");
        assert_eq!(format_scaled(9_999.0, RateUnit::PerSecond), "9999");
        assert_eq!(format_scaled(12_000.0, RateUnit::PerSecond), "12K");
        assert_eq!(format_scaled(1_500_000.0, RateUnit::PerSecond), "1.5M");
        assert_eq!(format_scaled(1_500_000_000.0, RateUnit::PerSecond), "1.5G");
        assert_eq!(format_scaled(800.0, RateUnit::Bits), "800bps");
        assert_eq!(format_scaled(40_000.0, RateUnit::Bits), "40Kbps");
        assert_eq!(format_scaled(2_000_000_000.0, RateUnit::Bits), "2Gbps");
    }

    #[test]
    fn selection_respects_diff_mode() {
        assert_eq!(DisplayPolicy::select(0, false), DisplayPolicy::Counter);
        assert_eq!(DisplayPolicy::select(1, false), DisplayPolicy::RawValue);
        assert_eq!(DisplayPolicy::select(4, false), DisplayPolicy::Counter);
        assert_eq!(DisplayPolicy::select(4, true), DisplayPolicy::Rate);
        assert_eq!(DisplayPolicy::select(7, true), DisplayPolicy::RawValue);
        for i in 0..32 {
            assert!(DisplayPolicy::PLAIN.contains(&DisplayPolicy::select(i, false)));
        }
    }

    #[test]
    fn names_round_trip() {
        for p in DisplayPolicy::ALL {
            assert_eq!(DisplayPolicy::from_name(p.name()), Some(p));
            assert_eq!(DisplayPolicy::ALL[p.index()], p);
        }
        assert_eq!(DisplayPolicy::from_name("fancy"), None);
    }
}
