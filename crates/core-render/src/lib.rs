//! Rendering for tracked lines: display policies, line composition, frame
//! writer, banner and trace output.
//!
//! Per round the caller:
//! 1. `LineRenderer::begin_round` with the policy and elapsed interval read
//!    from the round's control snapshot;
//! 2. `render_line` for every observed line, in output order, feeding the
//!    resulting `LineOutcome` to a `Writer`;
//! 3. `end_round` once after the last command, which resets per-round policy
//!    state (the field counter).
//!
//! Outcome rules:
//! - no delta (first sight or shape change) → `Raw`, the line as received;
//! - drop-zero on and the displayed series (deltas in diff mode, values
//!   otherwise) is non-empty and all zero → `Suppressed`;
//! - otherwise → `Composed` spans.

pub mod compose;
pub mod policy;
pub mod status;
pub mod style;
pub mod trace;
pub mod writer;

pub use compose::compose;
pub use policy::{DisplayPolicy, PolicyEngine};
pub use style::Span;

use core_state::Observation;
use core_text::text_spans;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Raw(String),
    Composed(Vec<Span>),
    Suppressed,
}

#[derive(Debug, Default)]
pub struct LineRenderer {
    engine: PolicyEngine,
    diff_mode: bool,
    drop_zero: bool,
    suppressed: u64,
}

impl LineRenderer {
    pub fn new(drop_zero: bool) -> Self {
        Self {
            drop_zero,
            ..Self::default()
        }
    }

    pub fn begin_round(&mut self, policy: DisplayPolicy, diff_mode: bool, interval: Duration) {
        self.engine.configure(policy, interval);
        self.diff_mode = diff_mode;
        self.suppressed = 0;
    }

    pub fn render_line(&mut self, obs: &Observation, line: &str) -> LineOutcome {
        let Some(delta) = obs.delta.as_deref() else {
            return LineOutcome::Raw(line.to_string());
        };

        if self.drop_zero {
            let series = if self.diff_mode { delta } else { &obs.values };
            if !series.is_empty() && series.iter().all(|v| *v == 0) {
                self.suppressed += 1;
                return LineOutcome::Suppressed;
            }
        }

        let texts = text_spans(line, &obs.ranges);
        let numbers = obs
            .values
            .iter()
            .zip(delta)
            .map(|(value, d)| self.engine.render(*value, *d))
            .collect();
        LineOutcome::Composed(compose(&texts, numbers, obs.first_is_number()))
    }

    pub fn end_round(&mut self) {
        if self.suppressed > 0 {
            debug!(target: "render.round", suppressed = self.suppressed, "zero_lines_dropped");
        }
        self.engine.reset();
    }
}
