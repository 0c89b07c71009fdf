//! One polling round: command outputs in, one frame of rows out.
//!
//! Lines get one continuous index across every command of the round, starting
//! at 0 each round, so the history keys on a line's position in the whole
//! frame.

use core_events::RoundSettings;
use core_render::trace::TraceWriter;
use core_render::writer::Writer;
use core_render::LineRenderer;
use core_state::{LineTracker, ShapeMatch};
use std::io::Write;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    /// Zero-based index of the round these stats describe.
    pub round: u64,
    pub lines: usize,
    pub track_errors: usize,
    /// Line indices with history after the round.
    pub tracked: usize,
    /// Shape changes seen since startup.
    pub rebaselines: u64,
}

pub struct RoundPipeline<W: Write> {
    tracker: LineTracker,
    renderer: LineRenderer,
    trace: Option<TraceWriter<W>>,
    round: u64,
}

impl<W: Write> RoundPipeline<W> {
    pub fn new(shape: ShapeMatch, drop_zero: bool, trace: Option<TraceWriter<W>>) -> Self {
        Self {
            tracker: LineTracker::new(shape),
            renderer: LineRenderer::new(drop_zero),
            trace,
            round: 0,
        }
    }

    /// Track, render and write every line of `outputs`, in command order.
    ///
    /// A line whose numbers cannot be tracked is written raw; the round goes on.
    pub fn run<S: AsRef<str>>(
        &mut self,
        settings: &RoundSettings,
        interval: Duration,
        outputs: &[S],
        writer: &mut Writer,
    ) -> RoundStats {
        let mut stats = RoundStats {
            round: self.round,
            ..RoundStats::default()
        };
        self.renderer
            .begin_round(settings.policy, settings.diff_mode, interval);
        let round = self.round;
        self.with_trace(|t| t.begin_round(round));

        let lines = outputs.iter().flat_map(|o| o.as_ref().lines());
        for (line_index, line) in lines.enumerate() {
            stats.lines += 1;
            match self.tracker.observe(line_index, line, settings.heuristic) {
                Ok(obs) => {
                    self.with_trace(|t| t.record(&obs, settings.diff_mode));
                    writer.outcome(&self.renderer.render_line(&obs, line));
                }
                Err(e) => {
                    stats.track_errors += 1;
                    warn!(target: "runtime.round", line_index, error = %e, "line_untracked");
                    writer.text_line(line);
                }
            }
        }

        self.renderer.end_round();
        self.with_trace(|t| t.end_round());
        self.round += 1;
        stats.tracked = self.tracker.store().len();
        stats.rebaselines = self.tracker.store().rebaselines();
        stats
    }

    /// A failing trace file is dropped; watching continues without it.
    fn with_trace(&mut self, f: impl FnOnce(&mut TraceWriter<W>) -> std::io::Result<()>) {
        let Some(trace) = self.trace.as_mut() else {
            return;
        };
        if let Err(e) = f(trace) {
            warn!(target: "runtime.round", error = %e, "trace_write_failed");
            self.trace = None;
        }
    }

    #[cfg(test)]
    fn into_trace(self) -> Option<TraceWriter<W>> {
        self.trace
    }
}
