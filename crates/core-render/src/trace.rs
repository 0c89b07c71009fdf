//! Trace (data file) output.
//!
//! One record per round: the round index, then every tracked field of every
//! line, tab separated, terminated by a newline. In diff mode the fields are
//! deltas (lines without a delta contribute nothing); otherwise they are the
//! current values.

use core_state::Observation;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct TraceWriter<W: Write> {
    out: W,
    open: bool,
}

impl TraceWriter<BufWriter<File>> {
    /// Open `path` for writing, truncating anything already there.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, open: false }
    }

    pub fn begin_round(&mut self, round: u64) -> io::Result<()> {
        if self.open {
            self.end_round()?;
        }
        write!(self.out, "{round}")?;
        self.open = true;
        Ok(())
    }

    pub fn record(&mut self, obs: &Observation, diff_mode: bool) -> io::Result<()> {
        let series = if diff_mode {
            obs.delta.as_deref()
        } else {
            Some(obs.values.as_slice())
        };
        for v in series.unwrap_or_default() {
            write!(self.out, "\t{v}")?;
        }
        Ok(())
    }

    pub fn end_round(&mut self) -> io::Result<()> {
        if self.open {
            writeln!(self.out)?;
            self.out.flush()?;
            self.open = false;
        }
        Ok(())
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.end_round()?;
        Ok(self.out)
    }
}
