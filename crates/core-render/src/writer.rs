//! Terminal writer for one screen refresh.
//!
//! Collects ordered commands for a frame and emits them in a single flush.
//! Every row starts with an absolute `MoveTo(0, row)` and ends with a clear to
//! end of line, so shorter output never leaves stale text behind. Rows past
//! the terminal height are dropped; the final flush clears everything below
//! the last written row.
//!
//! Design invariants:
//! * Commands preserve ordering; no flushing mid-frame.
//! * Color is decided once per frame (`color_enabled`), not per span.
//! * The writer is short-lived (one per round) and owns no global state.

use crate::LineOutcome;
use crate::style::Span;
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, PrintStyledContent, StyledContent},
    terminal::{Clear, ClearType},
};
use std::io::{Write, stdout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    ClearLine,
    ClearBelow,
    Print(String),
    Styled(Span),
}

pub struct Writer {
    cmds: Vec<Command>,
    color_enabled: bool,
    height: u16,
    row: u16,
}

impl Writer {
    pub fn new(color_enabled: bool, height: u16) -> Self {
        Self {
            cmds: Vec::new(),
            color_enabled,
            height,
            row: 0,
        }
    }

    pub fn rows_written(&self) -> u16 {
        self.row
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    /// True once the frame has no room for another row.
    pub fn is_full(&self) -> bool {
        self.row >= self.height
    }

    fn begin_row(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.cmds.push(Command::MoveTo(0, self.row));
        true
    }

    fn end_row(&mut self) {
        self.cmds.push(Command::ClearLine);
        self.row += 1;
    }

    /// Write one unstyled row.
    pub fn text_line<S: Into<String>>(&mut self, text: S) {
        if !self.begin_row() {
            return;
        }
        let text: String = text.into();
        if !text.is_empty() {
            self.cmds.push(Command::Print(text));
        }
        self.end_row();
    }

    /// Write one row made of styled spans.
    pub fn span_line(&mut self, spans: &[Span]) {
        if !self.begin_row() {
            return;
        }
        for span in spans.iter().filter(|s| !s.is_empty()) {
            if span.color.is_some() && self.color_enabled {
                self.cmds.push(Command::Styled(span.clone()));
            } else {
                self.cmds.push(Command::Print(span.text.clone()));
            }
        }
        self.end_row();
    }

    /// Write a rendered line; suppressed lines take no row.
    pub fn outcome(&mut self, outcome: &LineOutcome) {
        match outcome {
            LineOutcome::Raw(line) => self.text_line(line.as_str()),
            LineOutcome::Composed(spans) => self.span_line(spans),
            LineOutcome::Suppressed => {}
        }
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        self.flush_to(&mut out)
    }

    pub fn flush_to<W: Write>(mut self, out: &mut W) -> Result<()> {
        if self.row < self.height {
            self.cmds.push(Command::MoveTo(0, self.row));
            self.cmds.push(Command::ClearBelow);
        }
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearLine => {
                    queue!(out, Clear(ClearType::UntilNewLine))?;
                }
                Command::ClearBelow => {
                    queue!(out, Clear(ClearType::FromCursorDown))?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
                Command::Styled(span) => match span.content_style(true) {
                    Some(style) => {
                        queue!(out, PrintStyledContent(StyledContent::new(style, span.text)))?;
                    }
                    None => {
                        queue!(out, Print(span.text))?;
                    }
                },
            }
        }
        out.flush()?;
        Ok(())
    }
}
