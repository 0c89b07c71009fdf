//! Terminal backend abstraction and crossterm implementation.
//!
//! The watch screen runs in the alternate screen with raw mode (single key
//! presses reach the input task), a hidden cursor and line wrapping disabled
//! so long lines are clipped rather than pushing later rows down.

use anyhow::Result;
use crossterm::{
    cursor::Hide,
    cursor::Show,
    execute,
    terminal::{
        DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
        disable_raw_mode, enable_raw_mode, size,
    },
};
use std::io::stdout;

/// Fallback when the size query fails (not a tty).
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// `(columns, rows)`.
    fn size(&self) -> Result<(u16, u16)>;
}

#[derive(Default)]
pub struct CrosstermBackend {
    entered: bool,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide, DisableLineWrap)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), EnableLineWrap, LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a, B: TerminalBackend> {
    backend: &'a mut B,
}

impl<'a, B: TerminalBackend> TerminalGuard<'a, B> {
    /// Enter and return a guard that will leave on drop.
    pub fn enter(backend: &'a mut B) -> Result<Self> {
        backend.enter()?;
        Ok(Self { backend })
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    /// Rows available for output, with a fallback for non-tty stdout.
    pub fn rows(&self) -> u16 {
        self.backend.size().map(|(_, rows)| rows).unwrap_or(DEFAULT_SIZE.1)
    }
}

impl<'a, B: TerminalBackend> Drop for TerminalGuard<'a, B> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}
