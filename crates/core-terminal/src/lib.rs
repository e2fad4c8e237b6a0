//! Terminal session management.
//!
//! The binary acquires exactly one `TerminalSession` for its lifetime. An
//! interactive session switches the terminal into raw mode and the
//! alternate screen (bracketed paste on, cursor hidden, title set) and
//! restores all of it on `release` or drop, panic unwinds included. A
//! headless session never touches terminal state and reports the 24x80
//! floor the display path assumes, so the rest of the application can ask
//! one object for geometry regardless of how it was started.
//!
//! Capability probing is environment-based and independent of session
//! state, so callers may consult it before any terminal mode changes.

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::stdout;

/// Geometry reported when no real terminal is attached (headless, or a
/// size query failing mid-session).
pub const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Capabilities relevant to zone rendering. `color_depth` gates whether
/// ANSI SGR runs in pipe output are interpreted or stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub color_depth: ColorDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Monochrome,
    Ansi256,
}

impl TerminalCapabilities {
    /// Detection is conservative: a `NO_COLOR` environment disables color,
    /// anything else is assumed 256-capable (crossterm degrades gracefully).
    pub fn detect() -> Self {
        let depth = if std::env::var_os("NO_COLOR").is_some() {
            ColorDepth::Monochrome
        } else {
            ColorDepth::Ansi256
        };
        Self { color_depth: depth }
    }

    pub fn color(&self) -> bool {
        self.color_depth != ColorDepth::Monochrome
    }
}

/// Owns the terminal for the process lifetime and undoes every mode change
/// it made, exactly once, no matter how the process winds down.
pub struct TerminalSession {
    interactive: bool,
    restored: bool,
    caps: TerminalCapabilities,
}

impl TerminalSession {
    /// Take over the terminal: raw mode, alternate screen, bracketed
    /// paste, hidden cursor, window title. Raw mode is rolled back if the
    /// screen switch fails partway, so an error leaves the terminal usable.
    pub fn interactive(title: &str) -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        if let Err(e) = execute!(
            stdout(),
            EnterAlternateScreen,
            EnableBracketedPaste,
            Hide,
            SetTitle(title)
        ) {
            let _ = disable_raw_mode();
            return Err(e).context("enter alternate screen");
        }
        Ok(Self {
            interactive: true,
            restored: false,
            caps: TerminalCapabilities::detect(),
        })
    }

    /// A session that never touches the terminal (API/FIFO-driven runs).
    pub fn headless() -> Self {
        Self {
            interactive: false,
            restored: true,
            caps: TerminalCapabilities::detect(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn capabilities(&self) -> TerminalCapabilities {
        self.caps
    }

    /// Current size in (columns, rows). Headless sessions and failed
    /// queries report `FALLBACK_SIZE`.
    pub fn size(&self) -> (u16, u16) {
        if self.interactive {
            crossterm::terminal::size().unwrap_or(FALLBACK_SIZE)
        } else {
            FALLBACK_SIZE
        }
    }

    /// Restore the terminal. Idempotent; also runs on drop so an early
    /// return or panic cannot strand the user in the alternate screen.
    pub fn release(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.release();
    }
}
