//! Application state: canvas, viewport, bookmarks, clipboard, mode, and the
//! per-session editing context.
//!
//! `AppState` is owned and mutated exclusively by the application loop. Zone
//! handlers never touch it; they post events that the loop applies. Keeping
//! every mutable piece behind one struct makes command execution atomic from
//! the loop's perspective.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use core_canvas::{BorderStyle, Canvas, Color};

pub mod bookmarks;
pub mod clipboard;
pub mod grid;
pub mod viewport;

pub use bookmarks::{Bookmarks, valid_key};
pub use clipboard::Clipboard;
pub use grid::{GridSettings, LineMode};
pub use viewport::{Viewport, YDirection};

/// Input-handling regimes. `PtyFocused` is the pseudo-mode in which a PTY
/// zone captures the input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Nav,
    Pan,
    Edit,
    Command,
    MarkSet,
    MarkJump,
    Visual,
    Draw,
    PtyFocused,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Nav => "NAV",
            Mode::Pan => "PAN",
            Mode::Edit => "EDIT",
            Mode::Command => "COMMAND",
            Mode::MarkSet => "MARK",
            Mode::MarkJump => "JUMP",
            Mode::Visual => "VISUAL",
            Mode::Draw => "DRAW",
            Mode::PtyFocused => "TERM",
        }
    }
}

/// Command-line buffer with an editing cursor (char index).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub buffer: String,
    pub cursor: usize,
}

impl CommandLine {
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, ch: char) {
        let byte = self.byte_at(self.cursor);
        self.buffer.insert(byte, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let byte = self.byte_at(self.cursor - 1);
        self.buffer.remove(byte);
        self.cursor -= 1;
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.buffer.len())
    }
}

/// Active drawing colors. `reset` returns both to terminal defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorState {
    pub fg: Color,
    pub bg: Color,
}

impl ColorState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        self.fg == Color::Default && self.bg == Color::Default
    }
}

/// DRAW-mode pen state.
///
/// `strokes` accumulates the connectivity mask drawn at each cell during
/// the current DRAW session. Glyphs alone cannot carry a single-direction
/// stamp (a lone east stroke renders as the full horizontal glyph), so the
/// mask map is the source of truth for corner and junction merging; cells
/// not in the map fall back to the mask implied by their glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PenState {
    pub down: bool,
    pub last_step: Option<(i64, i64)>,
    pub strokes: std::collections::HashMap<(i64, i64), u8>,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub canvas: Canvas,
    pub viewport: Viewport,
    pub grid: GridSettings,
    pub bookmarks: Bookmarks,
    pub clipboard: Clipboard,
    pub mode: Mode,
    pub command_line: CommandLine,
    pub color: ColorState,
    pub border_style: BorderStyle,
    pub pen: PenState,
    /// VISUAL-mode anchor; the selection's other corner is the cursor.
    pub visual_anchor: Option<(i64, i64)>,
    /// Zone currently holding the input channel (PTY focus).
    pub focused_zone: Option<String>,
    pub file_path: Option<PathBuf>,
    /// Creation timestamp carried across save/load so re-saving a project
    /// preserves its original `created_iso`.
    pub project_created_iso: Option<String>,
    pub dirty: bool,
    ephemeral: Option<(String, Instant)>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a transient status-line message for `ttl`.
    pub fn set_ephemeral(&mut self, message: impl Into<String>, ttl: Duration) {
        self.ephemeral = Some((message.into(), Instant::now() + ttl));
    }

    /// Current ephemeral message, if not yet expired.
    pub fn ephemeral_message(&self) -> Option<&str> {
        match &self.ephemeral {
            Some((msg, deadline)) if Instant::now() < *deadline => Some(msg),
            _ => None,
        }
    }

    pub fn clear_ephemeral(&mut self) {
        self.ephemeral = None;
    }

    /// Normalized VISUAL selection rectangle `(x, y, w, h)`; `None` outside
    /// VISUAL mode. Normalization uses min/max per axis each call so the
    /// rectangle stays valid while the cursor crosses the anchor.
    pub fn selection_rect(&self) -> Option<(i64, i64, i64, i64)> {
        let (ax, ay) = self.visual_anchor?;
        let (cx, cy) = (self.viewport.cursor_x, self.viewport.cursor_y);
        let x = ax.min(cx);
        let y = ay.min(cy);
        Some((x, y, (ax - cx).abs() + 1, (ay - cy).abs() + 1))
    }
}
