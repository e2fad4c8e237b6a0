//! Terminal screen for PTY zones.
//!
//! `TermScreen` wraps a `vt100::Parser`: the parser implements the VT100/
//! ANSI subset (cursor motion, erase, SGR, wrap modes) and keeps a bounded
//! scrollback of lines pushed off the top. This type owns the translation
//! into the workspace's styled-line vocabulary and the scrollback window
//! arithmetic used by the renderer and the focus keybindings.
//!
//! The handler thread feeds bytes; the application loop snapshots lines for
//! rendering. Both sides go through an `Arc<Mutex<TermScreen>>` with short
//! critical sections.

use core_canvas::{Color, Span, StyledLine};
use vt100::Parser;

pub struct TermScreen {
    parser: Parser,
}

impl TermScreen {
    pub fn new(rows: u16, cols: u16, scrollback: usize) -> Self {
        Self {
            parser: Parser::new(rows.max(1), cols.max(1), scrollback),
        }
    }

    /// Feed raw bytes from the PTY master.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.parser.set_size(rows.max(1), cols.max(1));
    }

    pub fn size(&self) -> (u16, u16) {
        self.parser.screen().size()
    }

    /// Cursor as (row, col) on the current screen.
    pub fn cursor_position(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }

    /// Lines currently visible, honoring the scrollback offset. Offset 0 is
    /// the live screen; larger offsets reveal history above it.
    pub fn visible_lines(&self) -> Vec<StyledLine> {
        let screen = self.parser.screen();
        let (rows, cols) = screen.size();
        let mut out = Vec::with_capacity(rows as usize);
        for row in 0..rows {
            let mut line = StyledLine::default();
            for col in 0..cols {
                let Some(cell) = screen.cell(row, col) else {
                    continue;
                };
                let contents = cell.contents();
                let text = if contents.is_empty() {
                    " ".to_string()
                } else {
                    contents
                };
                line.push(Span::styled(
                    text,
                    map_color(cell.fgcolor()),
                    map_color(cell.bgcolor()),
                ));
            }
            out.push(line);
        }
        out
    }

    pub fn scrollback(&self) -> usize {
        self.parser.screen().scrollback()
    }

    pub fn set_scrollback(&mut self, offset: usize) {
        self.parser.set_scrollback(offset);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let current = self.parser.screen().scrollback();
        self.parser.set_scrollback(current.saturating_add(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let current = self.parser.screen().scrollback();
        self.parser.set_scrollback(current.saturating_sub(lines));
    }

    pub fn scroll_to_top(&mut self) {
        self.parser.set_scrollback(usize::MAX);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.parser.set_scrollback(0);
    }

    /// Number of history lines available above the live screen. Probes by
    /// pinning the offset to the maximum and restoring it.
    pub fn history_len(&mut self) -> usize {
        let saved = self.parser.screen().scrollback();
        self.parser.set_scrollback(usize::MAX);
        let total = self.parser.screen().scrollback();
        self.parser.set_scrollback(saved);
        total
    }

    /// Plain-text screen contents (tests and diagnostics).
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }
}

fn map_color(color: vt100::Color) -> Color {
    match color {
        vt100::Color::Default => Color::Default,
        vt100::Color::Idx(n) => Color::Ansi(n),
        // Truecolor is folded onto the 6x6x6 cube; close enough for zone
        // rendering, which only speaks 256 colors.
        vt100::Color::Rgb(r, g, b) => {
            let q = |v: u8| (v as u16 * 5 / 255) as u8;
            Color::Ansi(16 + 36 * q(r) + 6 * q(g) + q(b))
        }
    }
}
