//! Terminal frame writer.
//!
//! Paints a composed frame with queued crossterm commands and a single
//! flush. Color changes are coalesced per run; at <=20 FPS a full repaint is
//! well inside the budget, which keeps this free of diffing state.

use std::io::Write;

use core_canvas::Color;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color as CtColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::frame::Frame;

fn ct_color(color: Color) -> CtColor {
    match color {
        Color::Default => CtColor::Reset,
        Color::Ansi(n) => CtColor::AnsiValue(n),
    }
}

/// Paint the whole frame to `out`.
pub fn paint(frame: &Frame, out: &mut impl Write) -> std::io::Result<()> {
    queue!(out, ResetColor)?;
    let mut last_fg = Color::Default;
    let mut last_bg = Color::Default;
    for (y, row) in frame.rows().enumerate() {
        queue!(out, MoveTo(0, y as u16))?;
        for cell in row {
            if cell.fg != last_fg {
                queue!(out, SetForegroundColor(ct_color(cell.fg)))?;
                last_fg = cell.fg;
            }
            if cell.bg != last_bg {
                queue!(out, SetBackgroundColor(ct_color(cell.bg)))?;
                last_bg = cell.bg;
            }
            queue!(out, Print(cell.ch))?;
        }
    }
    queue!(out, ResetColor)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_canvas::Cell;

    #[test]
    fn paint_emits_every_cell() {
        let mut frame = Frame::new(3, 2);
        frame.set(0, 0, Cell::new('a'));
        frame.set(2, 1, Cell::styled('b', Color::Ansi(1), Color::Default));
        let mut out: Vec<u8> = Vec::new();
        paint(&frame, &mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('a'));
        assert!(text.contains('b'));
    }

    #[test]
    fn color_runs_are_coalesced() {
        let mut frame = Frame::new(4, 1);
        for x in 0..4 {
            frame.set(x, 0, Cell::styled('x', Color::Ansi(2), Color::Default));
        }
        let mut out: Vec<u8> = Vec::new();
        paint(&frame, &mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        // One foreground change for the whole run (38;5;2 appears once).
        assert_eq!(text.matches("38;5;2").count(), 1);
    }
}
