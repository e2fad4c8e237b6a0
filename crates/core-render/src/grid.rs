//! Grid overlay layer.
//!
//! Drawn first so canvas content and zones paint over it. All interval
//! arithmetic is relative to the origin marker, and the overlay is computed
//! per visible screen cell; the canvas being infinite, there is nothing to
//! precompute globally.

use core_canvas::{Cell, Color};
use core_state::{GridSettings, LineMode, Viewport};

use crate::frame::Frame;

/// Dim color used for all overlay glyphs.
const GRID_COLOR: Color = Color::Ansi(8);

pub fn draw_grid(frame: &mut Frame, viewport: &Viewport, grid: &GridSettings) {
    let (ox, oy) = (viewport.origin_marker_x, viewport.origin_marker_y);
    for sy in 0..viewport.height {
        for sx in 0..viewport.width {
            let (cx, cy) = viewport.screen_to_canvas(sx, sy);
            let on_major_x = grid.on_major(cx, ox);
            let on_major_y = grid.on_major(cy, oy);
            let on_minor_x = grid.on_minor(cx, ox);
            let on_minor_y = grid.on_minor(cy, oy);
            let glyph = match grid.line_mode {
                LineMode::Off => None,
                LineMode::Markers => {
                    if on_major_x && on_major_y {
                        Some('+')
                    } else if on_minor_x && on_minor_y {
                        Some('·')
                    } else {
                        None
                    }
                }
                LineMode::Lines => {
                    if on_major_x && on_major_y {
                        Some('┼')
                    } else if on_major_x {
                        Some('│')
                    } else if on_major_y {
                        Some('─')
                    } else if on_minor_x && on_minor_y {
                        Some('·')
                    } else {
                        None
                    }
                }
                LineMode::Dots => {
                    if (on_major_x && on_major_y) || (on_minor_x && on_minor_y) {
                        Some('·')
                    } else {
                        None
                    }
                }
            };
            if let Some(ch) = glyph {
                frame.set(sx, sy, Cell::styled(ch, GRID_COLOR, Color::Default));
            }
        }
    }

    if grid.show_labels {
        draw_labels(frame, viewport, grid);
    }
    if grid.show_rulers {
        draw_rulers(frame, viewport, grid);
    }
    if grid.show_origin
        && let Some((sx, sy)) = viewport.canvas_to_screen(ox, oy)
    {
        frame.set(sx, sy, Cell::styled('◆', Color::Ansi(3), Color::Default));
    }
}

/// Coordinate labels at label-interval crossings, e.g. `(20,-10)`.
fn draw_labels(frame: &mut Frame, viewport: &Viewport, grid: &GridSettings) {
    let step = grid.label_interval.max(1);
    let (ox, oy) = (viewport.origin_marker_x, viewport.origin_marker_y);
    for sy in 0..viewport.height {
        for sx in 0..viewport.width {
            let (cx, cy) = viewport.screen_to_canvas(sx, sy);
            if (cx - ox).rem_euclid(step) == 0
                && (cy - oy).rem_euclid(step) == 0
                && !(cx == ox && cy == oy)
            {
                let label = format!("({},{})", cx - ox, cy - oy);
                frame.write_str(sx, sy, &label, GRID_COLOR, Color::Default);
            }
        }
    }
}

/// Edge rulers: column coordinates along the top row, row coordinates down
/// the left edge, ticked at the major interval.
fn draw_rulers(frame: &mut Frame, viewport: &Viewport, grid: &GridSettings) {
    let (ox, oy) = (viewport.origin_marker_x, viewport.origin_marker_y);
    for sx in 0..viewport.width {
        let (cx, _) = viewport.screen_to_canvas(sx, 0);
        if grid.on_major(cx, ox) {
            let label = (cx - ox).to_string();
            frame.write_str(sx, 0, &label, Color::Ansi(6), Color::Default);
        }
    }
    for sy in 0..viewport.height {
        let (_, cy) = viewport.screen_to_canvas(0, sy);
        if grid.on_major(cy, oy) {
            let label = (cy - oy).to_string();
            frame.write_str(0, sy, &label, Color::Ansi(6), Color::Default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(mode: LineMode) -> (Frame, Viewport, GridSettings) {
        let mut vp = Viewport::new(21, 11);
        vp.set_scroll_origin(0, 0);
        let mut grid = GridSettings::default();
        grid.set_major(10);
        grid.line_mode = mode;
        grid.show_origin = true;
        (Frame::new(21, 12), vp, grid)
    }

    #[test]
    fn markers_only_at_crossings() {
        let (mut frame, vp, grid) = setup(LineMode::Markers);
        draw_grid(&mut frame, &vp, &grid);
        // Origin glyph overrides the (0,0) crossing.
        assert_eq!(frame.get(0, 0).ch, '◆');
        assert_eq!(frame.get(10, 0).ch, '+');
        assert_eq!(frame.get(10, 10).ch, '+');
        assert_eq!(frame.get(5, 0).ch, ' ');
    }

    #[test]
    fn lines_draw_full_rows_and_columns() {
        let (mut frame, vp, grid) = setup(LineMode::Lines);
        draw_grid(&mut frame, &vp, &grid);
        assert_eq!(frame.get(10, 3).ch, '│');
        assert_eq!(frame.get(3, 10).ch, '─');
        assert_eq!(frame.get(10, 10).ch, '┼');
    }

    #[test]
    fn off_draws_only_origin() {
        let (mut frame, vp, grid) = setup(LineMode::Off);
        draw_grid(&mut frame, &vp, &grid);
        let text = frame.to_text();
        assert_eq!(text.matches('◆').count(), 1);
        assert!(!text.contains('+'));
    }

    #[test]
    fn minor_crossings_with_dots() {
        let (mut frame, vp, mut grid) = setup(LineMode::Markers);
        grid.set_minor(Some(5));
        draw_grid(&mut frame, &vp, &grid);
        assert_eq!(frame.get(5, 5).ch, '·');
        assert_eq!(frame.get(10, 10).ch, '+');
    }

    #[test]
    fn origin_marker_respects_toggle() {
        let (mut frame, vp, mut grid) = setup(LineMode::Off);
        grid.show_origin = false;
        draw_grid(&mut frame, &vp, &grid);
        assert!(!frame.to_text().contains('◆'));
    }

    #[test]
    fn labels_are_marker_relative() {
        let (mut frame, mut vp, mut grid) = setup(LineMode::Off);
        grid.show_labels = true;
        grid.label_interval = 10;
        vp.set_origin_marker(100, 50);
        vp.set_scroll_origin(100, 50);
        draw_grid(&mut frame, &vp, &grid);
        let text = frame.to_text();
        assert!(text.contains("(10,10)"), "relative label expected:\n{text}");
        assert!(!text.contains("(110,"), "labels must not use absolute coords");
    }
}
