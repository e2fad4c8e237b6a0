//! Zone layer: borders, titles, and buffer windows.
//!
//! Zones render in registry order (creation order), so a later zone paints
//! over an earlier one cell-by-cell where they overlap. Each zone draws a
//! border carrying its name and type tag, then its inner content: the
//! buffer tail window, the clipboard projection, or a PTY screen snapshot
//! taken under a short lock.

use core_canvas::{Cell, Color, StyledLine};
use core_events::ZoneRunState;
use core_state::{Clipboard, Viewport};
use core_zones::Zone;

use crate::frame::Frame;

const BORDER_IDLE: Color = Color::Ansi(8);
const BORDER_FOCUSED: Color = Color::Ansi(14);
const BORDER_ERROR: Color = Color::Ansi(9);
const BORDER_PAUSED: Color = Color::Ansi(11);

pub fn draw_zones(
    frame: &mut Frame,
    viewport: &Viewport,
    zones: &[Zone],
    clipboard: &Clipboard,
    focused: Option<&str>,
) {
    for zone in zones {
        let is_focused = focused.is_some_and(|name| name.eq_ignore_ascii_case(zone.name()));
        draw_zone(frame, viewport, zone, clipboard, is_focused);
    }
}

fn border_color(zone: &Zone, focused: bool) -> Color {
    if focused {
        return BORDER_FOCUSED;
    }
    match zone.state {
        ZoneRunState::Error(_) => BORDER_ERROR,
        ZoneRunState::Paused => BORDER_PAUSED,
        _ => BORDER_IDLE,
    }
}

/// State suffix shown after the type tag: `!` error, `=` paused.
fn state_mark(zone: &Zone) -> &'static str {
    match zone.state {
        ZoneRunState::Error(_) => "!",
        ZoneRunState::Paused => "=",
        _ => "",
    }
}

fn put(frame: &mut Frame, viewport: &Viewport, cx: i64, cy: i64, cell: Cell) {
    if let Some((sx, sy)) = viewport.canvas_to_screen(cx, cy) {
        frame.set(sx, sy, cell);
    }
}

fn draw_zone(
    frame: &mut Frame,
    viewport: &Viewport,
    zone: &Zone,
    clipboard: &Clipboard,
    focused: bool,
) {
    let (x, y, w, h) = (zone.spec.x, zone.spec.y, zone.spec.width, zone.spec.height);
    if w < 2 || h < 2 {
        return;
    }
    let color = border_color(zone, focused);
    let (x2, y2) = (x + w - 1, y + h - 1);

    for cx in x + 1..x2 {
        put(frame, viewport, cx, y, Cell::styled('─', color, Color::Default));
        put(frame, viewport, cx, y2, Cell::styled('─', color, Color::Default));
    }
    for cy in y + 1..y2 {
        put(frame, viewport, x, cy, Cell::styled('│', color, Color::Default));
        put(frame, viewport, x2, cy, Cell::styled('│', color, Color::Default));
    }
    put(frame, viewport, x, y, Cell::styled('┌', color, Color::Default));
    put(frame, viewport, x2, y, Cell::styled('┐', color, Color::Default));
    put(frame, viewport, x, y2, Cell::styled('└', color, Color::Default));
    put(frame, viewport, x2, y2, Cell::styled('┘', color, Color::Default));

    // Title: ` name [T] ` clipped to the top edge.
    let title = format!(" {} [{}{}] ", zone.name(), zone.spec.config.tag(), state_mark(zone));
    for (i, ch) in title.chars().enumerate() {
        let cx = x + 1 + i as i64;
        if cx >= x2 {
            break;
        }
        put(frame, viewport, cx, y, Cell::styled(ch, color, Color::Default));
    }

    let inner_w = zone.inner_width();
    let inner_h = zone.inner_height();
    if inner_w == 0 || inner_h == 0 {
        return;
    }

    let (lines, cursor) = zone_content(zone, clipboard, inner_h);
    for (row, line) in lines.iter().enumerate() {
        let cells = line.to_cells(inner_w);
        for (col, cell) in cells.into_iter().enumerate() {
            put(
                frame,
                viewport,
                x + 1 + col as i64,
                y + 1 + row as i64,
                cell,
            );
        }
    }
    // Blank out rows below short content so stale canvas cells cannot
    // show through the zone interior.
    for row in lines.len()..inner_h {
        for col in 0..inner_w {
            put(
                frame,
                viewport,
                x + 1 + col as i64,
                y + 1 + row as i64,
                Cell::styled(' ', Color::Default, Color::Default),
            );
        }
    }

    if focused
        && let Some((crow, ccol)) = cursor
        && let Some((sx, sy)) = viewport.canvas_to_screen(x + 1 + ccol as i64, y + 1 + crow as i64)
    {
        frame.invert(sx, sy);
    }
}

/// Inner content lines plus, for live PTY screens, the emulator cursor.
fn zone_content(
    zone: &Zone,
    clipboard: &Clipboard,
    inner_h: usize,
) -> (Vec<StyledLine>, Option<(u16, u16)>) {
    if let Some(screen) = zone.screen() {
        let mut s = screen.lock().expect("pty screen lock poisoned");
        let lines = s.visible_lines();
        let cursor = (s.scrollback() == 0).then(|| s.cursor_position());
        return (lines.into_iter().take(inner_h).collect(), cursor);
    }
    if matches!(zone.spec.config, core_zones::ZoneConfig::Clipboard) {
        let lines = clipboard
            .rows()
            .iter()
            .map(|row| {
                let mut line = StyledLine::default();
                for cell in row {
                    line.push(core_canvas::Span::styled(
                        cell.ch.to_string(),
                        cell.fg,
                        cell.bg,
                    ));
                }
                line
            })
            .take(inner_h)
            .collect();
        return (lines, None);
    }
    (zone.buffer.window(inner_h).cloned().collect(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::zone_event_channel;
    use core_zones::{ZoneConfig, ZoneManager, ZoneSpec};

    fn manager_with_static() -> ZoneManager {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(ZoneSpec {
            name: "log".to_string(),
            x: 2,
            y: 1,
            width: 12,
            height: 4,
            config: ZoneConfig::Static,
            bookmark: None,
            description: None,
        })
        .unwrap();
        mgr
    }

    #[test]
    fn border_and_title_rendered() {
        let mut mgr = manager_with_static();
        mgr.set_buffer_lines("log", vec![StyledLine::plain("hello")])
            .unwrap();
        let vp = Viewport::new(30, 10);
        let mut frame = Frame::new(30, 10);
        draw_zones(
            &mut frame,
            &vp,
            mgr.zones(),
            &Clipboard::new(),
            None,
        );
        let text = frame.to_text();
        assert!(text.contains("┌ log [S]"), "title row missing:\n{text}");
        assert!(text.contains("│hello"), "content row missing:\n{text}");
        assert!(text.contains('└'));
    }

    #[test]
    fn buffer_tail_window_shown() {
        let mut mgr = manager_with_static();
        let lines: Vec<StyledLine> = (0..10).map(|i| StyledLine::plain(format!("l{i}"))).collect();
        mgr.set_buffer_lines("log", lines).unwrap();
        let vp = Viewport::new(30, 10);
        let mut frame = Frame::new(30, 10);
        draw_zones(&mut frame, &vp, mgr.zones(), &Clipboard::new(), None);
        let text = frame.to_text();
        // Inner height 2: last two lines visible.
        assert!(text.contains("l8"));
        assert!(text.contains("l9"));
        assert!(!text.contains("l7"));
    }

    #[test]
    fn later_zone_wins_overlap() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        for (name, x) in [("under", 0), ("over", 2)] {
            mgr.create(ZoneSpec {
                name: name.to_string(),
                x,
                y: 0,
                width: 10,
                height: 4,
                config: ZoneConfig::Static,
                bookmark: None,
                description: None,
            })
            .unwrap();
        }
        let vp = Viewport::new(30, 10);
        let mut frame = Frame::new(30, 10);
        draw_zones(&mut frame, &vp, mgr.zones(), &Clipboard::new(), None);
        // The top-left corner of the later zone overwrote the earlier
        // zone's top edge.
        assert_eq!(frame.get(2, 0).ch, '┌');
    }

    #[test]
    fn clipboard_zone_projects_buffer() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(ZoneSpec {
            name: "clip".to_string(),
            x: 0,
            y: 0,
            width: 10,
            height: 4,
            config: ZoneConfig::Clipboard,
            bookmark: None,
            description: None,
        })
        .unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.from_text("AB\nCD\n");
        let vp = Viewport::new(20, 8);
        let mut frame = Frame::new(20, 8);
        draw_zones(&mut frame, &vp, mgr.zones(), &clipboard, None);
        let text = frame.to_text();
        assert!(text.contains("AB"));
        assert!(text.contains("CD"));
    }

    #[test]
    fn interior_masks_underlying_content() {
        let mgr = manager_with_static();
        let vp = Viewport::new(30, 10);
        let mut frame = Frame::new(30, 10);
        // Pretend canvas content was already painted inside the zone area.
        frame.set(5, 2, Cell::new('X'));
        draw_zones(&mut frame, &vp, mgr.zones(), &Clipboard::new(), None);
        assert_eq!(frame.get(5, 2).ch, ' ');
    }

    #[test]
    fn degenerate_zone_skipped() {
        let (tx, _rx) = zone_event_channel();
        let mut mgr = ZoneManager::new(tx, false);
        mgr.create(ZoneSpec {
            name: "thin".to_string(),
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            config: ZoneConfig::Static,
            bookmark: None,
            description: None,
        })
        .unwrap();
        let vp = Viewport::new(10, 5);
        let mut frame = Frame::new(10, 5);
        draw_zones(&mut frame, &vp, mgr.zones(), &Clipboard::new(), None);
        assert_eq!(frame.to_text().trim(), "");
    }
}
