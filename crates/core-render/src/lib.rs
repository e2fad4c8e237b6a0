//! Frame composition.
//!
//! `compose` builds the complete picture for one redraw: grid overlay,
//! canvas cells, zones (creation order), VISUAL selection, cursor, and the
//! status line on the last row. The result is a plain cell grid the writer
//! paints in one pass; everything here is pure with respect to the terminal
//! and fully testable off-screen.

use core_canvas::Cell;
use core_state::{AppState, Mode};
use core_zones::ZoneManager;

pub mod frame;
pub mod grid;
pub mod status;
pub mod writer;
pub mod zones;

pub use frame::Frame;
pub use status::{StatusContext, build_status};

/// Compose a full frame: the viewport content area plus one status row.
pub fn compose(state: &AppState, zone_mgr: &ZoneManager) -> Frame {
    let vp = &state.viewport;
    let mut frame = Frame::new(vp.width, vp.height + 1);

    grid::draw_grid(&mut frame, vp, &state.grid);

    // Canvas layer: iterate sparse content, not the window, so a huge
    // viewport over a small drawing costs what the drawing costs.
    for (&(cx, cy), cell) in state.canvas.iter() {
        if let Some((sx, sy)) = vp.canvas_to_screen(cx, cy) {
            frame.set(sx, sy, *cell);
        }
    }

    zones::draw_zones(
        &mut frame,
        vp,
        zone_mgr.zones(),
        &state.clipboard,
        state.focused_zone.as_deref(),
    );

    if let Some((x, y, w, h)) = state.selection_rect() {
        for cy in y..y + h {
            for cx in x..x + w {
                if let Some((sx, sy)) = vp.canvas_to_screen(cx, cy) {
                    frame.invert(sx, sy);
                }
            }
        }
    }

    // The canvas cursor hides while a PTY zone owns input (the zone draws
    // its own).
    if state.mode != Mode::PtyFocused
        && let Some((sx, sy)) = vp.canvas_to_screen(vp.cursor_x, vp.cursor_y)
    {
        frame.invert(sx, sy);
    }

    let status_row = vp.height;
    let focused_scroll = state
        .focused_zone
        .as_deref()
        .and_then(|name| zone_mgr.get(name))
        .map(|z| z.scroll_status());
    let file_name = state
        .file_path
        .as_deref()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str());
    let ctx = StatusContext {
        mode: state.mode,
        cursor: state.viewport.cursor_relative(),
        cell_count: state.canvas.count(),
        zone_count: zone_mgr.len(),
        file_name,
        dirty: state.dirty,
        command_active: state.mode == Mode::Command,
        command_buffer: &state.command_line.buffer,
        message: state.ephemeral_message(),
        selection: state
            .selection_rect()
            .map(|(_, _, w, h)| (w, h)),
        pen: (state.mode == Mode::Draw).then(|| (state.pen.down, state.border_style.name())),
        term: None,
    };
    let mut line = build_status(&ctx);
    if let (Mode::PtyFocused, Some(zone), Some(scroll)) = (
        state.mode,
        state.focused_zone.as_deref(),
        focused_scroll.as_deref(),
    ) {
        line = build_status(&StatusContext {
            term: Some((zone, scroll)),
            ..ctx
        });
    }
    for (i, ch) in line.chars().enumerate() {
        if i as u16 >= frame.width() {
            break;
        }
        frame.set(
            i as u16,
            status_row,
            Cell::styled(ch, core_canvas::Color::Ansi(15), core_canvas::Color::Ansi(8)),
        );
    }
    for x in line.chars().count() as u16..frame.width() {
        frame.set(
            x,
            status_row,
            Cell::styled(' ', core_canvas::Color::Ansi(15), core_canvas::Color::Ansi(8)),
        );
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_canvas::Color;
    use core_events::zone_event_channel;

    fn state_with(width: u16, height: u16) -> AppState {
        let mut st = AppState::new();
        st.viewport.resize(width, height);
        st
    }

    fn empty_zones() -> ZoneManager {
        let (tx, _rx) = zone_event_channel();
        ZoneManager::new(tx, false)
    }

    #[test]
    fn canvas_content_lands_in_frame() {
        let mut st = state_with(20, 6);
        st.grid.line_mode = core_state::LineMode::Off;
        st.grid.show_origin = false;
        st.canvas
            .write_text(2, 1, "hi", Color::Default, Color::Default);
        let frame = compose(&st, &empty_zones());
        assert_eq!(frame.get(2, 1).ch, 'h');
        assert_eq!(frame.get(3, 1).ch, 'i');
    }

    #[test]
    fn status_line_on_last_row() {
        let st = state_with(40, 5);
        let frame = compose(&st, &empty_zones());
        assert_eq!(frame.height(), 6);
        let row: String = (0..frame.width()).map(|x| frame.get(x, 5).ch).collect();
        assert!(row.starts_with("[NAV]"));
    }

    #[test]
    fn cursor_cell_inverted() {
        let mut st = state_with(10, 4);
        st.grid.line_mode = core_state::LineMode::Off;
        st.grid.show_origin = false;
        let frame = compose(&st, &empty_zones());
        let cell = frame.get(0, 0);
        assert_eq!(cell.bg, Color::Ansi(7));
    }

    #[test]
    fn selection_highlight_covers_rect() {
        let mut st = state_with(10, 6);
        st.grid.line_mode = core_state::LineMode::Off;
        st.grid.show_origin = false;
        st.mode = Mode::Visual;
        st.visual_anchor = Some((1, 1));
        st.viewport.set_cursor(3, 2);
        let frame = compose(&st, &empty_zones());
        // A cell inside the selection (not under the cursor) is inverted.
        assert_eq!(frame.get(2, 1).bg, Color::Ansi(7));
        // The cursor cell was inverted twice: explicit white-on-black.
        assert_eq!(frame.get(3, 2).bg, Color::Ansi(0));
    }

    #[test]
    fn offscreen_canvas_cells_clipped() {
        let mut st = state_with(10, 4);
        st.canvas
            .write_text(500, 500, "far", Color::Default, Color::Default);
        let frame = compose(&st, &empty_zones());
        assert!(!frame.to_text().contains("far"));
    }
}
