//! The mode state machine.
//!
//! `process_input` is the single entry point for foreground input: it
//! mutates `AppState` for everything a mode handles directly (motion,
//! cell editing, marks, selection, pen strokes) and returns command lines
//! for the executor when a mode produces one (COMMAND's Enter, VISUAL's
//! fill prompt). PTY focus forwards keys to the zone's handler, keeping the
//! interception set (Esc and the Shift-scrollback chords) for itself.
//!
//! Transition map (initial mode NAV):
//! NAV --i/p/v/D/:/m/'--> EDIT/PAN/VISUAL/DRAW/COMMAND/MARK_SET/MARK_JUMP;
//! every non-NAV mode returns to NAV on Esc; MARK_* return after one key;
//! COMMAND returns on Enter (executing) or Esc (discarding).

use core_canvas::border::{mask_of_glyph, step_masks};
use core_canvas::{BorderStyle, Cell};
use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers};
use core_state::{AppState, Mode, valid_key};
use core_zones::ZoneManager;

use crate::keycodes::encode_key;

/// What one input event produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InputOutcome {
    pub consumed: bool,
    pub redraw: bool,
    /// Command lines for the shared executor, in order.
    pub commands: Vec<String>,
    pub quit: bool,
}

impl InputOutcome {
    fn redraw() -> Self {
        Self {
            consumed: true,
            redraw: true,
            ..Self::default()
        }
    }

    fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }
}

/// Step vector for a movement key: screen-relative (dx, dy) already scaled
/// by the Shift 10x convention. Uppercase WASD carry the shift themselves;
/// `D` is excluded because it enters DRAW from NAV.
fn movement(key: &KeyEvent) -> Option<(i64, i64)> {
    let scale = if key.mods.contains(KeyModifiers::SHIFT) {
        10
    } else {
        1
    };
    let (dx, dy) = match key.code {
        KeyCode::Char('w') => (0, -1),
        KeyCode::Char('s') => (0, 1),
        KeyCode::Char('a') => (-1, 0),
        KeyCode::Char('d') => (1, 0),
        KeyCode::Char('W') => (0, -10),
        KeyCode::Char('S') => (0, 10),
        KeyCode::Char('A') => (-10, 0),
        KeyCode::Up => (0, -scale),
        KeyCode::Down => (0, scale),
        KeyCode::Left => (-scale, 0),
        KeyCode::Right => (scale, 0),
        _ => return None,
    };
    Some((dx, dy))
}

pub fn process_input(
    event: &InputEvent,
    state: &mut AppState,
    zones: &mut ZoneManager,
) -> InputOutcome {
    match event {
        InputEvent::Resize(cols, rows) => {
            // One row is reserved for the status line.
            state.viewport.resize(*cols, rows.saturating_sub(1).max(1));
            InputOutcome::redraw()
        }
        InputEvent::Paste(text) => handle_paste(text, state),
        InputEvent::Key(key) => match state.mode {
            Mode::Nav => nav_key(key, state),
            Mode::Pan => pan_key(key, state),
            Mode::Edit => edit_key(key, state),
            Mode::Command => command_key(key, state),
            Mode::MarkSet => mark_set_key(key, state),
            Mode::MarkJump => mark_jump_key(key, state),
            Mode::Visual => visual_key(key, state),
            Mode::Draw => draw_key(key, state),
            Mode::PtyFocused => pty_key(key, state, zones),
        },
    }
}

fn enter_mode(state: &mut AppState, mode: Mode) {
    if mode != Mode::Visual {
        state.visual_anchor = None;
    }
    if mode != Mode::Draw {
        state.pen = Default::default();
    }
    if mode != Mode::PtyFocused {
        state.focused_zone = None;
    }
    state.mode = mode;
}

fn nav_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    if let Some((dx, dy)) = movement(key) {
        state.viewport.move_cursor(dx, dy);
        return InputOutcome::redraw();
    }
    match key.code {
        KeyCode::Char('i') => {
            enter_mode(state, Mode::Edit);
            InputOutcome::redraw()
        }
        KeyCode::Char('p') => {
            enter_mode(state, Mode::Pan);
            InputOutcome::redraw()
        }
        KeyCode::Char('v') => {
            enter_mode(state, Mode::Visual);
            state.visual_anchor = Some((state.viewport.cursor_x, state.viewport.cursor_y));
            InputOutcome::redraw()
        }
        KeyCode::Char('D') => {
            enter_mode(state, Mode::Draw);
            InputOutcome::redraw()
        }
        KeyCode::Char(':') | KeyCode::Char('/') => {
            enter_mode(state, Mode::Command);
            state.command_line.reset();
            InputOutcome::redraw()
        }
        KeyCode::Char('m') => {
            enter_mode(state, Mode::MarkSet);
            InputOutcome::redraw()
        }
        KeyCode::Char('\'') => {
            enter_mode(state, Mode::MarkJump);
            InputOutcome::redraw()
        }
        KeyCode::Esc => InputOutcome::consumed(),
        _ => InputOutcome::default(),
    }
}

fn pan_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    if let Some((dx, dy)) = movement(key) {
        state.viewport.pan(dx, dy, true);
        return InputOutcome::redraw();
    }
    match key.code {
        KeyCode::Esc => {
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        _ => InputOutcome::default(),
    }
}

fn edit_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    match key.code {
        KeyCode::Esc => {
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char(ch) if !key.mods.contains(KeyModifiers::CTRL) => {
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            state
                .canvas
                .set(x, y, Cell::styled(ch, state.color.fg, state.color.bg));
            state.viewport.move_cursor(1, 0);
            state.dirty = true;
            InputOutcome::redraw()
        }
        KeyCode::Backspace => {
            state.viewport.move_cursor(-1, 0);
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            state.canvas.set(x, y, Cell::default());
            state.dirty = true;
            InputOutcome::redraw()
        }
        KeyCode::Enter => {
            // Column-style editing: drop one row, keep x.
            state.viewport.move_cursor(0, 1);
            InputOutcome::redraw()
        }
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
            if let Some((dx, dy)) = movement(key) {
                state.viewport.move_cursor(dx, dy);
            }
            InputOutcome::redraw()
        }
        _ => InputOutcome::default(),
    }
}

/// Bracketed paste: meaningful only in EDIT, where it types the content
/// with newlines returning to the paste's start column.
fn handle_paste(text: &str, state: &mut AppState) -> InputOutcome {
    if state.mode != Mode::Edit {
        return InputOutcome::consumed();
    }
    let start_x = state.viewport.cursor_x;
    for ch in text.chars() {
        match ch {
            '\n' => {
                let y = state.viewport.cursor_y;
                state.viewport.set_cursor(start_x, y);
                state.viewport.move_cursor(0, 1);
            }
            '\r' => {}
            _ => {
                let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
                state
                    .canvas
                    .set(x, y, Cell::styled(ch, state.color.fg, state.color.bg));
                state.viewport.move_cursor(1, 0);
            }
        }
    }
    state.dirty = true;
    InputOutcome::redraw()
}

fn command_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    match key.code {
        KeyCode::Enter => {
            let line = state.command_line.buffer.clone();
            state.command_line.reset();
            enter_mode(state, Mode::Nav);
            let mut outcome = InputOutcome::redraw();
            if !line.trim().is_empty() {
                outcome.commands.push(line);
            }
            outcome
        }
        KeyCode::Esc => {
            state.command_line.reset();
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char(ch) => {
            state.command_line.insert(ch);
            InputOutcome::redraw()
        }
        KeyCode::Backspace => {
            state.command_line.backspace();
            InputOutcome::redraw()
        }
        KeyCode::Left => {
            state.command_line.left();
            InputOutcome::redraw()
        }
        KeyCode::Right => {
            state.command_line.right();
            InputOutcome::redraw()
        }
        KeyCode::Home => {
            state.command_line.home();
            InputOutcome::redraw()
        }
        KeyCode::End => {
            state.command_line.end();
            InputOutcome::redraw()
        }
        _ => InputOutcome::consumed(),
    }
}

fn mark_set_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    if let KeyCode::Char(ch) = key.code
        && valid_key(ch)
    {
        state
            .bookmarks
            .set(ch, state.viewport.cursor_x, state.viewport.cursor_y);
        state.set_ephemeral(
            format!("mark '{ch}' set"),
            std::time::Duration::from_secs(2),
        );
    }
    enter_mode(state, Mode::Nav);
    InputOutcome::redraw()
}

fn mark_jump_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    if let KeyCode::Char(ch) = key.code
        && let Some((x, y)) = state.bookmarks.get(ch)
    {
        state.viewport.set_cursor(x, y);
    }
    enter_mode(state, Mode::Nav);
    InputOutcome::redraw()
}

fn visual_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    // Operators take precedence over the overlapping wasd motions: 'd' is
    // clear-region here, so rightward extension uses the arrow key.
    match key.code {
        KeyCode::Esc => {
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char('y') => {
            if let Some((x, y, w, h)) = state.selection_rect() {
                state.clipboard.yank(&state.canvas, x, y, w, h);
                state.set_ephemeral(
                    format!("yanked {w}x{h}"),
                    std::time::Duration::from_secs(2),
                );
            }
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char('d') => {
            if let Some((x, y, w, h)) = state.selection_rect() {
                state.canvas.clear_region(x, y, w, h);
                state.dirty = true;
            }
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char('f') => {
            // Fill prompt: pre-seed the command line with the selection so
            // the user only types the glyph.
            if let Some((x, y, w, h)) = state.selection_rect() {
                enter_mode(state, Mode::Command);
                state.command_line.reset();
                for ch in format!("fill {x} {y} {w} {h} ").chars() {
                    state.command_line.insert(ch);
                }
            }
            InputOutcome::redraw()
        }
        _ => {
            if let Some((dx, dy)) = movement(key) {
                state.viewport.move_cursor(dx, dy);
                return InputOutcome::redraw();
            }
            InputOutcome::consumed()
        }
    }
}

fn draw_key(key: &KeyEvent, state: &mut AppState) -> InputOutcome {
    if let Some((dx, dy)) = movement(key) {
        draw_move(state, dx, dy);
        return InputOutcome::redraw();
    }
    match key.code {
        KeyCode::Esc => {
            enter_mode(state, Mode::Nav);
            InputOutcome::redraw()
        }
        KeyCode::Char(' ') => {
            state.pen.down = !state.pen.down;
            state.pen.last_step = None;
            InputOutcome::redraw()
        }
        KeyCode::Tab => {
            state.border_style = match state.border_style {
                BorderStyle::Ascii => BorderStyle::Unicode,
                BorderStyle::Unicode => BorderStyle::Rounded,
                BorderStyle::Rounded => BorderStyle::Double,
                BorderStyle::Double => BorderStyle::Heavy,
                BorderStyle::Heavy => BorderStyle::Ascii,
            };
            InputOutcome::redraw()
        }
        _ => InputOutcome::consumed(),
    }
}

/// Move in DRAW mode, stamping border segments cell-by-cell while the pen
/// is down. Each unit step adds the exit direction to the departing cell
/// and the entry direction to the arriving cell. The pen's stroke-mask map
/// carries exact connectivity (a glyph alone under-reports single-direction
/// stamps); cells outside the map merge with whatever border glyph already
/// sits there, which is what produces junctions with prior drawings.
fn draw_move(state: &mut AppState, dx: i64, dy: i64) {
    let steps = dx.abs().max(dy.abs());
    let unit = (dx.signum(), dy.signum());
    for _ in 0..steps {
        if state.pen.down {
            // Canvas-space step differs from the screen step when the Y
            // direction is flipped.
            let canvas_dy = match state.viewport.y_direction {
                core_state::YDirection::Down => unit.1,
                core_state::YDirection::Up => -unit.1,
            };
            let (exit, entry) = step_masks(unit.0, canvas_dy);
            let (x, y) = (state.viewport.cursor_x, state.viewport.cursor_y);
            stamp(state, x, y, exit);
            state.viewport.move_cursor(unit.0, unit.1);
            let (nx, ny) = (state.viewport.cursor_x, state.viewport.cursor_y);
            stamp(state, nx, ny, entry);
            state.pen.last_step = Some(unit);
            state.dirty = true;
        } else {
            state.viewport.move_cursor(unit.0, unit.1);
        }
    }
}

fn stamp(state: &mut AppState, x: i64, y: i64, add: u8) {
    let merged = match state.pen.strokes.get(&(x, y)) {
        Some(&mask) => mask | add,
        None => {
            let existing = state.canvas.get(x, y);
            match mask_of_glyph(existing.ch) {
                Some(mask) if !existing.is_blank() => mask | add,
                _ => add,
            }
        }
    };
    state.pen.strokes.insert((x, y), merged);
    state.canvas.set(
        x,
        y,
        Cell::styled(
            state.border_style.glyph_for_mask(merged),
            state.color.fg,
            state.color.bg,
        ),
    );
}

fn pty_key(key: &KeyEvent, state: &mut AppState, zones: &mut ZoneManager) -> InputOutcome {
    let Some(name) = state.focused_zone.clone() else {
        enter_mode(state, Mode::Nav);
        return InputOutcome::redraw();
    };
    let shifted = key.mods.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Esc => {
            enter_mode(state, Mode::Nav);
            return InputOutcome::redraw();
        }
        KeyCode::PageUp if shifted => {
            let page = zones.get(&name).map(|z| z.inner_height().max(1)).unwrap_or(5);
            let _ = zones.scroll(&name, page as i64);
            return InputOutcome::redraw();
        }
        KeyCode::PageDown if shifted => {
            let page = zones.get(&name).map(|z| z.inner_height().max(1)).unwrap_or(5);
            let _ = zones.scroll(&name, -(page as i64));
            return InputOutcome::redraw();
        }
        KeyCode::Home if shifted => {
            let _ = zones.scroll_to_top(&name);
            return InputOutcome::redraw();
        }
        KeyCode::End if shifted => {
            let _ = zones.scroll_to_bottom(&name);
            return InputOutcome::redraw();
        }
        _ => {}
    }

    let is_pty = zones.get(&name).is_some_and(|z| z.is_pty());
    if is_pty {
        if let Some(bytes) = encode_key(key) {
            if let Err(e) = zones.send(&name, &bytes) {
                state.set_ephemeral(e.to_string(), std::time::Duration::from_secs(3));
            }
            return InputOutcome::redraw();
        }
        return InputOutcome::consumed();
    }

    // Focused non-PTY zones (pager and friends) scroll with bare keys.
    match key.code {
        KeyCode::Up => {
            let _ = zones.scroll(&name, 1);
            InputOutcome::redraw()
        }
        KeyCode::Down => {
            let _ = zones.scroll(&name, -1);
            InputOutcome::redraw()
        }
        KeyCode::PageUp => {
            let page = zones.get(&name).map(|z| z.inner_height().max(1)).unwrap_or(5);
            let _ = zones.scroll(&name, page as i64);
            InputOutcome::redraw()
        }
        KeyCode::PageDown => {
            let page = zones.get(&name).map(|z| z.inner_height().max(1)).unwrap_or(5);
            let _ = zones.scroll(&name, -(page as i64));
            InputOutcome::redraw()
        }
        _ => InputOutcome::consumed(),
    }
}
