//! Foreground input translation.
//!
//! Converts crossterm terminal events into the normalized `InputEvent`
//! vocabulary consumed by the mode state machine. The loop polls with a
//! short timeout rather than running a reader thread: the only other event
//! producers (zones, API) have their own channels, so a 50 ms poll keeps the
//! loop responsive without busy-waiting.
//!
//! Bracketed paste arrives from crossterm as a single `Paste` event and is
//! forwarded whole; the raw content is never logged (only its length).

use std::time::Duration;

use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{
    Event as CtEvent, KeyCode as CtKeyCode, KeyEvent as CtKeyEvent, KeyEventKind,
    KeyModifiers as CtMods,
};

/// Poll for the next input event, waiting at most `timeout`. Returns
/// `Ok(None)` when the timeout elapses or the event has no mapping (mouse,
/// focus, key release).
pub fn poll_input(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if !crossterm::event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(crossterm::event::read()?))
}

/// Map a crossterm event into the normalized vocabulary.
pub fn translate(event: CtEvent) -> Option<InputEvent> {
    match event {
        CtEvent::Key(key) => translate_key(key).map(InputEvent::Key),
        CtEvent::Resize(cols, rows) => Some(InputEvent::Resize(cols, rows)),
        CtEvent::Paste(text) => {
            tracing::debug!(target: "input.paste", size_bytes = text.len(), "paste_received");
            Some(InputEvent::Paste(text))
        }
        _ => None,
    }
}

fn translate_key(key: CtKeyEvent) -> Option<KeyEvent> {
    // Release/repeat events from kitty-protocol terminals would double every
    // keystroke; only presses are surfaced.
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let code = match key.code {
        CtKeyCode::Char(c) => KeyCode::Char(c),
        CtKeyCode::Enter => KeyCode::Enter,
        CtKeyCode::Esc => KeyCode::Esc,
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Tab => KeyCode::Tab,
        CtKeyCode::Up => KeyCode::Up,
        CtKeyCode::Down => KeyCode::Down,
        CtKeyCode::Left => KeyCode::Left,
        CtKeyCode::Right => KeyCode::Right,
        CtKeyCode::Home => KeyCode::Home,
        CtKeyCode::End => KeyCode::End,
        CtKeyCode::PageUp => KeyCode::PageUp,
        CtKeyCode::PageDown => KeyCode::PageDown,
        CtKeyCode::Delete => KeyCode::Delete,
        CtKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(KeyEvent {
        code,
        mods: map_mods(key.modifiers, code),
    })
}

fn map_mods(m: CtMods, code: KeyCode) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CtMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CtMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CtMods::SHIFT) {
        // Shifted letters already arrive as uppercase chars; keeping the
        // SHIFT bit there would make 'A' ambiguous with Shift+'a' in the
        // keymap. Only non-char keys keep it.
        if !matches!(code, KeyCode::Char(_)) {
            out |= KeyModifiers::SHIFT;
        }
    }
    out
}
