//! Key-to-bytes encoding for PTY input forwarding.
//!
//! Translates the normalized key vocabulary into the canonical VT escape
//! sequences an interactive child expects: arrows as `ESC [ A..D`,
//! Home/End/PgUp/PgDn as VT220 `ESC [ n ~`, control chords as control
//! bytes. Keys the emulator contract intercepts (Esc, Shift+scrollback
//! keys) never reach this function.

use core_events::{KeyCode, KeyEvent, KeyModifiers};

/// Bytes to write to the PTY master for a key, or `None` when the key has
/// no terminal encoding.
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    if key.mods.contains(KeyModifiers::CTRL)
        && let KeyCode::Char(c) = key.code
    {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() {
            return Some(vec![(c as u8) & 0x1f]);
        }
    }
    let bytes: Vec<u8> = match key.code {
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => b"\r".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[1~".to_vec(),
        KeyCode::End => b"\x1b[4~".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::F(_) => return None,
    };
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_utf8() {
        assert_eq!(encode_key(&KeyEvent::ch('a')).unwrap(), b"a");
        assert_eq!(encode_key(&KeyEvent::ch('é')).unwrap(), "é".as_bytes());
    }

    #[test]
    fn control_chords_become_control_bytes() {
        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            mods: KeyModifiers::CTRL,
        };
        assert_eq!(encode_key(&ctrl_c).unwrap(), vec![0x03]);
        let ctrl_d = KeyEvent {
            code: KeyCode::Char('d'),
            mods: KeyModifiers::CTRL,
        };
        assert_eq!(encode_key(&ctrl_d).unwrap(), vec![0x04]);
    }

    #[test]
    fn named_keys_canonical_sequences() {
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::Up)).unwrap(), b"\x1b[A");
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::Left)).unwrap(), b"\x1b[D");
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::PageUp)).unwrap(), b"\x1b[5~");
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::Enter)).unwrap(), b"\r");
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::Backspace)).unwrap(), vec![0x7f]);
    }

    #[test]
    fn function_keys_unencoded() {
        assert_eq!(encode_key(&KeyEvent::plain(KeyCode::F(1))), None);
    }
}
