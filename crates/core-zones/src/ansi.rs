//! ANSI escape handling for streaming zone output.
//!
//! Pipe/watch/fifo/socket producers may emit SGR color sequences. When the
//! terminal reports color capability those are interpreted into styled
//! spans; otherwise (and for every non-SGR escape) the sequence is stripped
//! so control bytes never land in a buffer line.
//!
//! Only the CSI and OSC families are recognized; this is deliberately far
//! short of a terminal emulator: PTY zones feed a real vt100 parser
//! instead.

use core_canvas::{Color, Span, StyledLine};

/// Parse one line of process output. `color` selects interpretation vs.
/// stripping of SGR sequences.
pub fn parse_line(input: &str, color: bool) -> StyledLine {
    let mut line = StyledLine::default();
    let mut fg = Color::Default;
    let mut bg = Color::Default;
    let mut text = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\u{1b}' {
            if ch == '\t' {
                // Tabs expand to a fixed 4 spaces; zone buffers have no tab
                // stops.
                text.push_str("    ");
            } else if !ch.is_control() {
                text.push(ch);
            }
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                let mut params = String::new();
                let mut terminator = None;
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        terminator = Some(c);
                        break;
                    }
                    params.push(c);
                }
                if terminator == Some('m') && color {
                    if !text.is_empty() {
                        line.push(Span::styled(std::mem::take(&mut text), fg, bg));
                    }
                    apply_sgr(&params, &mut fg, &mut bg);
                }
                // Every other CSI sequence is dropped.
            }
            Some(']') => {
                // OSC: skip until BEL or ST.
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\u{7}' || (prev == '\u{1b}' && c == '\\') {
                        break;
                    }
                    prev = c;
                }
            }
            _ => {
                // Lone escape or two-byte sequence: drop the next char too.
                chars.next();
            }
        }
    }
    if !text.is_empty() {
        line.push(Span::styled(text, fg, bg));
    }
    line
}

fn apply_sgr(params: &str, fg: &mut Color, bg: &mut Color) {
    let codes: Vec<u16> = params
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    let codes = if codes.is_empty() { vec![0] } else { codes };
    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => {
                *fg = Color::Default;
                *bg = Color::Default;
            }
            30..=37 => *fg = Color::Ansi((codes[i] - 30) as u8),
            90..=97 => *fg = Color::Ansi((codes[i] - 90 + 8) as u8),
            39 => *fg = Color::Default,
            40..=47 => *bg = Color::Ansi((codes[i] - 40) as u8),
            100..=107 => *bg = Color::Ansi((codes[i] - 100 + 8) as u8),
            49 => *bg = Color::Default,
            38 | 48 if codes.get(i + 1) == Some(&5) => {
                if let Some(&n) = codes.get(i + 2) {
                    let c = Color::Ansi(n.min(255) as u8);
                    if codes[i] == 38 {
                        *fg = c;
                    } else {
                        *bg = c;
                    }
                }
                i += 2;
            }
            // Bold/italic/underline and truecolor are ignored, not errors.
            _ => {}
        }
        i += 1;
    }
}

/// Split a decoded chunk into lines, parsing escapes per `color`. CR is
/// treated as a line break when paired with LF and dropped otherwise.
pub fn split_lines(chunk: &str, color: bool) -> Vec<StyledLine> {
    chunk
        .replace("\r\n", "\n")
        .split('\n')
        .map(|l| parse_line(l.trim_end_matches('\r'), color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let line = parse_line("hello world", true);
        assert_eq!(line.text(), "hello world");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].fg, Color::Default);
    }

    #[test]
    fn sgr_colors_become_spans() {
        let line = parse_line("a\u{1b}[31mred\u{1b}[0mb", true);
        assert_eq!(line.text(), "aredb");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].fg, Color::Ansi(1));
        assert_eq!(line.spans[2].fg, Color::Default);
    }

    #[test]
    fn sgr_stripped_without_color() {
        let line = parse_line("\u{1b}[1;32mok\u{1b}[0m", false);
        assert_eq!(line.text(), "ok");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].fg, Color::Default);
    }

    #[test]
    fn extended_256_colors() {
        let line = parse_line("\u{1b}[38;5;208morange\u{1b}[48;5;17mdeep", true);
        assert_eq!(line.spans[0].fg, Color::Ansi(208));
        assert_eq!(line.spans[1].bg, Color::Ansi(17));
    }

    #[test]
    fn bright_colors_map_to_high_palette() {
        let line = parse_line("\u{1b}[91mx", true);
        assert_eq!(line.spans[0].fg, Color::Ansi(9));
    }

    #[test]
    fn non_sgr_csi_dropped() {
        let line = parse_line("a\u{1b}[2Jb\u{1b}[10;20Hc", true);
        assert_eq!(line.text(), "abc");
    }

    #[test]
    fn osc_title_sequence_dropped() {
        let line = parse_line("\u{1b}]0;window title\u{7}visible", true);
        assert_eq!(line.text(), "visible");
    }

    #[test]
    fn control_bytes_removed_tabs_expanded() {
        let line = parse_line("a\tb\u{8}", true);
        assert_eq!(line.text(), "a    b");
    }

    #[test]
    fn split_lines_handles_crlf() {
        let lines = split_lines("one\r\ntwo\nthree", false);
        let texts: Vec<String> = lines.iter().map(|l| l.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
