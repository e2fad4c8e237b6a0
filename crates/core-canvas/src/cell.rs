//! Cell and color primitives.
//!
//! A `Cell` is one grid location's visible state: a single user-perceived
//! glyph plus foreground/background colors. `Color::Default` means "use the
//! terminal default" and is distinct from any palette entry.
//!
//! Glyph policy: one `char` per cell, one column per cell. Multi-codepoint
//! clusters are reduced to their first scalar on entry; wide glyphs are
//! accepted but still occupy a single cell.

use std::fmt;

/// Foreground or background color of a cell.
///
/// `Ansi(n)` is an ANSI 256-color index (0–15 are the named palette, 16–255
/// the extended cube/grayscale). `Default` defers to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Ansi(u8),
}

/// Named palette entries for the `color` command, paired with their ANSI
/// indices. Bright variants occupy 8–15.
pub const PALETTE: [(&str, u8); 16] = [
    ("black", 0),
    ("red", 1),
    ("green", 2),
    ("yellow", 3),
    ("blue", 4),
    ("magenta", 5),
    ("cyan", 6),
    ("white", 7),
    ("bright-black", 8),
    ("bright-red", 9),
    ("bright-green", 10),
    ("bright-yellow", 11),
    ("bright-blue", 12),
    ("bright-magenta", 13),
    ("bright-cyan", 14),
    ("bright-white", 15),
];

impl Color {
    /// Parse a color argument: a palette name, a 0–255 numeric code, or the
    /// literal `default`. Case-insensitive. Returns `None` for anything else.
    pub fn parse(arg: &str) -> Option<Color> {
        let lower = arg.to_ascii_lowercase();
        if lower == "default" {
            return Some(Color::Default);
        }
        if let Some(&(_, code)) = PALETTE.iter().find(|(name, _)| *name == lower) {
            return Some(Color::Ansi(code));
        }
        lower.parse::<u8>().ok().map(Color::Ansi)
    }

    /// Palette name for 0–15, numeric string otherwise.
    pub fn describe(&self) -> String {
        match self {
            Color::Default => "default".to_string(),
            Color::Ansi(n) => PALETTE
                .iter()
                .find(|(_, code)| code == n)
                .map(|(name, _)| (*name).to_string())
                .unwrap_or_else(|| n.to_string()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// The glyph rendered for absent cells. A cell whose glyph is this character
/// and whose colors are both `Default` carries no information and is removed
/// from sparse storage on write.
pub const EMPTY_GLYPH: char = ' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: EMPTY_GLYPH,
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

impl Cell {
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            fg: Color::Default,
            bg: Color::Default,
        }
    }

    pub fn styled(ch: char, fg: Color, bg: Color) -> Self {
        Self { ch, fg, bg }
    }

    /// True when the cell renders identically to an absent cell.
    ///
    /// A space with a non-default background is visible content and is NOT
    /// blank.
    pub fn is_blank(&self) -> bool {
        self.ch == EMPTY_GLYPH && self.fg == Color::Default && self.bg == Color::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_colors() {
        assert_eq!(Color::parse("red"), Some(Color::Ansi(1)));
        assert_eq!(Color::parse("BRIGHT-CYAN"), Some(Color::Ansi(14)));
        assert_eq!(Color::parse("default"), Some(Color::Default));
    }

    #[test]
    fn parse_numeric_codes() {
        assert_eq!(Color::parse("0"), Some(Color::Ansi(0)));
        assert_eq!(Color::parse("208"), Some(Color::Ansi(208)));
        assert_eq!(Color::parse("256"), None);
        assert_eq!(Color::parse("mauve"), None);
    }

    #[test]
    fn describe_round_trips_names() {
        assert_eq!(Color::Ansi(4).describe(), "blue");
        assert_eq!(Color::Ansi(196).describe(), "196");
        assert_eq!(Color::Default.describe(), "default");
    }

    #[test]
    fn blank_requires_default_colors() {
        assert!(Cell::default().is_blank());
        assert!(Cell::new(' ').is_blank());
        assert!(!Cell::new('x').is_blank());
        assert!(!Cell::styled(' ', Color::Default, Color::Ansi(4)).is_blank());
    }
}
