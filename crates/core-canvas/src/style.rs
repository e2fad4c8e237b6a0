//! Color-aware text runs.
//!
//! Zone buffers and pager content hold `StyledLine`s: a sequence of spans
//! that share colors. Plain process output becomes a single default-colored
//! span; ANSI-aware producers build multi-span lines.

use crate::cell::{Cell, Color};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub fg: Color,
    pub bg: Color,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }

    pub fn styled(text: impl Into<String>, fg: Color, bg: Color) -> Self {
        Self {
            text: text.into(),
            fg,
            bg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<Span>,
}

impl StyledLine {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            spans: vec![Span::plain(text)],
        }
    }

    pub fn push(&mut self, span: Span) {
        if span.text.is_empty() {
            return;
        }
        // Coalesce with the previous span when colors match.
        if let Some(last) = self.spans.last_mut()
            && last.fg == span.fg
            && last.bg == span.bg
        {
            last.text.push_str(&span.text);
            return;
        }
        self.spans.push(span);
    }

    /// Column count under the one-cell-per-char policy.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Expand into exactly `width` cells, truncating or padding with blanks.
    pub fn to_cells(&self, width: usize) -> Vec<Cell> {
        let mut out = Vec::with_capacity(width);
        'fill: for span in &self.spans {
            for ch in span.text.chars() {
                if out.len() == width {
                    break 'fill;
                }
                out.push(Cell::styled(ch, span.fg, span.bg));
            }
        }
        while out.len() < width {
            out.push(Cell::default());
        }
        out
    }
}
