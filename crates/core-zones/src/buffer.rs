//! Bounded zone line buffer.
//!
//! Lines live in a `VecDeque` capped at `max_lines`; the head (oldest) is
//! evicted on overflow. `scroll_offset` counts lines from the bottom: 0 is
//! the tail window, larger values reveal older lines. With `auto_scroll`
//! enabled any append snaps the offset back to 0.

use std::collections::VecDeque;

use core_canvas::StyledLine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneBuffer {
    lines: VecDeque<StyledLine>,
    max_lines: usize,
    pub auto_scroll: bool,
    pub scroll_offset: usize,
}

impl ZoneBuffer {
    pub fn new(max_lines: usize, auto_scroll: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
            auto_scroll,
            scroll_offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn lines(&self) -> impl Iterator<Item = &StyledLine> {
        self.lines.iter()
    }

    pub fn append(&mut self, line: StyledLine) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
        if self.auto_scroll {
            self.scroll_offset = 0;
        } else {
            self.clamp_offset();
        }
    }

    pub fn append_all(&mut self, lines: impl IntoIterator<Item = StyledLine>) {
        for line in lines {
            self.append(line);
        }
    }

    /// Replace content wholesale (watch/pager refresh). The scroll offset is
    /// re-clamped but otherwise preserved so a paused reader keeps its place.
    pub fn replace(&mut self, lines: impl IntoIterator<Item = StyledLine>) {
        self.lines.clear();
        for line in lines {
            self.lines.push_back(line);
            while self.lines.len() > self.max_lines {
                self.lines.pop_front();
            }
        }
        if self.auto_scroll {
            self.scroll_offset = 0;
        } else {
            self.clamp_offset();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
    }

    /// The visible window of `height` lines honoring the scroll offset.
    /// Offset 0 shows the tail.
    pub fn window(&self, height: usize) -> impl Iterator<Item = &StyledLine> {
        let len = self.lines.len();
        let bottom = len.saturating_sub(self.scroll_offset);
        let top = bottom.saturating_sub(height);
        self.lines.range(top..bottom)
    }

    pub fn scroll_up(&mut self, delta: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(delta);
        self.clamp_offset();
    }

    pub fn scroll_down(&mut self, delta: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(delta);
    }

    pub fn scroll_to_top(&mut self, height: usize) {
        self.scroll_offset = self.lines.len().saturating_sub(height);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn clamp_offset(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.lines.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> StyledLine {
        StyledLine::plain(s)
    }

    fn texts(buf: &ZoneBuffer, height: usize) -> Vec<String> {
        buf.window(height).map(|l| l.text()).collect()
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut buf = ZoneBuffer::new(3, true);
        for i in 0..5 {
            buf.append(plain(&format!("line {i}")));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(texts(&buf, 3), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn len_is_min_of_cap_and_appends() {
        let mut buf = ZoneBuffer::new(10, true);
        buf.append_all((0..4).map(|i| plain(&i.to_string())));
        assert_eq!(buf.len(), 4);
        buf.append_all((0..20).map(|i| plain(&i.to_string())));
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn auto_scroll_pins_tail() {
        let mut buf = ZoneBuffer::new(10, true);
        buf.append_all((0..8).map(|i| plain(&i.to_string())));
        buf.scroll_up(3);
        assert_eq!(buf.scroll_offset, 3);
        buf.append(plain("new"));
        assert_eq!(buf.scroll_offset, 0);
        assert_eq!(texts(&buf, 1), vec!["new"]);
    }

    #[test]
    fn manual_scroll_survives_append_without_auto() {
        let mut buf = ZoneBuffer::new(10, false);
        buf.append_all((0..5).map(|i| plain(&i.to_string())));
        buf.scroll_up(2);
        buf.append(plain("new"));
        assert_eq!(buf.scroll_offset, 2);
    }

    #[test]
    fn window_honors_offset() {
        let mut buf = ZoneBuffer::new(10, false);
        buf.append_all((0..6).map(|i| plain(&i.to_string())));
        assert_eq!(texts(&buf, 2), vec!["4", "5"]);
        buf.scroll_up(2);
        assert_eq!(texts(&buf, 2), vec!["2", "3"]);
        buf.scroll_to_top(2);
        assert_eq!(texts(&buf, 2), vec!["0", "1"]);
        buf.scroll_to_bottom();
        assert_eq!(texts(&buf, 2), vec!["4", "5"]);
    }

    #[test]
    fn scroll_clamps_to_content() {
        let mut buf = ZoneBuffer::new(10, false);
        buf.append_all((0..3).map(|i| plain(&i.to_string())));
        buf.scroll_up(100);
        assert_eq!(buf.scroll_offset, 2);
        buf.scroll_down(100);
        assert_eq!(buf.scroll_offset, 0);
    }

    #[test]
    fn replace_respects_cap() {
        let mut buf = ZoneBuffer::new(2, true);
        buf.replace((0..5).map(|i| plain(&i.to_string())));
        assert_eq!(buf.len(), 2);
        assert_eq!(texts(&buf, 2), vec!["3", "4"]);
    }

    #[test]
    fn window_smaller_content_returns_all() {
        let mut buf = ZoneBuffer::new(10, true);
        buf.append(plain("only"));
        assert_eq!(texts(&buf, 5), vec!["only"]);
    }
}
