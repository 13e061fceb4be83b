/// Rolling display buffer.
///
/// Holds the last [`DISPLAY_LINES`] event lines, newest first, exactly as they
/// will appear top to bottom on the OLED. Pushing into a full buffer drops the
/// oldest line.
use core::fmt::Write;

use heapless::Deque;

use crate::board::DISPLAY_LINES;
use crate::scanner::truncate_str;

/// Maximum length of one rendered line, in bytes.
pub const MAX_LINE_LEN: usize = 96;

/// Capacity of the joined buffer: every line plus its separator.
pub const MAX_RENDER_LEN: usize = DISPLAY_LINES * (MAX_LINE_LEN + 1);

/// One display line
pub type DisplayLine = heapless::String<MAX_LINE_LEN>;

/// The joined buffer handed to the display sink
pub type RenderedText = heapless::String<MAX_RENDER_LEN>;

#[derive(Debug, Default)]
pub struct DisplayBuffer {
    lines: Deque<DisplayLine, DISPLAY_LINES>,
}

impl DisplayBuffer {
    pub const fn new() -> Self {
        Self {
            lines: Deque::new(),
        }
    }

    /// Put `line` on top, evicting the bottom line when full.
    /// Longer lines are cut at [`MAX_LINE_LEN`].
    pub fn push(&mut self, line: &str) {
        if self.lines.is_full() {
            self.lines.pop_back();
        }
        let _ = self.lines.push_front(truncate_str(line));
    }

    /// Push a formatted line, e.g. `buffer.push_fmt(format_args!("{}x", n))`.
    pub fn push_fmt(&mut self, args: core::fmt::Arguments<'_>) {
        let mut line = DisplayLine::new();
        // Overflow leaves whatever fit, which is what we want on a tiny screen
        let _ = line.write_fmt(args);
        self.push(&line);
    }

    /// All lines joined by `\n`, newest first.
    pub fn render(&self) -> RenderedText {
        let mut out = RenderedText::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                let _ = out.push('\n');
            }
            let _ = out.push_str(line);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    pub fn front(&self) -> Option<&str> {
        self.lines.front().map(|l| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        DISPLAY_LINES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;
    use std::string::String;
    use std::vec::Vec;

    #[test]
    fn new_buffer_is_empty() {
        let buf = DisplayBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.render().as_str(), "");
        assert_eq!(buf.capacity(), DISPLAY_LINES);
    }

    #[test]
    fn push_prepends() {
        let mut buf = DisplayBuffer::new();
        buf.push("first");
        buf.push("second");
        assert_eq!(buf.front(), Some("second"));
        assert_eq!(buf.render().as_str(), "second\nfirst");
    }

    #[test]
    fn overflow_keeps_most_recent_lines() {
        let mut buf = DisplayBuffer::new();
        for i in 0..=DISPLAY_LINES {
            buf.push(&format!("line {i}"));
        }
        assert_eq!(buf.len(), DISPLAY_LINES);

        let lines: Vec<&str> = buf.iter().collect();
        let expected: Vec<String> = (1..=DISPLAY_LINES).rev().map(|i| format!("line {i}")).collect();
        assert_eq!(lines, expected);
        assert!(!buf.iter().any(|l| l == "line 0"));
    }

    #[test]
    fn render_joins_with_newlines() {
        let mut buf = DisplayBuffer::new();
        for i in 0..=DISPLAY_LINES {
            buf.push(&format!("{i}"));
        }
        let rendered = buf.render();
        assert_eq!(rendered.lines().count(), DISPLAY_LINES);
        assert!(!rendered.ends_with('\n'));
        assert!(rendered.starts_with(&format!("{DISPLAY_LINES}\n")));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut buf = DisplayBuffer::new();
        buf.push("same");
        buf.push("same");
        assert_eq!(buf.render().as_str(), "same\nsame");
    }

    #[test]
    fn long_line_is_truncated() {
        let mut buf = DisplayBuffer::new();
        let long = "x".repeat(MAX_LINE_LEN * 2);
        buf.push(&long);
        assert_eq!(buf.front().map(str::len), Some(MAX_LINE_LEN));
    }

    #[test]
    fn push_fmt_formats_in_place() {
        let mut buf = DisplayBuffer::new();
        buf.push_fmt(format_args!("{}x known device: {}", 4, "Bob"));
        assert_eq!(buf.front(), Some("4x known device: Bob"));
    }

    #[test]
    fn full_buffer_renders_within_capacity() {
        let mut buf = DisplayBuffer::new();
        let long = "y".repeat(MAX_LINE_LEN);
        for _ in 0..DISPLAY_LINES {
            buf.push(&long);
        }
        assert_eq!(buf.render().len(), MAX_RENDER_LEN - 1);
    }
}
