//! Dirty-region frame painting.
//!
//! A frame is recomputed every loop iteration and projected into escape
//! bytes here; nothing about it is persisted. Rows end with a carriage
//! return instead of a newline so partial repaints never scroll, and the
//! painter finishes with a cursor-up so the next frame overwrites the same
//! region in place.

use crate::core::text::truncate::{truncate_preserving_sgr, truncate_to_width};
use crate::core::text::width::visible_width;

const ERASE_TO_EOL: &str = "\x1b[0K";
const SGR_RESET: &str = "\x1b[0m";

/// Cursor-row highlight colors and shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightStyle {
    /// SGR foreground code, 30-37.
    pub fg: u8,
    /// SGR background code, 40-47.
    pub bg: u8,
    /// When set, the highlight spans the whole terminal row: the
    /// clear-to-EOL runs inside the color instead of before it.
    pub cursor_line: bool,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            fg: 30,
            bg: 47,
            cursor_line: false,
        }
    }
}

/// One iteration's projection of the filtered view onto the terminal.
pub struct Frame<'a> {
    /// Display text of the filtered lines, in view order.
    pub lines: &'a [String],
    /// Selection marker per view row (multi-select).
    pub selected: &'a [bool],
    /// Highlighted row, as an index into `lines`.
    pub cursor: usize,
    /// First visible view row.
    pub offset: usize,
    /// Query line content; `None` when query mode is off.
    pub query: Option<&'a str>,
    /// Terminal columns.
    pub width: usize,
    /// Terminal rows.
    pub height: usize,
    /// Rows painted last frame that no longer exist and must be blanked.
    pub blank_tail: usize,
    /// Backend scrolls when the final buffer row is written.
    pub scroll_compensation: bool,
}

impl Frame<'_> {
    /// Rows of the terminal available to the list itself.
    pub fn list_height(&self) -> usize {
        let reserved = usize::from(self.query.is_some());
        self.height.saturating_sub(reserved).max(1)
    }
}

/// Paints one frame into `out`, clearing the dirty flags it consumes.
///
/// Only rows marked dirty are rewritten; clean rows advance with a bare
/// newline to keep vertical alignment. The query line, when present, is
/// repainted unconditionally since it changes on every keystroke, and the
/// cursor is finally re-homed just past the typed query so the blinking
/// cursor sits where typing inserts.
pub fn paint(frame: &Frame, dirty: &mut [bool], style: &HighlightStyle, out: &mut String) {
    let query_width = frame.query.map(|query| {
        let shown = truncate_to_width(query, frame.width.saturating_sub(1));
        out.push('\r');
        out.push_str(ERASE_TO_EOL);
        out.push_str(shown);
        out.push('\n');
        visible_width(shown)
    });

    let list_height = frame.list_height();
    let visible = frame
        .lines
        .len()
        .saturating_sub(frame.offset)
        .min(list_height);
    let blank = frame.blank_tail.min(list_height - visible);

    let mut rows = 0;
    for row in 0..visible + blank {
        if row < visible {
            let slot = frame.offset + row;
            if dirty[slot] {
                paint_row(frame, style, slot, out);
                dirty[slot] = false;
            }
        } else {
            out.push_str(ERASE_TO_EOL);
            out.push('\r');
        }
        rows += 1;
        if rows >= list_height {
            if frame.scroll_compensation {
                out.push('\n');
            }
            break;
        }
        out.push('\n');
    }

    let up = rows + usize::from(frame.query.is_some());
    if up > 0 {
        out.push_str(&format!("\x1b[{up}A"));
    }
    if let Some(width) = query_width {
        if width > 0 {
            out.push_str(&format!("\x1b[{width}C"));
        }
    }
}

fn paint_row(frame: &Frame, style: &HighlightStyle, slot: usize, out: &mut String) {
    let text = truncate_preserving_sgr(&frame.lines[slot], frame.width);
    let is_cursor = slot == frame.cursor;
    let is_selected = frame.selected.get(slot).copied().unwrap_or(false);

    if !style.cursor_line {
        out.push_str(ERASE_TO_EOL);
    }

    if is_cursor {
        out.push_str(&format!("\x1b[{};{}m", style.fg, style.bg));
    } else if is_selected {
        out.push_str(&format!("\x1b[{}m", style.bg));
    }

    out.push_str(&text);

    if is_cursor || is_selected {
        if style.cursor_line {
            out.push_str(ERASE_TO_EOL);
        }
        out.push_str(SGR_RESET);
    } else {
        out.push_str(ERASE_TO_EOL);
    }
    out.push('\r');
}

#[cfg(test)]
mod tests {
    use super::{paint, Frame, HighlightStyle};

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn frame<'a>(lines: &'a [String], selected: &'a [bool], cursor: usize) -> Frame<'a> {
        Frame {
            lines,
            selected,
            cursor,
            offset: 0,
            query: None,
            width: 20,
            height: 25,
            blank_tail: 0,
            scroll_compensation: false,
        }
    }

    #[test]
    fn full_repaint_emits_every_row_once() {
        let lines = lines(&["apple", "banana", "cherry"]);
        let selected = vec![false; 3];
        let mut dirty = vec![true; 3];
        let mut out = String::new();

        paint(&frame(&lines, &selected, 0), &mut dirty, &HighlightStyle::default(), &mut out);

        assert_eq!(
            out,
            "\x1b[0K\x1b[30;47mapple\x1b[0m\r\n\
             \x1b[0Kbanana\x1b[0K\r\n\
             \x1b[0Kcherry\x1b[0K\r\n\
             \x1b[3A"
        );
        assert!(dirty.iter().all(|d| !d));
    }

    #[test]
    fn clean_rows_advance_with_bare_newlines() {
        let lines = lines(&["apple", "banana", "cherry"]);
        let selected = vec![false; 3];
        // Cursor moved from row 0 to row 1: only those two rows are dirty.
        let mut dirty = vec![true, true, false];
        let mut out = String::new();

        paint(&frame(&lines, &selected, 1), &mut dirty, &HighlightStyle::default(), &mut out);

        assert_eq!(
            out,
            "\x1b[0Kapple\x1b[0K\r\n\
             \x1b[0K\x1b[30;47mbanana\x1b[0m\r\n\
             \n\
             \x1b[3A"
        );
    }

    #[test]
    fn viewport_clips_to_terminal_height() {
        let lines = lines(&["a", "b", "c", "d", "e"]);
        let selected = vec![false; 5];
        let mut dirty = vec![true; 5];
        let mut frame = frame(&lines, &selected, 0);
        frame.height = 3;
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        // Three rows, no newline after the last one, cursor-up by three.
        assert!(out.ends_with("c\x1b[0K\r\x1b[3A"));
        assert!(!out.contains('d'));
        assert!(dirty[3] && dirty[4], "off-screen rows stay dirty");
    }

    #[test]
    fn scroll_compensation_adds_trailing_newline() {
        let lines = lines(&["a", "b", "c"]);
        let selected = vec![false; 3];
        let mut dirty = vec![true; 3];
        let mut frame = frame(&lines, &selected, 0);
        frame.height = 3;
        frame.scroll_compensation = true;
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        assert!(out.ends_with("c\x1b[0K\r\n\x1b[3A"));
    }

    #[test]
    fn query_line_repaints_every_frame_and_rehomes_cursor() {
        let lines = lines(&["apple", "avocado"]);
        let selected = vec![false; 2];
        let mut dirty = vec![false; 2];
        let mut frame = frame(&lines, &selected, 0);
        frame.query = Some("av");
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        assert_eq!(out, "\r\x1b[0Kav\n\n\n\x1b[3A\x1b[2C");
    }

    #[test]
    fn empty_query_skips_cursor_forward() {
        let lines = lines(&["apple"]);
        let selected = vec![false];
        let mut dirty = vec![false];
        let mut frame = frame(&lines, &selected, 0);
        frame.query = Some("");
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        assert_eq!(out, "\r\x1b[0K\n\n\x1b[2A");
    }

    #[test]
    fn blank_tail_erases_rows_left_by_a_shrunken_view() {
        let lines = lines(&["apple"]);
        let selected = vec![false];
        let mut dirty = vec![true];
        let mut frame = frame(&lines, &selected, 0);
        frame.blank_tail = 2;
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        assert_eq!(
            out,
            "\x1b[0K\x1b[30;47mapple\x1b[0m\r\n\
             \x1b[0K\r\n\
             \x1b[0K\r\n\
             \x1b[3A"
        );
    }

    #[test]
    fn cursor_line_style_clears_inside_the_highlight() {
        let lines = lines(&["apple", "banana"]);
        let selected = vec![false; 2];
        let mut dirty = vec![true; 2];
        let style = HighlightStyle {
            fg: 30,
            bg: 47,
            cursor_line: true,
        };
        let mut out = String::new();

        paint(&frame(&lines, &selected, 0), &mut dirty, &style, &mut out);

        assert_eq!(
            out,
            "\x1b[30;47mapple\x1b[0K\x1b[0m\r\n\
             banana\x1b[0K\r\n\
             \x1b[2A"
        );
    }

    #[test]
    fn selected_rows_carry_the_background_marker() {
        let lines = lines(&["apple", "banana"]);
        let selected = vec![false, true];
        let mut dirty = vec![true; 2];
        let mut out = String::new();

        paint(&frame(&lines, &selected, 0), &mut dirty, &HighlightStyle::default(), &mut out);

        assert!(out.contains("\x1b[47mbanana\x1b[0m"));
    }

    #[test]
    fn rows_are_truncated_to_terminal_width() {
        let lines = lines(&["0123456789"]);
        let selected = vec![false];
        let mut dirty = vec![true];
        let mut frame = frame(&lines, &selected, 1);
        frame.width = 4;
        let mut out = String::new();

        paint(&frame, &mut dirty, &HighlightStyle::default(), &mut out);

        assert!(out.contains("0123"));
        assert!(!out.contains("01234"));
    }
}
