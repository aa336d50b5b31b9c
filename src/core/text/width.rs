//! Display width helpers, transparent to embedded SGR tokens.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::extract_csi;

/// Column cost of one grapheme cluster. Most codepoints cost one column,
/// East-Asian wide and full-width codepoints cost two, RGI emoji render as
/// two cells even where their scalar widths disagree.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }

    if emoji_get(grapheme).is_some() {
        return 2;
    }

    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Column count of `input` as the terminal will render it, skipping any
/// embedded CSI sequences.
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }

    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(token) = extract_csi(input, idx) {
            idx += token.length;
            continue;
        }

        let ch = input[idx..].chars().next().expect("missing char");
        clean.push(ch);
        idx += ch.len_utf8();
    }

    clean.graphemes(true).map(grapheme_width).sum()
}

#[cfg(test)]
mod tests {
    use super::{grapheme_width, visible_width};

    #[test]
    fn ascii_is_one_column_per_char() {
        assert_eq!(visible_width("hello"), 5);
    }

    #[test]
    fn sgr_tokens_cost_nothing() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
    }

    #[test]
    fn wide_characters_cost_two() {
        assert_eq!(grapheme_width("漢"), 2);
        assert_eq!(visible_width("漢字"), 4);
    }

    #[test]
    fn emoji_width_is_two() {
        assert_eq!(visible_width("😀"), 2);
    }
}
