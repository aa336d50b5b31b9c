//! Width-aware line truncation.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_csi, filter_color_params};
use super::width::grapheme_width;

/// Longest prefix of `text` whose display width fits `max_columns`.
///
/// Grapheme clusters are never split, so the result can be narrower than
/// the budget when a wide cluster would straddle the cut.
pub fn truncate_to_width(text: &str, max_columns: usize) -> &str {
    let mut width = 0;
    for (idx, grapheme) in text.grapheme_indices(true) {
        let gw = grapheme_width(grapheme);
        if width + gw > max_columns {
            return &text[..idx];
        }
        width += gw;
    }
    text
}

/// Color-aware variant of [`truncate_to_width`].
///
/// Embedded SGR tokens cost zero columns, are never split mid-token, and
/// stay in their original position relative to the visible characters
/// around them. Their parameters are reduced to foreground colors and a
/// normalized reset (see `filter_color_params`); tokens left with no
/// parameters, and CSI sequences other than SGR, are stripped.
pub fn truncate_preserving_sgr(text: &str, max_columns: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_columns * 4 + 16));
    let mut width = 0;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(token) = extract_csi(text, idx) {
            if token.is_sgr() {
                let params = filter_color_params(&token.params);
                if !params.is_empty() {
                    out.push_str("\x1b[");
                    out.push_str(&params.join(";"));
                    out.push('m');
                }
            }
            idx += token.length;
            continue;
        }

        let segment_end = next_csi_or_end(text, idx);
        for grapheme in text[idx..segment_end].graphemes(true) {
            let gw = grapheme_width(grapheme);
            if width + gw > max_columns {
                return out;
            }
            out.push_str(grapheme);
            width += gw;
        }
        idx = segment_end;
    }

    out
}

fn next_csi_or_end(input: &str, mut idx: usize) -> usize {
    while idx < input.len() {
        if extract_csi(input, idx).is_some() {
            break;
        }
        let ch = input[idx..].chars().next().expect("missing char");
        idx += ch.len_utf8();
    }
    idx
}
