//! SGR escape token extraction and color-parameter filtering.
//!
//! This is deliberately not a general ANSI parser: the selector only needs
//! enough to carry SGR color tokens through width-aware truncation.

/// A complete CSI sequence found inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiToken {
    /// Parameter bytes between `ESC [` and the final byte.
    pub params: String,
    /// Final byte of the sequence (`m` for SGR).
    pub final_byte: u8,
    /// Total byte length of the token, including `ESC [`.
    pub length: usize,
}

impl CsiToken {
    pub fn is_sgr(&self) -> bool {
        self.final_byte == b'm'
    }
}

/// Extracts a CSI token starting at byte `pos`, if one begins there.
///
/// A dangling `ESC [` without a final byte is not a token; callers treat
/// those bytes as plain text.
pub fn extract_csi(input: &str, pos: usize) -> Option<CsiToken> {
    let bytes = input.as_bytes();
    if pos + 1 >= bytes.len() || bytes[pos] != 0x1b || bytes[pos + 1] != b'[' {
        return None;
    }
    let mut idx = pos + 2;
    while idx < bytes.len() {
        let b = bytes[idx];
        if (0x40..=0x7e).contains(&b) {
            return Some(CsiToken {
                params: input[pos + 2..idx].to_string(),
                final_byte: b,
                length: idx + 1 - pos,
            });
        }
        idx += 1;
    }
    None
}

/// Filters SGR parameters down to the vocabulary truncation may emit:
/// foreground colors 30-37 and foreground reset 39. A bare reset (`0`, or
/// an empty parameter list) is normalized to `39` so a cut never leaves a
/// background or attribute bleeding past it. Everything else is dropped.
pub fn filter_color_params(params: &str) -> Vec<&'static str> {
    const FG: [&str; 8] = ["30", "31", "32", "33", "34", "35", "36", "37"];

    let mut kept = Vec::new();
    for part in params.split(';') {
        match part {
            "" | "0" | "39" => kept.push("39"),
            "30" | "31" | "32" | "33" | "34" | "35" | "36" | "37" => {
                let idx = (part.as_bytes()[1] - b'0') as usize;
                kept.push(FG[idx]);
            }
            _ => {}
        }
    }
    kept
}
