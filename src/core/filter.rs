//! Line model and the incremental substring filter.

/// One input record. When a separator is configured the raw line is split
/// once into a display segment (shown in the list) and a payload segment
/// (emitted on selection). A line without the separator keeps the whole
/// text as its display segment and an empty payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    display: String,
    payload: String,
}

impl Line {
    pub fn parse(raw: &str, separator: Option<&str>) -> Self {
        let split = separator
            .filter(|sep| !sep.is_empty())
            .and_then(|sep| raw.split_once(sep));
        match split {
            Some((display, payload)) => Self {
                display: display.to_string(),
                payload: payload.to_string(),
            },
            None => Self {
                display: raw.to_string(),
                payload: String::new(),
            },
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Text emitted when this line is selected: the payload segment when
    /// the line carried the separator, otherwise the whole display text.
    pub fn output(&self) -> &str {
        if self.payload.is_empty() {
            &self.display
        } else {
            &self.payload
        }
    }

    fn segment(&self, segment: MatchSegment) -> &str {
        match segment {
            MatchSegment::Display => &self.display,
            MatchSegment::Payload => &self.payload,
        }
    }
}

/// Which segment the live query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchSegment {
    #[default]
    Display,
    Payload,
}

/// Returns the indices of lines whose designated segment contains `query`
/// as a plain substring, in original input order. An empty query matches
/// everything; the first `header_rows` lines always pass. Case-insensitive
/// mode upper-cases both operands before comparison.
///
/// There is no index and no caching: line counts here are the kind a human
/// visually scans, so a linear pass per query mutation is fine.
pub fn filter_lines(
    lines: &[Line],
    query: &str,
    segment: MatchSegment,
    case_insensitive: bool,
    header_rows: usize,
) -> Vec<usize> {
    if query.is_empty() {
        return (0..lines.len()).collect();
    }

    let folded_query = if case_insensitive {
        Some(query.to_uppercase())
    } else {
        None
    };

    lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| {
            if *idx < header_rows {
                return true;
            }
            let haystack = line.segment(segment);
            match folded_query.as_deref() {
                Some(folded) => haystack.to_uppercase().contains(folded),
                None => haystack.contains(query),
            }
        })
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_lines, Line, MatchSegment};

    fn lines(raw: &[&str], separator: Option<&str>) -> Vec<Line> {
        raw.iter().map(|r| Line::parse(r, separator)).collect()
    }

    #[test]
    fn parse_without_separator_keeps_whole_line() {
        let line = Line::parse("apple", None);
        assert_eq!(line.display(), "apple");
        assert_eq!(line.payload(), "");
        assert_eq!(line.output(), "apple");
    }

    #[test]
    fn parse_splits_once_on_separator() {
        let line = Line::parse("k1,v1,extra", Some(","));
        assert_eq!(line.display(), "k1");
        assert_eq!(line.payload(), "v1,extra");
        assert_eq!(line.output(), "v1,extra");
    }

    #[test]
    fn missing_separator_yields_empty_payload() {
        let line = Line::parse("no-delimiter-here", Some(","));
        assert_eq!(line.payload(), "");
        assert_eq!(line.output(), "no-delimiter-here");
    }

    #[test]
    fn empty_query_is_identity() {
        let set = lines(&["b", "a", "c"], None);
        let view = filter_lines(&set, "", MatchSegment::Display, false, 0);
        assert_eq!(view, vec![0, 1, 2]);
    }

    #[test]
    fn filtering_preserves_input_order() {
        let set = lines(&["apple", "banana", "avocado"], None);
        let view = filter_lines(&set, "a", MatchSegment::Display, false, 0);
        assert_eq!(view, vec![0, 1, 2]);
        let view = filter_lines(&set, "av", MatchSegment::Display, false, 0);
        assert_eq!(view, vec![2]);
    }

    #[test]
    fn case_insensitive_upper_cases_both_operands() {
        let set = lines(&["Apple", "BANANA"], None);
        let view = filter_lines(&set, "apple", MatchSegment::Display, true, 0);
        assert_eq!(view, vec![0]);
        let view = filter_lines(&set, "apple", MatchSegment::Display, false, 0);
        assert!(view.is_empty());
    }

    #[test]
    fn matching_against_payload_segment() {
        let set = lines(&["k1,v1", "k2,v2"], Some(","));
        let view = filter_lines(&set, "v2", MatchSegment::Payload, false, 0);
        assert_eq!(view, vec![1]);
        let view = filter_lines(&set, "k2", MatchSegment::Payload, false, 0);
        assert!(view.is_empty());
    }

    #[test]
    fn header_rows_always_pass() {
        let set = lines(&["NAME", "apple", "banana"], None);
        let view = filter_lines(&set, "ban", MatchSegment::Display, false, 1);
        assert_eq!(view, vec![0, 2]);
    }

    #[test]
    fn matched_lines_contain_query_and_omitted_lines_do_not() {
        let set = lines(&["alpha", "beta", "gamma", "delta"], None);
        let view = filter_lines(&set, "ta", MatchSegment::Display, false, 0);
        for (idx, line) in set.iter().enumerate() {
            if view.contains(&idx) {
                assert!(line.display().contains("ta"));
            } else {
                assert!(!line.display().contains("ta"));
            }
        }
    }
}
