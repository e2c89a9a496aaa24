//! Top-level splitting and clause location

use super::state::ScanState;
use crate::config::compile_time::scan::MAX_SNIPPET_LENGTH;
use crate::utils::Span;

/// Split `s` on `delimiter` wherever all three delimiter depths are zero
/// and no quote is open. Pieces are trimmed; one trailing empty piece is
/// dropped (so `"a,b,"` yields two pieces). Oversized input comes back as
/// a single piece, which callers treat as "no structure found".
pub fn split_top_level(s: &str, delimiter: char) -> Vec<String> {
    if s.len() > MAX_SNIPPET_LENGTH {
        return vec![s.trim().to_string()];
    }

    let mut pieces = Vec::new();
    let mut state = ScanState::new();
    let mut piece_start = 0;

    for (i, ch) in s.char_indices() {
        if ch == delimiter && state.at_top_level() {
            pieces.push(s[piece_start..i].trim().to_string());
            piece_start = i + ch.len_utf8();
        } else {
            state.step(ch);
        }
    }
    pieces.push(s[piece_start..].trim().to_string());

    if pieces.len() > 1 && pieces.last().is_some_and(|p| p.is_empty()) {
        pieces.pop();
    }

    pieces
}

/// Comma specialization of [`split_top_level`], the shape every argument
/// list and label list in this engine uses.
pub fn split_top_level_comma(s: &str) -> Vec<String> {
    split_top_level(s, ',')
}

/// Locate the clause surrounding byte offset `position`: the
/// comma-delimited segment at the innermost delimiter level that contains
/// the position. Used to keep rewrites from reaching across argument
/// boundaries.
///
/// The returned span is trimmed of surrounding whitespace. An offset past
/// the end of the string is clamped to the final clause.
pub fn clause_at(s: &str, position: usize) -> Span {
    let position = position.min(s.len().saturating_sub(1));

    // Innermost delimiter pair containing the position; the whole string
    // when there is none.
    let (mut region_start, mut region_end) = (0, s.len());
    let mut opens: Vec<usize> = Vec::new();
    let mut state = ScanState::new();
    for (i, ch) in s.char_indices() {
        if !state.in_quote() && !state.escape_pending {
            match ch {
                '(' | '[' | '{' => opens.push(i),
                ')' | ']' | '}' => {
                    if let Some(open) = opens.pop() {
                        if open < position && position < i {
                            region_start = open + 1;
                            region_end = i;
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        state.step(ch);
    }

    // Comma boundaries at the region's own level
    let region = &s[region_start..region_end];
    let mut clause_start = region_start;
    let mut state = ScanState::new();
    for (off, ch) in region.char_indices() {
        let i = region_start + off;
        if ch == ',' && state.at_top_level() {
            if i <= position {
                clause_start = i + 1;
            } else {
                return trimmed_span(s, clause_start, i);
            }
        } else {
            state.step(ch);
        }
    }

    trimmed_span(s, clause_start, region_end)
}

fn trimmed_span(s: &str, start: usize, end: usize) -> Span {
    let raw = &s[start..end];
    let lead = raw.len() - raw.trim_start().len();
    let trail = raw.len() - raw.trim_end().len();
    Span::new(start + lead, end - trail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(split_top_level("a, b, c", ','), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parens_shield_commas() {
        assert_eq!(split_top_level("(a,b)", ','), vec!["(a,b)"]);
        assert_eq!(
            split_top_level("f(a, b), c", ','),
            vec!["f(a, b)", "c"]
        );
    }

    #[test]
    fn test_middle_segment_returned_intact() {
        assert_eq!(split_top_level("a*(b,c)*d", '*'), vec!["a", "(b,c)", "d"]);
    }

    #[test]
    fn test_brackets_and_braces_shield_too() {
        assert_eq!(
            split_top_level("talent.e[\"a,b\"], c", ','),
            vec!["talent.e[\"a,b\"]", "c"]
        );
        assert_eq!(split_top_level("{x,y}, z", ','), vec!["{x,y}", "z"]);
    }

    #[test]
    fn test_quotes_shield_delimiter() {
        assert_eq!(split_top_level("'a,b', c", ','), vec!["'a,b'", "c"]);
    }

    #[test]
    fn test_trailing_empty_piece_dropped() {
        assert_eq!(split_top_level("a, b,", ','), vec!["a", "b"]);
        // Interior empties survive
        assert_eq!(split_top_level("a,,b", ','), vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_input_single_empty_piece() {
        assert_eq!(split_top_level("", ','), vec![""]);
    }

    #[test]
    fn test_clause_at_top_level() {
        let s = "a + b, c * d, e";
        let span = clause_at(s, s.find('c').unwrap());
        assert_eq!(span.slice(s), Some("c * d"));
    }

    #[test]
    fn test_clause_at_inside_call() {
        let s = "dmg(a*b, c+d)";
        let span = clause_at(s, s.find('c').unwrap());
        assert_eq!(span.slice(s), Some("c+d"));

        let span = clause_at(s, s.find('a').unwrap());
        assert_eq!(span.slice(s), Some("a*b"));
    }

    #[test]
    fn test_clause_at_without_delimiters() {
        let s = "x.avg * 2";
        let span = clause_at(s, 3);
        assert_eq!(span.slice(s), Some("x.avg * 2"));
    }
}
