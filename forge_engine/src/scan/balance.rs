//! Delimiter balancing: matching-paren search, outer-paren stripping and
//! brace-block extraction

use super::state::ScanState;
use crate::config::compile_time::scan::{MAX_NESTING_DEPTH, MAX_PAREN_STRIP_PASSES, MAX_SNIPPET_LENGTH};
use crate::utils::iterate_until_fixed_point;

/// Find the `)` that closes the `(` at `open_index`.
///
/// Honors quotes and the independence of the three delimiter kinds: a `)`
/// encountered while bracket or brace depth is open does not close the
/// paren being matched. Returns `None` when `open_index` does not point at
/// a `(`, when the input is oversized or too deeply nested, or when depth
/// never returns to zero before the end of the string.
pub fn find_matching_paren(s: &str, open_index: usize) -> Option<usize> {
    if s.len() > MAX_SNIPPET_LENGTH {
        return None;
    }
    if !s.get(open_index..)?.starts_with('(') {
        return None;
    }

    let mut state = ScanState::new();
    for (offset, ch) in s[open_index..].char_indices() {
        if !state.in_quote()
            && !state.escape_pending
            && ch == ')'
            && state.paren_depth == 1
            && state.bracket_depth == 0
            && state.brace_depth == 0
        {
            return Some(open_index + offset);
        }
        state.step(ch);
        if state.max_depth() > MAX_NESTING_DEPTH {
            return None;
        }
    }

    None
}

/// Extract the content of the brace block opened at `brace_index`.
///
/// Returns the inner text (exclusive of the braces) and the byte index of
/// the closing `}`. Same depth/quote discipline as
/// [`find_matching_paren`].
pub fn extract_brace_block(s: &str, brace_index: usize) -> Option<(String, usize)> {
    if s.len() > MAX_SNIPPET_LENGTH {
        return None;
    }
    if !s.get(brace_index..)?.starts_with('{') {
        return None;
    }

    let mut state = ScanState::new();
    for (offset, ch) in s[brace_index..].char_indices() {
        if !state.in_quote()
            && !state.escape_pending
            && ch == '}'
            && state.brace_depth == 1
            && state.paren_depth == 0
            && state.bracket_depth == 0
        {
            let close = brace_index + offset;
            return Some((s[brace_index + 1..close].to_string(), close));
        }
        state.step(ch);
        if state.max_depth() > MAX_NESTING_DEPTH {
            return None;
        }
    }

    None
}

/// Remove layers of parens that wrap the entire expression.
///
/// One layer is stripped per pass, and only when the `(` opening the
/// trimmed string is closed exactly by its last character. Bounded at
/// `MAX_PAREN_STRIP_PASSES`; idempotent at the fixed point.
pub fn strip_outer_parens(s: &str) -> String {
    let (stripped, _) =
        iterate_until_fixed_point(s.trim().to_string(), MAX_PAREN_STRIP_PASSES, |current| {
            let trimmed = current.trim();
            if !trimmed.starts_with('(') {
                return None;
            }
            match find_matching_paren(trimmed, 0) {
                Some(close) if close == trimmed.len() - 1 => {
                    Some(trimmed[1..close].trim().to_string())
                }
                _ => None,
            }
        });
    stripped
}
