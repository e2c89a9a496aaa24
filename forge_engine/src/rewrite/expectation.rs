//! Redundant expectation-factor removal
//!
//! An `.avg` quantity is already the crit-expected value. Upstream text
//! sometimes multiplies it by a `(1 + crit_chance * crit_damage)` style
//! factor anyway, double-counting the expectation:
//!
//! ```text
//! x.avg * (1 + calc(attr.cpct) * calc(attr.cdmg))   →   x.avg
//! ```
//!
//! The factor is recognized by the joint presence of the crit-chance and
//! crit-damage reads inside one parenthesized multiplicand directly after
//! an `.avg` or `.dmg` accessor; the accessor is normalized to `.avg`
//! either way. Removal runs to a bounded fixed point because deleting one
//! occurrence can reveal another earlier in the string.

use super::{RewriteContext, RewriteResult};
use crate::config::compile_time::rewrite::{
    CRIT_CHANCE_READ, CRIT_DAMAGE_READ, EXPECTED_VALUE_SUFFIX, MAX_EXPECTATION_PASSES,
    RAW_DAMAGE_SUFFIX,
};
use crate::scan::{clause_at, find_matching_paren, ScanState};
use crate::utils::iterate_until_fixed_point;

pub fn remove_expectation_factors(expr: &str, _context: &RewriteContext) -> RewriteResult {
    let (removed, passes) =
        iterate_until_fixed_point(expr.to_string(), MAX_EXPECTATION_PASSES, remove_one);

    if passes > 0 {
        RewriteResult::Rewrite(removed)
    } else {
        RewriteResult::NoMatch
    }
}

/// Remove the first redundant factor found, left to right
fn remove_one(s: &str) -> Option<String> {
    for accessor in accessor_positions(s) {
        let after_accessor = accessor + EXPECTED_VALUE_SUFFIX.len();

        let star = next_non_space(s, after_accessor);
        if !s[star..].starts_with('*') {
            continue;
        }
        let open = next_non_space(s, star + 1);
        if !s[open..].starts_with('(') {
            continue;
        }
        let Some(close) = find_matching_paren(s, open) else {
            continue;
        };

        let factor = &s[open + 1..close];
        if !factor.contains(CRIT_CHANCE_READ) || !factor.contains(CRIT_DAMAGE_READ) {
            continue;
        }

        // The factor must multiply the accessor's own clause, not a later
        // argument.
        let clause = clause_at(s, accessor);
        if close >= clause.end {
            continue;
        }

        return Some(format!(
            "{}{}{}",
            &s[..accessor],
            EXPECTED_VALUE_SUFFIX,
            &s[close + 1..]
        ));
    }

    None
}

fn next_non_space(s: &str, from: usize) -> usize {
    s[from..]
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(off, _)| from + off)
        .unwrap_or(s.len())
}

/// Byte offsets of every `.avg` / `.dmg` accessor token outside quotes
fn accessor_positions(s: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut state = ScanState::new();

    for (i, ch) in s.char_indices() {
        if ch == '.' && !state.in_quote() && !state.escape_pending {
            let rest = &s[i..];
            if rest.starts_with(EXPECTED_VALUE_SUFFIX) || rest.starts_with(RAW_DAMAGE_SUFFIX) {
                let boundary_after = s[i + EXPECTED_VALUE_SUFFIX.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'));
                let attached_before = s[..i]
                    .chars()
                    .last()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == ']' || c == ')');
                if boundary_after && attached_before {
                    positions.push(i);
                }
            }
        }
        state.step(ch);
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::RewritePreferences;
    use crate::rewrite::TableSets;

    fn apply(expr: &str) -> RewriteResult {
        let tables = TableSets::new();
        let preferences = RewritePreferences::default();
        let context = RewriteContext::new(&tables, &preferences);
        remove_expectation_factors(expr, &context)
    }

    #[test]
    fn test_basic_removal() {
        assert_eq!(
            apply("x.avg * (1 + calc(attr.cpct) * calc(attr.cdmg))"),
            RewriteResult::Rewrite("x.avg".to_string())
        );
    }

    #[test]
    fn test_raw_accessor_normalized_to_avg() {
        assert_eq!(
            apply("x.dmg * (1 + calc(attr.cpct) * calc(attr.cdmg))"),
            RewriteResult::Rewrite("x.avg".to_string())
        );
    }

    #[test]
    fn test_two_factors_removed_at_fixed_point() {
        let input = "a.avg * (calc(attr.cpct) * calc(attr.cdmg)) + b.dmg * (1 + calc(attr.cpct) * calc(attr.cdmg))";
        assert_eq!(
            apply(input),
            RewriteResult::Rewrite("a.avg + b.avg".to_string())
        );
    }

    #[test]
    fn test_factor_without_both_reads_kept() {
        let input = "x.avg * (1 + calc(attr.cpct))";
        assert_eq!(apply(input), RewriteResult::NoMatch);

        let input = "x.avg * (1 + calc(attr.cdmg))";
        assert_eq!(apply(input), RewriteResult::NoMatch);
    }

    #[test]
    fn test_plain_accessor_untouched() {
        assert_eq!(apply("x.avg * 2"), RewriteResult::NoMatch);
        assert_eq!(apply("x.avg"), RewriteResult::NoMatch);
    }

    #[test]
    fn test_surrounding_text_preserved() {
        let input = "dmg(x.avg * (1 + calc(attr.cpct) * calc(attr.cdmg)) * 0.5, key)";
        assert_eq!(
            apply(input),
            RewriteResult::Rewrite("dmg(x.avg * 0.5, key)".to_string())
        );
    }

    #[test]
    fn test_quoted_accessor_ignored() {
        assert_eq!(
            apply("talent.e[\"a.avg * b\"] * 2"),
            RewriteResult::NoMatch
        );
    }

    #[test]
    fn test_factor_in_other_argument_not_removed() {
        // The parenthesized factor lives in the next argument; the comma
        // boundary must stop the rewrite.
        let input = "f(x.avg, y * (calc(attr.cpct) * calc(attr.cdmg)))";
        assert_eq!(apply(input), RewriteResult::NoMatch);
    }
}
