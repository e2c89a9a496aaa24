//! Whole-identifier constant substitution

use super::SymbolTable;
use crate::config::compile_time::consts::{MAX_INLINED_LENGTH, MAX_RESOLVE_PASSES};
use crate::scan::ScanState;
use crate::utils::iterate_until_fixed_point;
use crate::validate::identifier_tokens;

/// Inline resolved constants into `expr` until nothing changes, bounded at
/// the resolver pass limit.
///
/// Substitution is whole-identifier only and never fires in a
/// property-access position: `atk` inside `talent.atk` names a property of
/// `talent`, not the constant. Non-atomic replacement text is
/// parenthesized so inlining cannot change operator binding.
pub fn inline_constants(expr: &str, table: &SymbolTable) -> String {
    if table.is_empty() {
        return expr.to_string();
    }
    let (inlined, _) =
        iterate_until_fixed_point(expr.to_string(), MAX_RESOLVE_PASSES, |current| {
            let next = substitute_once(current, table);
            if next.len() > MAX_INLINED_LENGTH {
                return None;
            }
            Some(next)
        });
    inlined
}

/// One substitution pass over the expression
pub(super) fn substitute_once(expr: &str, table: &SymbolTable) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut copied_to = 0;

    for token in identifier_tokens(expr) {
        if token.property_access {
            continue;
        }
        if let Some(value) = table.get(&token.text) {
            out.push_str(&expr[copied_to..token.span.start]);
            if needs_parens(value) {
                out.push('(');
                out.push_str(value);
                out.push(')');
            } else {
                out.push_str(value);
            }
            copied_to = token.span.end;
        }
    }

    out.push_str(&expr[copied_to..]);
    out
}

/// A replacement needs parens when it carries a top-level operator that
/// could rebind against the surrounding expression
fn needs_parens(value: &str) -> bool {
    let mut state = ScanState::new();
    for ch in value.trim().chars() {
        if state.at_top_level() && "+-*/%?:<>=&|".contains(ch) {
            return true;
        }
        state.step(ch);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> SymbolTable {
        let mut t = SymbolTable::new();
        for (name, value) in entries {
            t.insert(name, value);
        }
        t
    }

    #[test]
    fn test_inline_atomic_value() {
        let t = table(&[("bonus", "0.24")]);
        assert_eq!(inline_constants("atkPct + bonus", &t), "atkPct + 0.24");
    }

    #[test]
    fn test_inline_wraps_compound_value() {
        let t = table(&[("bonus", "0.2 + 0.04")]);
        assert_eq!(
            inline_constants("base * bonus", &t),
            "base * (0.2 + 0.04)"
        );
    }

    #[test]
    fn test_property_access_not_substituted() {
        let t = table(&[("atk", "100")]);
        assert_eq!(
            inline_constants("talent.atk + atk", &t),
            "talent.atk + 100"
        );
    }

    #[test]
    fn test_whole_identifier_only() {
        let t = table(&[("a", "1")]);
        assert_eq!(inline_constants("abc + a", &t), "abc + 1");
    }

    #[test]
    fn test_quoted_names_untouched() {
        let t = table(&[("rate", "5")]);
        assert_eq!(
            inline_constants("talent.e[\"rate\"] * rate", &t),
            "talent.e[\"rate\"] * 5"
        );
    }

    #[test]
    fn test_no_table_no_change() {
        let t = SymbolTable::new();
        assert_eq!(inline_constants("a + b", &t), "a + b");
    }
}
