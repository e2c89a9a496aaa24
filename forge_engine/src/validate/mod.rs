//! Identifier safety validation
//!
//! The final gate before any synthesized expression is emitted. The
//! downstream evaluator exposes a small fixed set of names; an expression
//! referencing anything else is untrusted and must never leave the
//! pipeline. Property-access positions (`foo.name`) are not free variables
//! and are always ignored.

use crate::config::compile_time::validate::EVALUATOR_ALLOWLIST;
use crate::scan::ScanState;
use crate::utils::Span;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One identifier-shaped token found in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierToken {
    pub text: String,
    pub span: Span,
    /// True when the token is immediately preceded by `.`
    pub property_access: bool,
}

/// The set of free-identifier names the downstream evaluator exposes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierAllowlist {
    names: HashSet<String>,
}

impl IdentifierAllowlist {
    /// Allowlist containing only the given names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluator defaults plus record-specific extra names
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowlist = Self::default();
        allowlist.names.extend(extra.into_iter().map(Into::into));
        allowlist
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for IdentifierAllowlist {
    fn default() -> Self {
        Self::from_names(EVALUATOR_ALLOWLIST.iter().copied())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Scan every identifier-shaped token in `expr`, quote-aware.
///
/// Numeric literals are consumed whole so the exponent of `1e3` or the hex
/// digits of `0x1f` never surface as identifiers. The shared token walk
/// also backs constant substitution, which needs the same
/// property-access discipline.
pub fn identifier_tokens(expr: &str) -> Vec<IdentifierToken> {
    let chars: Vec<(usize, char)> = expr.char_indices().collect();
    let mut tokens = Vec::new();
    let mut state = ScanState::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];

        if state.in_quote() || state.escape_pending {
            state.step(ch);
            i += 1;
            continue;
        }

        if is_ident_start(ch) {
            let start = pos;
            let mut j = i + 1;
            while j < chars.len() && is_ident_continue(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map(|(p, _)| *p).unwrap_or(expr.len());
            let property_access = i > 0 && chars[i - 1].1 == '.';
            tokens.push(IdentifierToken {
                text: expr[start..end].to_string(),
                span: Span::new(start, end),
                property_access,
            });
            i = j;
            continue;
        }

        if ch.is_ascii_digit() {
            let mut j = i + 1;
            while j < chars.len()
                && (chars[j].1.is_ascii_alphanumeric() || chars[j].1 == '.' || chars[j].1 == '_')
            {
                j += 1;
            }
            i = j;
            continue;
        }

        state.step(ch);
        i += 1;
    }

    tokens
}

/// Free identifiers of an expression: every identifier token that is not a
/// property access.
pub fn free_identifiers(expr: &str) -> Vec<IdentifierToken> {
    identifier_tokens(expr)
        .into_iter()
        .filter(|t| !t.property_access)
        .collect()
}

/// True when `expr` references any free identifier outside `allowlist`.
///
/// Expressions failing this check are untrusted: callers fall back to the
/// unmodified input or drop the expression, they never emit "best effort".
pub fn has_unknown_free_identifiers(expr: &str, allowlist: &IdentifierAllowlist) -> bool {
    free_identifiers(expr)
        .iter()
        .any(|t| !allowlist.contains(&t.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_identifier_detected() {
        let allow = IdentifierAllowlist::from_names(["params", "Math"]);
        assert!(has_unknown_free_identifiers(
            "params.foo + Math.max(1, bar)",
            &allow
        ));
    }

    #[test]
    fn test_property_access_ignored() {
        let allow = IdentifierAllowlist::from_names(["params"]);
        assert!(!has_unknown_free_identifiers("params.foo.bar", &allow));
    }

    #[test]
    fn test_quoted_text_ignored() {
        let allow = IdentifierAllowlist::from_names(["talent"]);
        assert!(!has_unknown_free_identifiers(
            "talent.e[\"bar baz\"]",
            &allow
        ));
        assert!(!has_unknown_free_identifiers("talent.e['提升']", &allow));
    }

    #[test]
    fn test_numeric_literals_ignored() {
        let allow = IdentifierAllowlist::from_names(["x"]);
        assert!(!has_unknown_free_identifiers("x * 1e3 + 0x1f + 2.5", &allow));
    }

    #[test]
    fn test_default_allowlist_accepts_evaluator_names() {
        let allow = IdentifierAllowlist::default();
        assert!(!has_unknown_free_identifiers(
            "dmg(talent.e[\"技能伤害\"] * Math.min(cons, 2), 'e')",
            &allow
        ));
    }

    #[test]
    fn test_with_extra_names() {
        let allow = IdentifierAllowlist::with_extra(["stacks"]);
        assert!(!has_unknown_free_identifiers("stacks * 2", &allow));
        assert!(has_unknown_free_identifiers("layers * 2", &allow));
    }

    #[test]
    fn test_token_spans_and_flags() {
        let tokens = identifier_tokens("a.b + c");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "a");
        assert!(!tokens[0].property_access);
        assert_eq!(tokens[1].text, "b");
        assert!(tokens[1].property_access);
        assert_eq!(tokens[2].text, "c");
        assert_eq!(tokens[2].span, Span::new(6, 7));
    }
}
