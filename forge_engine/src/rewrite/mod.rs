//! Pattern rewrite rules
//!
//! Each rule recognizes one narrow, previously-observed shape of upstream
//! formula text and rewrites it to the canonical form the downstream
//! evaluator expects. Rules are conservative by contract: they fire only
//! when the whole input verifies against an explicit accepted shape and
//! every semantic precondition holds; anything else is `NoMatch` and the
//! input flows on untouched, never partially rewritten.
//!
//! A pipeline is an ordered [`RuleSet`]: adding or removing a rule is a
//! data change, not a control-flow change.

mod additive;
mod context;
mod expectation;

pub use additive::expand_additive_coefficients;
pub use context::{RewriteContext, TableSets};
pub use expectation::remove_expectation_factors;

use crate::log_debug;

/// Outcome of applying one rewrite rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    /// The input does not fit the rule's recognized shape; leave it alone
    NoMatch,
    /// The input matched and this is its canonical rewritten form
    Rewrite(String),
}

impl RewriteResult {
    pub fn is_match(&self) -> bool {
        matches!(self, RewriteResult::Rewrite(_))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            RewriteResult::Rewrite(text) => Some(text),
            RewriteResult::NoMatch => None,
        }
    }
}

/// A rule is a pure, total function over the input text plus context
pub type RuleFn = fn(&str, &RewriteContext) -> RewriteResult;

/// One registered rewrite rule
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: &'static str,
    pub apply: RuleFn,
}

/// Ordered rule list, tried in priority order; first match wins
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// The canonical damage-expression conditioning rules, in the order
    /// they are meant to run: the expectation double-count is removed
    /// before coefficient shapes are examined.
    pub fn damage_rules() -> Self {
        Self::new(vec![
            RewriteRule {
                name: "expectation_factor_removal",
                apply: expectation::remove_expectation_factors,
            },
            RewriteRule {
                name: "additive_coefficient_expansion",
                apply: additive::expand_additive_coefficients,
            },
        ])
    }

    /// Apply rules in order; the first `Rewrite` wins
    pub fn apply_first(&self, expr: &str, context: &RewriteContext) -> RewriteResult {
        for rule in &self.rules {
            match (rule.apply)(expr, context) {
                RewriteResult::Rewrite(text) => {
                    if context.preferences.log_rule_attempts {
                        log_debug!("Rule matched", "rule" => rule.name);
                    }
                    return RewriteResult::Rewrite(text);
                }
                RewriteResult::NoMatch => {
                    if context.preferences.log_rule_attempts {
                        log_debug!("Rule did not match", "rule" => rule.name);
                    }
                }
            }
        }
        RewriteResult::NoMatch
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::RewritePreferences;

    fn never(_: &str, _: &RewriteContext) -> RewriteResult {
        RewriteResult::NoMatch
    }

    fn shout(expr: &str, _: &RewriteContext) -> RewriteResult {
        RewriteResult::Rewrite(expr.to_uppercase())
    }

    #[test]
    fn test_first_match_wins() {
        let tables = TableSets::new();
        let preferences = RewritePreferences::default();
        let context = RewriteContext::new(&tables, &preferences);

        let rules = RuleSet::new(vec![
            RewriteRule { name: "never", apply: never },
            RewriteRule { name: "shout", apply: shout },
        ]);

        assert_eq!(
            rules.apply_first("abc", &context),
            RewriteResult::Rewrite("ABC".to_string())
        );
    }

    #[test]
    fn test_empty_set_is_no_match() {
        let tables = TableSets::new();
        let preferences = RewritePreferences::default();
        let context = RewriteContext::new(&tables, &preferences);

        assert_eq!(
            RuleSet::default().apply_first("abc", &context),
            RewriteResult::NoMatch
        );
    }

    #[test]
    fn test_damage_rules_registration_order() {
        let rules = RuleSet::damage_rules();
        let names: Vec<_> = rules.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["expectation_factor_removal", "additive_coefficient_expansion"]
        );
    }
}
