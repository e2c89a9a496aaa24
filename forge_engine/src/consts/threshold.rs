//! Threshold-call rewriting
//!
//! Upstream documents declare small named conditionals keyed on a numeric
//! threshold, typically a constellation or ascension gate. A threshold
//! spec maps a call name to the compared subject and its threshold(s);
//! calls are rewritten into the ternary form the downstream evaluator
//! understands:
//!
//! - one threshold:  `gate(a, b)`    → `(cons >= 2 ? a : b)`
//! - two thresholds: `gate(a, b, c)` → `(cons >= 4 ? a : cons >= 2 ? b : c)`
//!
//! Calls whose name is unknown or whose arity does not fit the declared
//! threshold count are left untouched.

use crate::scan::extract_call_args;
use crate::validate::identifier_tokens;
use serde::{Deserialize, Serialize};

/// A named 2-/3-branch conditional mapped to its numeric threshold(s)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Call name as it appears in declaration text
    pub name: String,
    /// Identifier compared against the thresholds (e.g. `cons`)
    pub subject: String,
    /// One threshold for a 2-arm call, two for a 3-arm call
    pub thresholds: Vec<f64>,
}

impl ThresholdSpec {
    pub fn new(name: &str, subject: &str, thresholds: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            subject: subject.to_string(),
            thresholds,
        }
    }

    fn expected_arity(&self) -> usize {
        self.thresholds.len() + 1
    }

    fn ternary(&self, args: &[String]) -> String {
        let mut out = String::from("(");
        for (threshold, arg) in self.thresholds.iter().zip(args.iter()) {
            out.push_str(&format!(
                "{} >= {} ? {} : ",
                self.subject,
                format_threshold(*threshold),
                arg
            ));
        }
        out.push_str(args.last().map(String::as_str).unwrap_or_default());
        out.push(')');
        out
    }
}

fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Rewrite every recognized threshold call in `expr` to ternary form.
/// One pass over the text; the resolver re-runs this each resolution pass
/// so calls revealed by substitution are also rewritten.
pub fn rewrite_threshold_calls(expr: &str, specs: &[ThresholdSpec]) -> String {
    if specs.is_empty() {
        return expr.to_string();
    }

    let mut out = String::with_capacity(expr.len());
    let mut copied_to = 0;

    for token in identifier_tokens(expr) {
        if token.span.start < copied_to || token.property_access {
            continue;
        }
        let Some(spec) = specs.iter().find(|s| s.name == token.text) else {
            continue;
        };
        if !expr[token.span.end..].starts_with('(') {
            continue;
        }
        let Some((args, close)) = extract_call_args(expr, token.span.end) else {
            continue;
        };
        if args.len() != spec.expected_arity() {
            continue;
        }

        out.push_str(&expr[copied_to..token.span.start]);
        out.push_str(&spec.ternary(&args));
        copied_to = close + 1;
    }

    out.push_str(&expr[copied_to..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate2() -> Vec<ThresholdSpec> {
        vec![ThresholdSpec::new("afterC2", "cons", vec![2.0])]
    }

    #[test]
    fn test_two_arm_rewrite() {
        let out = rewrite_threshold_calls("afterC2(0.5, 0.3) * atk", &gate2());
        assert_eq!(out, "(cons >= 2 ? 0.5 : 0.3) * atk");
    }

    #[test]
    fn test_three_arm_rewrite() {
        let specs = vec![ThresholdSpec::new("phaseGate", "cons", vec![4.0, 2.0])];
        let out = rewrite_threshold_calls("phaseGate(3, 2, 1)", &specs);
        assert_eq!(out, "(cons >= 4 ? 3 : cons >= 2 ? 2 : 1)");
    }

    #[test]
    fn test_arity_mismatch_left_untouched() {
        let out = rewrite_threshold_calls("afterC2(1, 2, 3)", &gate2());
        assert_eq!(out, "afterC2(1, 2, 3)");
    }

    #[test]
    fn test_unknown_call_left_untouched() {
        let out = rewrite_threshold_calls("other(1, 2)", &gate2());
        assert_eq!(out, "other(1, 2)");
    }

    #[test]
    fn test_nested_arguments_survive() {
        let out = rewrite_threshold_calls("afterC2(f(a, b), 0.3)", &gate2());
        assert_eq!(out, "(cons >= 2 ? f(a, b) : 0.3)");
    }

    #[test]
    fn test_property_access_call_not_rewritten() {
        let out = rewrite_threshold_calls("obj.afterC2(1, 2)", &gate2());
        assert_eq!(out, "obj.afterC2(1, 2)");
    }

    #[test]
    fn test_fractional_threshold_kept() {
        let specs = vec![ThresholdSpec::new("over", "level", vec![2.5])];
        let out = rewrite_threshold_calls("over(1, 0)", &specs);
        assert_eq!(out, "(level >= 2.5 ? 1 : 0)");
    }
}
