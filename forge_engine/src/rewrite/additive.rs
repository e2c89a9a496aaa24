//! Additive-coefficient expansion
//!
//! Upstream translators systematically mistake a flat "extra multiplier"
//! table for a percentage damage bonus, producing multiplicative chains
//! like
//!
//! ```text
//! dmg(talent.e["技能伤害"] * (1 + toRatio(talent.e["伤害提升"]) * 3), key)
//! ```
//!
//! where the game actually adds the increment table per stack:
//!
//! ```text
//! dmg(talent.e["技能伤害"] + talent.e["伤害提升"] * 3, key)
//! ```
//!
//! The rule fires only when every part verifies: the base is a table
//! lookup in its talent's allowed set, every factor matches one of the
//! five recognized `1 + ratio*N` spellings, every increment table is
//! allowed and its label passes the allow/deny patterns, and the stack
//! multiplier is an integer in bounds. One unverifiable factor and the
//! whole expression is left untouched.

use super::{RewriteContext, RewriteResult};
use crate::config::compile_time::rewrite::{
    DAMAGE_CALL_HEADS, INCREMENT_LABEL_ALLOW, INCREMENT_LABEL_DENY, MAX_STACK_MULTIPLIER,
    MIN_STACK_MULTIPLIER, RATIO_CALL,
};
use crate::log_debug;
use crate::logging::codes;
use crate::scan::{parse_top_level_call, split_top_level, strip_outer_parens};
use regex::Regex;
use std::sync::OnceLock;

/// A `talent.<key>["<name>"]` table lookup
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableLookup {
    key: String,
    name: String,
}

impl TableLookup {
    fn render(&self) -> String {
        format!("talent.{}[\"{}\"]", self.key, self.name)
    }
}

/// One matched `1 + ratio(table)*N` factor
#[derive(Debug)]
struct Increment {
    lookup: TableLookup,
    multiplier: i64,
}

pub fn expand_additive_coefficients(expr: &str, context: &RewriteContext) -> RewriteResult {
    for head in DAMAGE_CALL_HEADS {
        if let Some(args) = parse_top_level_call(expr, head) {
            return expand_call(head, &args, context);
        }
    }
    RewriteResult::NoMatch
}

fn expand_call(head: &str, args: &[String], context: &RewriteContext) -> RewriteResult {
    let Some(first) = args.first() else {
        return RewriteResult::NoMatch;
    };

    let factors = split_top_level(first, '*');
    if factors.len() < 2 {
        return RewriteResult::NoMatch;
    }

    let Some(base) = parse_table_lookup(&factors[0]) else {
        return RewriteResult::NoMatch;
    };
    if !context.tables.allows(&base.key, &base.name) {
        log_debug!("Base table not in allowed set",
            "code" => codes::rewrite::TABLE_NOT_ALLOWED,
            "key" => base.key.as_str(),
            "table" => base.name.as_str()
        );
        return RewriteResult::NoMatch;
    }

    // Every factor must independently verify for the whole expression to
    // match.
    let mut increments = Vec::with_capacity(factors.len() - 1);
    for factor in &factors[1..] {
        let Some(increment) = match_increment(factor) else {
            return RewriteResult::NoMatch;
        };
        if !(MIN_STACK_MULTIPLIER..=MAX_STACK_MULTIPLIER).contains(&increment.multiplier) {
            log_debug!("Stack multiplier out of range",
                "code" => codes::rewrite::MULTIPLIER_OUT_OF_RANGE,
                "multiplier" => increment.multiplier
            );
            return RewriteResult::NoMatch;
        }
        if !context
            .tables
            .allows(&increment.lookup.key, &increment.lookup.name)
        {
            log_debug!("Increment table not in allowed set",
                "code" => codes::rewrite::TABLE_NOT_ALLOWED,
                "key" => increment.lookup.key.as_str(),
                "table" => increment.lookup.name.as_str()
            );
            return RewriteResult::NoMatch;
        }
        if context.preferences.enforce_label_patterns
            && !increment_label_allowed(&increment.lookup.name)
        {
            log_debug!("Increment label failed the pattern gate",
                "code" => codes::rewrite::LABEL_PATTERN_REJECTED,
                "table" => increment.lookup.name.as_str()
            );
            return RewriteResult::NoMatch;
        }
        increments.push(increment);
    }

    let mut rebuilt = base.render();
    for increment in &increments {
        if increment.multiplier == 1 {
            rebuilt.push_str(&format!(" + {}", increment.lookup.render()));
        } else {
            rebuilt.push_str(&format!(
                " + {} * {}",
                increment.lookup.render(),
                increment.multiplier
            ));
        }
    }

    let mut call_args = vec![rebuilt];
    call_args.extend(args.iter().skip(1).cloned());
    RewriteResult::Rewrite(format!("{}({})", head, call_args.join(", ")))
}

/// Match one increment factor against the five accepted spellings:
/// `1 + toRatio(x)*N`, `1 + x*N/100`, `1 + x/100*N`, `1 + (x*N)/100`,
/// `1 + (x/100)*N`, all algebraically the same flat-ratio-per-stack
/// shape.
fn match_increment(factor: &str) -> Option<Increment> {
    let stripped = strip_outer_parens(factor);

    let parts = split_top_level(&stripped, '+');
    if parts.len() != 2 || parts[0] != "1" {
        return None;
    }
    let rhs = &parts[1];

    // x*N/100 and (x*N)/100
    let division = split_top_level(rhs, '/');
    if division.len() == 2 && division[1] == "100" {
        let numerator = strip_outer_parens(&division[0]);
        let product = split_top_level(&numerator, '*');
        if product.len() == 2 {
            let lookup = parse_table_lookup(&product[0])?;
            let multiplier = parse_multiplier(&product[1])?;
            return Some(Increment { lookup, multiplier });
        }
        return None;
    }

    // toRatio(x)*N, x/100*N and (x/100)*N
    let product = split_top_level(rhs, '*');
    if product.len() != 2 {
        return None;
    }
    let multiplier = parse_multiplier(&product[1])?;
    let left = strip_outer_parens(&product[0]);

    if let Some(ratio_args) = parse_top_level_call(&left, RATIO_CALL) {
        if ratio_args.len() != 1 {
            return None;
        }
        let lookup = parse_table_lookup(&ratio_args[0])?;
        return Some(Increment { lookup, multiplier });
    }

    let division = split_top_level(&left, '/');
    if division.len() == 2 && division[1] == "100" {
        let lookup = parse_table_lookup(&division[0])?;
        return Some(Increment { lookup, multiplier });
    }

    None
}

fn parse_multiplier(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Parse a `talent.<key>["<name>"]` lookup, single or double quoted.
/// Labels carrying escapes are refused rather than guessed at.
fn parse_table_lookup(s: &str) -> Option<TableLookup> {
    let rest = s.trim().strip_prefix("talent.")?;

    let key_len = rest
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(rest.len());
    let key = &rest[..key_len];
    if key.is_empty() {
        return None;
    }

    let after_key = &rest[key_len..];
    let inner = after_key.strip_prefix('[')?;
    let quote = inner.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let name_end = inner[1..].find(quote)? + 1;
    let name = &inner[1..name_end];
    if name.is_empty() || name.contains('\\') {
        return None;
    }

    let tail = inner[name_end + 1..].strip_prefix(']')?;
    if !tail.trim().is_empty() {
        return None;
    }

    Some(TableLookup {
        key: key.to_string(),
        name: name.to_string(),
    })
}

fn increment_label_allowed(name: &str) -> bool {
    static ALLOW: OnceLock<Regex> = OnceLock::new();
    static DENY: OnceLock<Regex> = OnceLock::new();

    let allow = ALLOW.get_or_init(|| Regex::new(INCREMENT_LABEL_ALLOW).expect("allow pattern"));
    let deny = DENY.get_or_init(|| Regex::new(INCREMENT_LABEL_DENY).expect("deny pattern"));

    allow.is_match(name) && !deny.is_match(name)
}
