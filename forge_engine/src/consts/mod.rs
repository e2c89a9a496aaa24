//! Constant resolution
//!
//! Builds a symbol table from declaration-like upstream text and inlines
//! it to a fixed point. Declarations arrive as a loose script fragment of
//! `const`/`let`-style `name = expression` lines, together with threshold
//! specs for the named conditionals the fragment may call.
//!
//! Resolution is bounded: entries that never become provably closed within
//! the pass limit are simply dropped (with a warning), and expressions
//! referencing them stay non-rewritable. An unresolved constant is never
//! an error.

mod inline;
mod threshold;

pub use inline::inline_constants;
pub use threshold::{rewrite_threshold_calls, ThresholdSpec};

use crate::config::compile_time::consts::{MAX_DECLARATIONS, MAX_RESOLVE_PASSES};
use crate::config::runtime::ResolvePreferences;
use crate::logging::codes;
use crate::scan::{split_top_level, ScanState};
use crate::validate::{free_identifiers, IdentifierAllowlist};
use crate::{log_debug, log_warning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved constants: name → fully-inlined expression text.
///
/// Grows monotonically during resolution and never shrinks; an entry is
/// only inserted once it is provably closed (its free identifiers are all
/// evaluator-exposed names).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    resolved: BTreeMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, expr: &str) {
        self.resolved.insert(name.to_string(), expr.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.resolved.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolved.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A declaration awaiting resolution
#[derive(Debug, Clone)]
pub struct PendingSymbol {
    pub name: String,
    pub expr: String,
}

/// Build a symbol table from a declaration document.
///
/// Numeric-literal declarations resolve immediately; everything else goes
/// through up to `MAX_RESOLVE_PASSES` substitute-and-check passes, with
/// threshold calls rewritten to ternary form as they surface. A pass that
/// promotes nothing ends resolution early.
pub fn resolve_constants(
    doc: &str,
    thresholds: &[ThresholdSpec],
    allowlist: &IdentifierAllowlist,
    preferences: &ResolvePreferences,
) -> SymbolTable {
    let declarations = parse_declarations(doc);

    let mut table = SymbolTable::new();
    let mut pending: Vec<PendingSymbol> = Vec::new();

    for (name, rhs) in declarations {
        if is_numeric_literal(&rhs) {
            table.insert(&name, rhs.trim());
        } else {
            pending.push(PendingSymbol {
                expr: rewrite_threshold_calls(&rhs, thresholds),
                name,
            });
        }
    }

    for pass in 0..MAX_RESOLVE_PASSES {
        if pending.is_empty() {
            break;
        }

        let mut progressed = false;
        let mut still_pending = Vec::with_capacity(pending.len());

        for mut symbol in pending {
            let substituted = inline::substitute_once(&symbol.expr, &table);
            symbol.expr = rewrite_threshold_calls(&substituted, thresholds);

            if is_closed(&symbol.expr, allowlist) {
                if preferences.log_promotions {
                    log_debug!("Constant promoted",
                        "name" => symbol.name.as_str(),
                        "pass" => pass + 1
                    );
                }
                table.insert(&symbol.name, &symbol.expr);
                progressed = true;
            } else {
                still_pending.push(symbol);
            }
        }

        pending = still_pending;
        if !progressed {
            break;
        }
    }

    if preferences.log_unresolved_symbols {
        for symbol in &pending {
            log_warning!(code = codes::consts::UNRESOLVED_SYMBOL,
                "Constant never closed within the pass bound",
                "name" => symbol.name.as_str(),
                "passes" => MAX_RESOLVE_PASSES
            );
        }
    }

    table
}

/// An entry is closed when every free identifier it still references is an
/// evaluator-exposed name
fn is_closed(expr: &str, allowlist: &IdentifierAllowlist) -> bool {
    free_identifiers(expr)
        .iter()
        .all(|t| allowlist.contains(&t.text))
}

/// Extract `name = expression` declarations in source order.
///
/// Statements split on top-level newlines and semicolons; an optional
/// `const`/`let`/`var` keyword is stripped; anything that does not fit the
/// declaration shape is skipped, never an error.
fn parse_declarations(doc: &str) -> Vec<(String, String)> {
    let mut declarations = Vec::new();

    for line in split_top_level(doc, '\n') {
        for statement in split_top_level(&line, ';') {
            let statement = statement.trim();
            if statement.is_empty() || statement.starts_with("//") {
                continue;
            }
            if let Some(declaration) = parse_declaration(statement) {
                declarations.push(declaration);
                if declarations.len() >= MAX_DECLARATIONS {
                    log_warning!(code = codes::consts::TOO_MANY_DECLARATIONS,
                        "Declaration bound reached, ignoring the rest",
                        "max" => MAX_DECLARATIONS
                    );
                    return declarations;
                }
            }
        }
    }

    declarations
}

fn parse_declaration(statement: &str) -> Option<(String, String)> {
    let body = statement
        .strip_prefix("const ")
        .or_else(|| statement.strip_prefix("let "))
        .or_else(|| statement.strip_prefix("var "))
        .unwrap_or(statement);

    let eq = find_assignment(body)?;
    let name = body[..eq].trim();
    let rhs = body[eq + 1..].trim();

    if name.is_empty() || rhs.is_empty() || !is_identifier(name) {
        return None;
    }

    Some((name.to_string(), rhs.to_string()))
}

/// First top-level `=` that is an assignment, not part of a comparison
fn find_assignment(s: &str) -> Option<usize> {
    let mut state = ScanState::new();
    let mut prev = ' ';
    let mut chars = s.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if ch == '=' && state.at_top_level() {
            let next = chars.peek().map(|(_, c)| *c);
            if next != Some('=') && next != Some('>') && !matches!(prev, '=' | '!' | '<' | '>') {
                return Some(i);
            }
        }
        state.step(ch);
        prev = ch;
    }

    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

fn is_numeric_literal(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '+' | '-'))
        && trimmed.parse::<f64>().is_ok()
}
