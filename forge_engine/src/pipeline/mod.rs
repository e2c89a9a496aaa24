//! Per-record conditioning pipeline
//!
//! Wires the stages together for one upstream record: constant resolution
//! → per-expression inlining, rule application and the identifier safety
//! gate → promote-table rendering. One record in, one artifact out; the
//! engine holds no state across records, so the enclosing application may
//! fan records out over as many workers as it likes.

mod error;
mod result;

pub use error::PipelineError;
pub use result::{
    ConditionedExpression, ExpressionStatus, RecordArtifact, RecordStats, RenderedGroup,
};

use crate::config::compile_time::pipeline::{MAX_EXPRESSIONS, MAX_PROMOTE_GROUPS};
use crate::config::runtime::RuntimeConfig;
use crate::consts::{inline_constants, resolve_constants, SymbolTable, ThresholdSpec};
use crate::logging::{self, codes};
use crate::rewrite::{RewriteContext, RewriteResult, RuleSet, TableSets};
use crate::template::{render_promote_rows, PromoteRow};
use crate::validate::{has_unknown_free_identifiers, IdentifierAllowlist};
use crate::{log_debug, log_success, log_warning};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A named expression snippet from an upstream record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedExpression {
    pub name: String,
    pub text: String,
}

/// A named group of promote rows sharing one template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteGroup {
    pub name: String,
    pub rows: Vec<PromoteRow>,
}

/// One upstream record: everything a single character/weapon carries into
/// the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordInput {
    pub id: String,
    #[serde(default)]
    pub tables: TableSets,
    #[serde(default)]
    pub const_doc: Option<String>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdSpec>,
    /// Extra allowlist names this record's evaluator context exposes
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub expressions: Vec<NamedExpression>,
    #[serde(default)]
    pub promote: Vec<PromoteGroup>,
}

/// Condition one record through the full pipeline
pub fn condition_record(
    input: &RecordInput,
    config: &RuntimeConfig,
) -> Result<RecordArtifact, PipelineError> {
    validate_input_bounds(input)?;

    logging::with_record_context(&input.id, || {
        let started = Instant::now();
        let mut stats = RecordStats::default();

        // Stage 1: constant resolution
        let allowlist = IdentifierAllowlist::with_extra(input.allow.iter().cloned());
        let symbols = match input.const_doc.as_deref() {
            Some(doc) => resolve_constants(doc, &input.thresholds, &allowlist, &config.resolve),
            None => SymbolTable::new(),
        };
        stats.symbols_resolved = symbols.len();
        if !symbols.is_empty() {
            log_success!(codes::success::SYMBOLS_RESOLVED,
                "Constants resolved",
                "resolved" => symbols.len()
            );
        }

        // Stage 2: expression conditioning
        let rules = RuleSet::damage_rules();
        let context = RewriteContext::new(&input.tables, &config.rewrite).with_symbols(&symbols);

        let mut expressions = Vec::with_capacity(input.expressions.len());
        for expression in &input.expressions {
            let conditioned =
                condition_expression(expression, &symbols, &rules, &context, &allowlist);
            stats.count(conditioned.status);
            expressions.push(conditioned);
        }

        // Stage 3: promote-table rendering
        let mut tables = Vec::with_capacity(input.promote.len());
        for group in &input.promote {
            let templates = render_promote_rows(&group.rows, &config.render);
            stats.tables_rendered += templates.len();
            tables.push(RenderedGroup {
                name: group.name.clone(),
                templates,
            });
        }
        if stats.tables_rendered > 0 {
            log_success!(codes::success::TABLES_RENDERED,
                "Promote tables rendered",
                "tables" => stats.tables_rendered
            );
        }

        let artifact = RecordArtifact {
            id: input.id.clone(),
            expressions,
            tables,
            stats,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        artifact.log_summary();

        Ok(artifact)
    })
}

/// Condition one expression: inline constants, try the rules in order,
/// then gate on the identifier allowlist. Fallback order on gate failure:
/// the unmodified original, then rejection. A failing "best effort" text
/// is never emitted.
fn condition_expression(
    expression: &NamedExpression,
    symbols: &SymbolTable,
    rules: &RuleSet,
    context: &RewriteContext,
    allowlist: &IdentifierAllowlist,
) -> ConditionedExpression {
    let inlined = inline_constants(&expression.text, symbols);

    let candidate = match rules.apply_first(&inlined, context) {
        RewriteResult::Rewrite(text) => text,
        RewriteResult::NoMatch => inlined,
    };

    if !has_unknown_free_identifiers(&candidate, allowlist) {
        let status = if candidate == expression.text {
            ExpressionStatus::Unchanged
        } else {
            log_success!(codes::success::EXPRESSION_REWRITTEN,
                "Expression conditioned",
                "name" => expression.name.as_str()
            );
            ExpressionStatus::Rewritten
        };
        return ConditionedExpression {
            name: expression.name.clone(),
            status,
            text: Some(candidate),
        };
    }

    // The conditioned text failed the gate; fall back to the original.
    if !has_unknown_free_identifiers(&expression.text, allowlist) {
        log_debug!("Conditioned text failed the safety gate, original kept",
            "name" => expression.name.as_str()
        );
        return ConditionedExpression {
            name: expression.name.clone(),
            status: ExpressionStatus::Unchanged,
            text: Some(expression.text.clone()),
        };
    }

    log_warning!(code = codes::validate::UNSAFE_EXPRESSION,
        "Expression references unknown identifiers, nothing emitted",
        "name" => expression.name.as_str()
    );
    ConditionedExpression {
        name: expression.name.clone(),
        status: ExpressionStatus::Rejected,
        text: None,
    }
}

fn validate_input_bounds(input: &RecordInput) -> Result<(), PipelineError> {
    if input.expressions.len() > MAX_EXPRESSIONS {
        return Err(PipelineError::TooManyExpressions {
            record: input.id.clone(),
            count: input.expressions.len(),
            max: MAX_EXPRESSIONS,
        });
    }
    if input.promote.len() > MAX_PROMOTE_GROUPS {
        return Err(PipelineError::TooManyPromoteGroups {
            record: input.id.clone(),
            count: input.promote.len(),
            max: MAX_PROMOTE_GROUPS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record() -> RecordInput {
        let mut tables = TableSets::new();
        tables.insert("e", ["技能伤害", "伤害提升"]);

        RecordInput {
            id: "test-record".to_string(),
            tables,
            const_doc: Some("stacks = 3".to_string()),
            expressions: vec![
                NamedExpression {
                    name: "skill".to_string(),
                    text: "dmg(talent.e[\"技能伤害\"] * (1 + toRatio(talent.e[\"伤害提升\"]) * stacks), 'e')"
                        .to_string(),
                },
                NamedExpression {
                    name: "plain".to_string(),
                    text: "attr.atk * 2".to_string(),
                },
                NamedExpression {
                    name: "bad".to_string(),
                    text: "hack() + attr.atk".to_string(),
                },
            ],
            promote: vec![PromoteGroup {
                name: "e".to_string(),
                rows: vec![
                    PromoteRow {
                        level: 1,
                        params: vec![10.0],
                        template_text: "伤害|造成{param1:F1}点伤害".to_string(),
                    },
                    PromoteRow {
                        level: 2,
                        params: vec![20.0],
                        template_text: "伤害|造成{param1:F1}点伤害".to_string(),
                    },
                ],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_full_record_conditioning() {
        let artifact = condition_record(&record(), &RuntimeConfig::default()).unwrap();

        assert_eq!(artifact.id, "test-record");
        assert_eq!(artifact.stats.symbols_resolved, 1);
        assert_eq!(artifact.stats.rewritten, 1);
        assert_eq!(artifact.stats.unchanged, 1);
        assert_eq!(artifact.stats.rejected, 1);

        let skill = &artifact.expressions[0];
        assert_eq!(skill.status, ExpressionStatus::Rewritten);
        assert_eq!(
            skill.text.as_deref(),
            Some("dmg(talent.e[\"技能伤害\"] + talent.e[\"伤害提升\"] * 3, 'e')")
        );

        let plain = &artifact.expressions[1];
        assert_eq!(plain.status, ExpressionStatus::Unchanged);
        assert_eq!(plain.text.as_deref(), Some("attr.atk * 2"));

        let bad = &artifact.expressions[2];
        assert_eq!(bad.status, ExpressionStatus::Rejected);
        assert_eq!(bad.text, None);

        assert_eq!(artifact.stats.tables_rendered, 1);
        let table = &artifact.tables[0].templates[0].table;
        assert_eq!(table.values, vec!["10", "20"]);
    }

    #[test]
    fn test_expression_bound_enforced() {
        let mut input = RecordInput {
            id: "huge".to_string(),
            ..Default::default()
        };
        input.expressions = (0..MAX_EXPRESSIONS + 1)
            .map(|i| NamedExpression {
                name: format!("e{}", i),
                text: "1".to_string(),
            })
            .collect();

        let error = condition_record(&input, &RuntimeConfig::default()).unwrap_err();
        assert_matches!(error, PipelineError::TooManyExpressions { .. });
        assert_eq!(error.error_code().as_str(), "E060");
    }

    #[test]
    fn test_record_with_nothing_to_do() {
        let input = RecordInput {
            id: "empty".to_string(),
            ..Default::default()
        };
        let artifact = condition_record(&input, &RuntimeConfig::default()).unwrap();
        assert_eq!(artifact.stats.expressions_total(), 0);
        assert!(artifact.tables.is_empty());
    }
}
