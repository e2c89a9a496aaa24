//! Promote-row template rendering
//!
//! Upstream describes each upgrade level of a skill with a shared
//! placeholder template (comma-separated `label|template` pairs whose
//! templates carry `{paramK:SPEC}` placeholders) plus a per-level
//! parameter row. The renderer classifies every placeholder as constant
//! or variable across levels, factors recognized affixes out of the
//! template, and produces one [`RenderedTable`] per label together with
//! the marker-form text the downstream description renderer substitutes
//! per level.

mod format;

pub use format::{format_value, parse_format_spec, FormatSpec};

use crate::config::compile_time::template::{
    DROP_PREFIXES, DROP_SUFFIXES, MAX_PLACEHOLDERS, MAX_ROWS, UNIT_SUFFIXES, VALUE_EPSILON,
};
use crate::config::runtime::RenderPreferences;
use crate::logging::codes;
use crate::scan::{extract_brace_block, split_top_level_comma};
use crate::{log_debug, log_warning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One upgrade level: its ordinal, numeric parameters and template text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteRow {
    pub level: u32,
    pub params: Vec<f64>,
    pub template_text: String,
}

/// Rendered per-label value table.
///
/// Invariant: `values.len() == 1` exactly when `is_same` is true, and a
/// collapsed table folds its unit into the single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTable {
    pub name: String,
    pub unit: String,
    pub is_same: bool,
    pub values: Vec<String>,
}

/// A rendered label: the value table plus the marker-form core text
/// (constants inlined as literals, variables as `$k[SPEC]` markers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTemplate {
    pub table: RenderedTable,
    pub marker_text: String,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Placeholder {
        index: usize,
        spec: FormatSpec,
        spec_text: String,
    },
}

/// Render every label of a promote-row group.
///
/// Rows are sorted by level before rendering. A group over the row bound
/// or a label that cannot be rendered safely yields nothing for that
/// group/label rather than a partial table.
pub fn render_promote_rows(
    rows: &[PromoteRow],
    preferences: &RenderPreferences,
) -> Vec<RenderedTemplate> {
    if rows.is_empty() {
        return Vec::new();
    }
    if rows.len() > MAX_ROWS {
        log_warning!(code = codes::template::TOO_MANY_ROWS,
            "Promote group exceeds the row bound",
            "rows" => rows.len(),
            "max" => MAX_ROWS
        );
        return Vec::new();
    }

    let mut sorted: Vec<&PromoteRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.level);

    let row_pairs: Vec<Vec<(String, String)>> = sorted
        .iter()
        .map(|row| parse_label_pairs(&row.template_text))
        .collect();

    let mut rendered = Vec::new();
    for (label_index, (label, _)) in row_pairs[0].iter().enumerate() {
        if let Some(template) =
            render_label(label, label_index, &sorted, &row_pairs, preferences)
        {
            rendered.push(template);
        }
    }
    rendered
}

fn render_label(
    label: &str,
    label_index: usize,
    rows: &[&PromoteRow],
    row_pairs: &[Vec<(String, String)>],
    preferences: &RenderPreferences,
) -> Option<RenderedTemplate> {
    // Per-row core template, falling back to the first row's when a row
    // carries fewer pairs
    let mut unit = String::new();
    let mut row_segments: Vec<Vec<Segment>> = Vec::with_capacity(rows.len());
    for pairs in row_pairs {
        let template = pairs
            .get(label_index)
            .or_else(|| row_pairs[0].get(label_index))
            .map(|(_, t)| t.as_str())?;
        let mut segments = parse_segments(template);
        if preferences.split_units {
            let found = split_affixes(&mut segments);
            if !found.is_empty() {
                unit = found;
            }
        }
        row_segments.push(segments);
    }

    // Referenced placeholder indices across all rows for this label
    let mut referenced: BTreeSet<usize> = BTreeSet::new();
    for segments in &row_segments {
        for segment in segments {
            if let Segment::Placeholder { index, .. } = segment {
                referenced.insert(*index);
            }
        }
    }
    if let Some(max_index) = referenced.iter().max() {
        if *max_index > MAX_PLACEHOLDERS {
            log_warning!(code = codes::template::PLACEHOLDER_OUT_OF_RANGE,
                "Placeholder index exceeds the bound",
                "label" => label,
                "index" => max_index
            );
            return None;
        }
    }

    // Per-row value for each referenced index
    let mut row_values: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for index in &referenced {
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            match row.params.get(index - 1) {
                Some(value) => values.push(*value),
                None if preferences.zero_fill_missing_params => {
                    log_debug!("Missing parameter rendered as zero",
                        "code" => codes::template::MISSING_PARAMETER,
                        "label" => label,
                        "index" => index,
                        "level" => row.level
                    );
                    values.push(0.0);
                }
                None => return None,
            }
        }
        row_values.insert(*index, values);
    }

    let is_constant = |index: usize| -> bool {
        let values = &row_values[&index];
        values
            .iter()
            .all(|v| (v - values[0]).abs() <= VALUE_EPSILON)
    };

    // Dense 1-based variable markers, in order of first appearance in the
    // template text
    let mut markers: BTreeMap<usize, usize> = BTreeMap::new();
    for segments in &row_segments {
        for segment in segments {
            if let Segment::Placeholder { index, .. } = segment {
                if !is_constant(*index) && !markers.contains_key(index) {
                    markers.insert(*index, markers.len() + 1);
                }
            }
        }
    }

    // Per-row rendered values
    let mut values = Vec::with_capacity(rows.len());
    for (row_index, segments) in row_segments.iter().enumerate() {
        let mut rendered = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder { index, spec, .. } => {
                    rendered.push_str(&format_value(row_values[index][row_index], spec));
                }
            }
        }
        values.push(rendered);
    }

    // Marker-form core text from the first row's template
    let mut marker_text = String::new();
    for segment in &row_segments[0] {
        match segment {
            Segment::Literal(text) => marker_text.push_str(text),
            Segment::Placeholder {
                index,
                spec,
                spec_text,
            } => {
                if is_constant(*index) {
                    marker_text.push_str(&format_value(row_values[index][0], spec));
                } else {
                    marker_text.push_str(&format!("${}[{}]", markers[index], spec_text));
                }
            }
        }
    }

    let is_same = values.windows(2).all(|pair| pair[0] == pair[1]);
    let table = if is_same {
        RenderedTable {
            name: label.to_string(),
            unit: String::new(),
            is_same: true,
            values: vec![format!("{}{}", values[0], unit)],
        }
    } else {
        RenderedTable {
            name: label.to_string(),
            unit,
            is_same: false,
            values,
        }
    };

    Some(RenderedTemplate { table, marker_text })
}

/// Split `label|template` pairs on top-level commas. Pairs without a pipe
/// carry no label and are skipped.
fn parse_label_pairs(text: &str) -> Vec<(String, String)> {
    split_top_level_comma(text)
        .into_iter()
        .filter_map(|pair| {
            let Some(pipe) = pair.find('|') else {
                if !pair.trim().is_empty() {
                    log_debug!("Template pair without label skipped", "pair" => pair.as_str());
                }
                return None;
            };
            Some((
                pair[..pipe].trim().to_string(),
                pair[pipe + 1..].trim().to_string(),
            ))
        })
        .collect()
}

/// Parse a core template into literal and placeholder segments. Braced
/// text that is not a `paramK` placeholder stays literal.
fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut position = 0;

    while position < template.len() {
        let rest = &template[position..];
        let Some(brace_offset) = rest.find('{') else {
            literal.push_str(rest);
            break;
        };

        literal.push_str(&rest[..brace_offset]);
        let brace_index = position + brace_offset;

        match extract_brace_block(template, brace_index) {
            Some((content, close)) => {
                if let Some((index, spec_text)) = parse_placeholder(&content) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        index,
                        spec: parse_format_spec(&spec_text),
                        spec_text,
                    });
                } else {
                    literal.push_str(&template[brace_index..=close]);
                }
                position = close + 1;
            }
            None => {
                // Unterminated brace: the rest is literal
                literal.push_str(&template[brace_index..]);
                break;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn parse_placeholder(content: &str) -> Option<(usize, String)> {
    let rest = content.trim().strip_prefix("param")?;
    let digits_end = rest
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let index: usize = rest[..digits_end].parse().ok()?;
    if index == 0 {
        return None;
    }

    let spec_text = match &rest[digits_end..] {
        "" => "I".to_string(),
        tail => tail.strip_prefix(':')?.trim().to_string(),
    };

    Some((index, spec_text))
}

/// Strip a recognized prefix, and a recognized suffix from the template's
/// outer literals. A unit suffix is returned; drop affixes vanish;
/// unrecognized text stays folded into the rendered value.
fn split_affixes(segments: &mut Vec<Segment>) -> String {
    if let Some(Segment::Literal(text)) = segments.first_mut() {
        for prefix in DROP_PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                *text = rest.to_string();
                break;
            }
        }
        if text.is_empty() {
            segments.remove(0);
        }
    }

    let mut unit = String::new();
    if let Some(Segment::Literal(text)) = segments.last_mut() {
        let mut matched = false;
        for suffix in UNIT_SUFFIXES {
            if let Some(rest) = text.strip_suffix(suffix) {
                unit = suffix.to_string();
                *text = rest.to_string();
                matched = true;
                break;
            }
        }
        if !matched {
            for suffix in DROP_SUFFIXES {
                if let Some(rest) = text.strip_suffix(suffix) {
                    *text = rest.to_string();
                    break;
                }
            }
        }
        if text.is_empty() {
            segments.pop();
        }
    }

    unit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: u32, params: &[f64], template: &str) -> PromoteRow {
        PromoteRow {
            level,
            params: params.to_vec(),
            template_text: template.to_string(),
        }
    }

    fn render(rows: &[PromoteRow]) -> Vec<RenderedTemplate> {
        render_promote_rows(rows, &RenderPreferences::default())
    }

    #[test]
    fn test_variable_param_renders_per_level() {
        let rows = vec![
            row(1, &[10.0], "伤害|造成{param1:F1}点伤害"),
            row(2, &[20.0], "伤害|造成{param1:F1}点伤害"),
        ];
        let rendered = render(&rows);
        assert_eq!(rendered.len(), 1);

        let table = &rendered[0].table;
        assert_eq!(table.name, "伤害");
        assert!(!table.is_same);
        assert_eq!(table.values, vec!["10", "20"]);
        assert_eq!(table.unit, "");
        assert_eq!(rendered[0].marker_text, "$1[F1]");
    }

    #[test]
    fn test_constant_param_collapses() {
        let rows = vec![
            row(1, &[15.0], "伤害|造成{param1:F1}点伤害"),
            row(2, &[15.0], "伤害|造成{param1:F1}点伤害"),
        ];
        let rendered = render(&rows);
        let table = &rendered[0].table;

        assert!(table.is_same);
        assert_eq!(table.values, vec!["15"]);
        assert_eq!(table.unit, "");
        assert_eq!(rendered[0].marker_text, "15");
    }

    #[test]
    fn test_unit_suffix_extracted() {
        let rows = vec![
            row(1, &[4.0], "持续时间|{param1:F1}秒"),
            row(2, &[6.0], "持续时间|{param1:F1}秒"),
        ];
        let rendered = render(&rows);
        let table = &rendered[0].table;

        assert_eq!(table.unit, "秒");
        assert_eq!(table.values, vec!["4", "6"]);
    }

    #[test]
    fn test_unit_folds_into_collapsed_value() {
        let rows = vec![
            row(1, &[4.0], "持续时间|{param1:F1}秒"),
            row(2, &[4.0], "持续时间|{param1:F1}秒"),
        ];
        let table = &render(&rows)[0].table;

        assert!(table.is_same);
        assert_eq!(table.unit, "");
        assert_eq!(table.values, vec!["4秒"]);
    }

    #[test]
    fn test_percent_spec_with_literal_percent_unit() {
        let rows = vec![
            row(1, &[0.446], "技能伤害|{param1:F1P}%"),
            row(2, &[0.482], "技能伤害|{param1:F1P}%"),
        ];
        let table = &render(&rows)[0].table;

        assert_eq!(table.unit, "%");
        assert_eq!(table.values, vec!["44.6", "48.2"]);
    }

    #[test]
    fn test_multiple_labels() {
        let rows = vec![
            row(1, &[0.5, 3.0], "技能伤害|{param1:F1P}%,持续时间|{param2:F1}秒"),
            row(2, &[0.6, 3.0], "技能伤害|{param1:F1P}%,持续时间|{param2:F1}秒"),
        ];
        let rendered = render(&rows);
        assert_eq!(rendered.len(), 2);

        assert_eq!(rendered[0].table.name, "技能伤害");
        assert!(!rendered[0].table.is_same);
        assert_eq!(rendered[1].table.name, "持续时间");
        assert!(rendered[1].table.is_same);
        assert_eq!(rendered[1].table.values, vec!["3秒"]);
    }

    #[test]
    fn test_marker_indices_dense_in_appearance_order() {
        // param3 appears before param1 in the text; param2 is constant.
        let rows = vec![
            row(1, &[1.0, 5.0, 10.0], "混合|{param3:F1} / {param2:F1} / {param1:F1}"),
            row(2, &[2.0, 5.0, 20.0], "混合|{param3:F1} / {param2:F1} / {param1:F1}"),
        ];
        let rendered = render(&rows);
        assert_eq!(rendered[0].marker_text, "$1[F1] / 5 / $2[F1]");
        assert_eq!(rendered[0].table.values, vec!["10 / 5 / 1", "20 / 5 / 2"]);
    }

    #[test]
    fn test_rows_sorted_by_level() {
        let rows = vec![
            row(2, &[20.0], "伤害|{param1:F1}"),
            row(1, &[10.0], "伤害|{param1:F1}"),
        ];
        let table = &render(&rows)[0].table;
        assert_eq!(table.values, vec!["10", "20"]);
    }

    #[test]
    fn test_unknown_affix_folds_into_value() {
        let rows = vec![
            row(1, &[2.0], "效果|获得{param1:F1}抗性"),
            row(2, &[3.0], "效果|获得{param1:F1}抗性"),
        ];
        let table = &render(&rows)[0].table;
        assert_eq!(table.values, vec!["获得2抗性", "获得3抗性"]);
    }

    #[test]
    fn test_pair_without_label_skipped() {
        let rows = vec![row(1, &[1.0], "no pipes here")];
        assert!(render(&rows).is_empty());
    }

    #[test]
    fn test_empty_rows() {
        assert!(render(&[]).is_empty());
    }

    #[test]
    fn test_single_row_collapses() {
        let rows = vec![row(1, &[7.5], "伤害|{param1:F1}")];
        let table = &render(&rows)[0].table;
        assert!(table.is_same);
        assert_eq!(table.values, vec!["7.5"]);
    }

    #[test]
    fn test_literal_braces_kept() {
        let rows = vec![row(1, &[1.0], "说明|效果{x}如下{param1:F1}")];
        let table = &render(&rows)[0].table;
        assert_eq!(table.values, vec!["效果{x}如下1"]);
    }
}
