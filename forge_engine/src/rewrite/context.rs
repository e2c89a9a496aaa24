//! Rule evaluation context

use crate::config::runtime::RewritePreferences;
use crate::consts::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Allowed-table sets: talent key → the table names that talent actually
/// publishes. A rewrite may only reference tables recorded here; anything
/// else is a mistranslation signal and the rule must refuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSets {
    #[serde(flatten)]
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl TableSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, key: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets
            .entry(key.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    /// True when `name` is a published table of talent `key`
    pub fn allows(&self, key: &str, name: &str) -> bool {
        self.sets.get(key).is_some_and(|names| names.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Everything a rule may consult besides the input text
#[derive(Debug, Clone)]
pub struct RewriteContext<'a> {
    pub tables: &'a TableSets,
    pub symbols: Option<&'a SymbolTable>,
    pub preferences: &'a RewritePreferences,
}

impl<'a> RewriteContext<'a> {
    pub fn new(tables: &'a TableSets, preferences: &'a RewritePreferences) -> Self {
        Self {
            tables,
            symbols: None,
            preferences,
        }
    }

    pub fn with_symbols(mut self, symbols: &'a SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_membership() {
        let mut tables = TableSets::new();
        tables.insert("e", ["技能伤害", "伤害提升"]);

        assert!(tables.allows("e", "技能伤害"));
        assert!(!tables.allows("e", "未知表"));
        assert!(!tables.allows("q", "技能伤害"));
    }

    #[test]
    fn test_table_sets_deserialize() {
        let tables: TableSets =
            serde_json::from_str(r#"{"e": ["技能伤害"], "q": ["爆发伤害"]}"#).unwrap();
        assert!(tables.allows("e", "技能伤害"));
        assert!(tables.allows("q", "爆发伤害"));
    }
}
