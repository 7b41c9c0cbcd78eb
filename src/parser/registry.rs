use std::collections::BTreeMap;

use super::statement::{ColumnRef, TableRef};
use crate::core::ParseError;

/// Tables and columns a query touches, keyed by table alias.
///
/// Filled while parsing. The splitter derives each table's scan from it: a
/// sub-query reads exactly the columns registered for its alias, in
/// registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, String>,
    columns: BTreeMap<String, Vec<String>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table(&mut self, table: &TableRef) -> Result<(), ParseError> {
        if let Some(first) = self.tables.get(&table.alias) {
            return Err(ParseError::DuplicateAlias {
                alias: table.alias.clone(),
                first: first.clone(),
                second: table.name.clone(),
            });
        }
        self.tables.insert(table.alias.clone(), table.name.clone());
        self.columns.entry(table.alias.clone()).or_default();
        Ok(())
    }

    /// Record a qualified column. Names are deduplicated case-insensitively.
    pub fn register_column(&mut self, column: &ColumnRef) -> Result<(), ParseError> {
        let Some(qualifier) = column.qualifier.as_deref() else {
            return Err(ParseError::AmbiguousColumn(column.name.clone()));
        };
        let Some(columns) = self.columns.get_mut(qualifier) else {
            return Err(ParseError::UnknownQualifier(qualifier.to_string()));
        };
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)) {
            columns.push(column.name.clone());
        }
        Ok(())
    }

    #[must_use]
    pub fn table_name(&self, alias: &str) -> Option<&str> {
        self.tables.get(alias).map(String::as_str)
    }

    /// Columns registered for `alias`, in registration order.
    #[must_use]
    pub fn columns(&self, alias: &str) -> &[String] {
        self.columns.get(alias).map_or(&[], Vec::as_slice)
    }

    /// Registered aliases in sorted order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Registry restricted to one alias.
    #[must_use]
    pub fn only(&self, alias: &str) -> Self {
        let mut single = Self::new();
        if let Some(name) = self.tables.get(alias) {
            single.tables.insert(alias.to_string(), name.clone());
            single
                .columns
                .insert(alias.to_string(), self.columns(alias).to_vec());
        }
        single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_alias() {
        let mut registry = SchemaRegistry::new();
        registry.register_table(&TableRef::new("lineitem")).unwrap();
        let err = registry.register_table(&TableRef::new("legacy")).unwrap_err();
        assert_eq!(
            err,
            ParseError::DuplicateAlias {
                alias: "l".to_string(),
                first: "lineitem".to_string(),
                second: "legacy".to_string(),
            }
        );
    }

    #[test]
    fn test_columns_keep_first_registration_order() {
        let mut registry = SchemaRegistry::new();
        registry.register_table(&TableRef::new("lineitem")).unwrap();
        for name in ["TAX", "QUANTITY", "tax", "ORDERKEY"] {
            registry.register_column(&ColumnRef::qualified("l", name)).unwrap();
        }
        assert_eq!(registry.columns("l"), ["TAX", "QUANTITY", "ORDERKEY"]);
        assert!(registry.columns("o").is_empty());
    }

    #[test]
    fn test_unknown_qualifier() {
        let mut registry = SchemaRegistry::new();
        registry.register_table(&TableRef::new("orders")).unwrap();
        assert_eq!(
            registry.register_column(&ColumnRef::qualified("x", "TAX")),
            Err(ParseError::UnknownQualifier("x".to_string()))
        );
    }

    #[test]
    fn test_only_keeps_one_alias() {
        let mut registry = SchemaRegistry::new();
        registry.register_table(&TableRef::new("lineitem")).unwrap();
        registry.register_table(&TableRef::new("orders")).unwrap();
        registry.register_column(&ColumnRef::qualified("o", "ORDERKEY")).unwrap();
        let orders = registry.only("o");
        assert_eq!(orders.aliases().collect::<Vec<_>>(), vec!["o"]);
        assert_eq!(orders.table_name("o"), Some("orders"));
        assert_eq!(orders.columns("o"), ["ORDERKEY"]);
    }
}
