use std::collections::HashMap;

use super::error::{QueryError, Result};
use super::table::TableSchema;

/// Table schemas known to the engine. Lives for the whole process and is
/// only read while queries run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tables: HashMap<String, TableSchema>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, table: TableSchema) -> Result<()> {
        let key = table.name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(QueryError::TableAlreadyExists(table.name));
        }
        if let Some(clash) = self.tables.values().find(|t| t.tag == table.tag) {
            return Err(QueryError::TagAlreadyUsed {
                tag: table.tag,
                table: clash.name.clone(),
            });
        }
        self.tables.insert(key, table);
        Ok(())
    }

    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    pub fn table(&self, name: &str) -> Result<&TableSchema> {
        self.get_table(name)
            .ok_or_else(|| QueryError::UnknownTable(name.to_string()))
    }

    /// Table names in tag order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        let mut tables: Vec<&TableSchema> = self.tables.values().collect();
        tables.sort_by_key(|t| t.tag);
        tables.into_iter().map(|t| t.name.as_str()).collect()
    }
}
