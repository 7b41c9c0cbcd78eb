/// Ordered column → ordinal mappings for tables and intermediate results.
///
/// Schemas are immutable once built. Join and aggregation stages describe
/// their output with a `SchemaBuilder` and only then materialize rows, so
/// every ordinal is fixed before the first row of a stage exists.
use super::column::Column;
use super::data_type::DataType;
use super::error::{QueryError, Result};

/// A second name for an existing ordinal. Used when a join drops the right
/// side's copy of an equality column: lookups of the dropped name land on
/// the surviving left column, which holds the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnAlias {
    qualifier: Option<String>,
    name: String,
    ordinal: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
    aliases: Vec<ColumnAlias>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn column(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    /// Find the ordinal of a column. An exact qualifier match wins over a
    /// loose one (a `None` on either side matches any qualifier).
    #[must_use]
    pub fn resolve(&self, qualifier: Option<&str>, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.matches_exactly(qualifier, name))
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|a| a.name.eq_ignore_ascii_case(name) && a.qualifier.as_deref() == qualifier)
                    .map(|a| a.ordinal)
            })
            .or_else(|| self.columns.iter().position(|c| c.matches(qualifier, name)))
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|a| {
                        a.name.eq_ignore_ascii_case(name)
                            && match (qualifier, a.qualifier.as_deref()) {
                                (Some(wanted), Some(own)) => wanted == own,
                                _ => true,
                            }
                    })
                    .map(|a| a.ordinal)
            })
    }

    /// Like `resolve`, but unknown columns are an error.
    pub fn lookup(&self, qualifier: Option<&str>, name: &str) -> Result<(usize, DataType)> {
        self.resolve(qualifier, name)
            .map(|ordinal| (ordinal, self.columns[ordinal].data_type))
            .ok_or_else(|| {
                QueryError::UnknownColumn(match qualifier {
                    Some(q) => format!("{q}_{name}"),
                    None => name.to_string(),
                })
            })
    }

    /// True if any column (or alias) of this schema came from `qualifier`.
    #[must_use]
    pub fn has_qualifier(&self, qualifier: &str) -> bool {
        self.columns.iter().any(|c| c.qualifier.as_deref() == Some(qualifier))
            || self.aliases.iter().any(|a| a.qualifier.as_deref() == Some(qualifier))
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
    aliases: Vec<ColumnAlias>,
}

impl SchemaBuilder {
    /// Append a column and return its ordinal. Pushing a column that is
    /// already present (same qualifier and name) returns the existing ordinal.
    pub fn push(&mut self, column: Column) -> usize {
        if let Some(existing) = self
            .columns
            .iter()
            .position(|c| c.matches_exactly(column.qualifier.as_deref(), &column.name))
        {
            return existing;
        }
        self.columns.push(column);
        self.columns.len() - 1
    }

    #[must_use]
    pub fn with(mut self, column: Column) -> Self {
        self.push(column);
        self
    }

    pub fn alias(&mut self, qualifier: Option<String>, name: impl Into<String>, ordinal: usize) {
        self.aliases.push(ColumnAlias {
            qualifier,
            name: name.into(),
            ordinal,
        });
    }

    /// Carry over the aliases of an input schema, remapping their ordinals.
    pub(crate) fn inherit_aliases(&mut self, input: &Schema, remap: &[Option<usize>]) {
        for alias in &input.aliases {
            if let Some(Some(ordinal)) = remap.get(alias.ordinal) {
                self.alias(alias.qualifier.clone(), alias.name.clone(), *ordinal);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            columns: self.columns,
            aliases: self.aliases,
        }
    }
}
