/// Projection of the final relation onto the SELECT list.
use std::fmt;

use super::Relation;
use crate::core::{Result, Schema, Value};
use crate::parser::SelectField;

/// Rows of a finished query, one value per SELECT field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of an output column, case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// All values of one output column.
    #[must_use]
    pub fn column(&self, name: &str) -> Vec<&Value> {
        match self.column_index(name) {
            Some(index) => self.rows.iter().map(|row| &row[index]).collect(),
            None => Vec::new(),
        }
    }
}

/// One line per row: `NAME: value, NAME: value, `.
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for (name, value) in self.columns.iter().zip(row) {
                write!(f, "{name}: {value}, ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct Projector;

impl Projector {
    pub fn project(relation: &Relation, fields: &[SelectField]) -> Result<ResultSet> {
        let ordinals = fields
            .iter()
            .map(|field| Self::resolve_field(&relation.schema, field))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(relation.rows.len());
        for row in &relation.rows {
            let values = ordinals
                .iter()
                .map(|&ordinal| row.get(ordinal).cloned())
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }

        Ok(ResultSet {
            columns: fields.iter().map(SelectField::output_name).collect(),
            rows,
        })
    }

    /// Ordinal holding a SELECT field's value. Aggregates live in their
    /// synthetic column, named by the alias when one was given.
    pub(crate) fn resolve_field(schema: &Schema, field: &SelectField) -> Result<usize> {
        let column = &field.column;
        let (ordinal, _) = match (field.aggregate, &field.alias) {
            (Some(_), Some(alias)) => schema.lookup(None, alias)?,
            (Some(function), None) => {
                schema.lookup(column.qualifier.as_deref(), &function.column_name(column))?
            }
            (None, _) => schema.lookup(column.qualifier.as_deref(), &column.name)?,
        };
        Ok(ordinal)
    }
}
