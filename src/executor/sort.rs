/// ORDER BY over the final relation.
///
/// Keys are compared in order and the first one that differs decides. The
/// sort is a repeated-pass adjacent swap, so rows with equal keys keep the
/// order they arrived in.
use std::cmp::Ordering;

use super::projector::Projector;
use super::Relation;
use crate::core::{QueryError, Result, Row, Schema};
use crate::parser::{OrderKey, SelectField, SortTarget};

pub struct SortExecutor;

impl SortExecutor {
    pub fn execute(relation: &mut Relation, order_by: &[OrderKey], fields: &[SelectField]) -> Result<()> {
        if order_by.is_empty() {
            return Ok(());
        }
        let keys = order_by
            .iter()
            .map(|key| Ok((Self::resolve(&relation.schema, key, fields)?, key.descending)))
            .collect::<Result<Vec<_>>>()?;

        let rows = &mut relation.rows;
        let mut passes = 0usize;
        loop {
            passes += 1;
            let mut swapped = false;
            for i in 1..rows.len() {
                if Self::out_of_order(&rows[i - 1], &rows[i], &keys)? {
                    rows.swap(i - 1, i);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
        log::debug!("sorted {} rows on {} key(s) in {passes} pass(es)", rows.len(), keys.len());
        Ok(())
    }

    fn out_of_order(first: &Row, second: &Row, keys: &[(usize, bool)]) -> Result<bool> {
        for &(ordinal, descending) in keys {
            match first.get(ordinal)?.compare(second.get(ordinal)?) {
                Ordering::Equal => continue,
                Ordering::Greater => return Ok(!descending),
                Ordering::Less => return Ok(descending),
            }
        }
        Ok(false)
    }

    /// Ordinal of a sort key. A bare name may refer to a SELECT alias.
    fn resolve(schema: &Schema, key: &OrderKey, fields: &[SelectField]) -> Result<usize> {
        match &key.target {
            SortTarget::Column(column) => {
                if column.qualifier.is_none() {
                    let aliased = fields.iter().find(|f| {
                        f.alias
                            .as_deref()
                            .is_some_and(|alias| alias.eq_ignore_ascii_case(&column.name))
                    });
                    if let Some(field) = aliased {
                        return Projector::resolve_field(schema, field);
                    }
                }
                let (ordinal, _) = schema.lookup(column.qualifier.as_deref(), &column.name)?;
                Ok(ordinal)
            }
            SortTarget::Aggregate(function, column) => fields
                .iter()
                .find(|f| f.aggregate == Some(*function) && f.column == *column)
                .map(|field| Projector::resolve_field(schema, field))
                .unwrap_or_else(|| Err(QueryError::UnknownColumn(function.column_name(column)))),
        }
    }
}
