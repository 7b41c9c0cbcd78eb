/// Scan executor - per-table range scan with predicate pushdown
///
/// Reads the key range a table owns from the storage collaborator, filters
/// each row through the sub-query's WHERE clause and keeps the columns the
/// query references. Truncated scans are resumed just after the last key
/// seen until the store reports the end of the range.
use super::conditions::ConditionEvaluator;
use super::Relation;
use crate::core::{Column, Result, Row, Schema, StorageError, TableSchema};
use crate::parser::Query;
use crate::storage::{ScanItem, Storage};

pub struct ScanExecutor;

impl ScanExecutor {
    /// Run the single-table `query` for `alias` over `table`.
    pub fn execute<S: Storage + ?Sized>(
        storage: &S,
        table: &TableSchema,
        alias: &str,
        query: &Query,
    ) -> Result<Relation> {
        let source = Self::qualified_schema(table, alias);

        let mut builder = Schema::builder();
        let mut ordinals = Vec::with_capacity(query.fields.len());
        for field in &query.fields {
            let (ordinal, _) = source.lookup(Some(alias), &field.column.name)?;
            let column = &source.columns()[ordinal];
            builder.push(column.clone());
            ordinals.push(ordinal);
        }
        let schema = builder.build();

        let predicate = query.filter.as_ref().map(|filter| filter.to_predicate());
        let mut rows = Vec::new();
        let mut range = table.keys()?;
        let mut passes = 0usize;

        loop {
            passes += 1;
            let mut delivered = 0usize;
            let mut last_key = None;
            let mut ended = false;

            for item in storage.scan(range) {
                match item? {
                    ScanItem::Row { key, row } => {
                        delivered += 1;
                        last_key = Some(key);
                        if !Self::belongs_to(&row, table) {
                            continue;
                        }
                        if let Some(predicate) = &predicate {
                            if !ConditionEvaluator::evaluate_predicate(&source, &row, predicate)? {
                                continue;
                            }
                        }
                        rows.push(Self::project(&row, &ordinals)?);
                    }
                    ScanItem::End => {
                        ended = true;
                        break;
                    }
                }
            }

            if ended {
                break;
            }
            let Some(last_key) = last_key else {
                return Err(StorageError::ScanStalled(range.start).into());
            };
            range = range.after(last_key);
            if range.is_empty() {
                break;
            }
            log::debug!(
                "scan of '{}' truncated after {delivered} rows, resuming at {:#x}",
                table.name,
                range.start
            );
        }

        log::debug!(
            "scanned '{}' as '{alias}': {} rows kept in {passes} pass(es)",
            table.name,
            rows.len()
        );
        Ok(Relation { schema, rows })
    }

    /// The table's columns, qualified with the alias the query gave it.
    fn qualified_schema(table: &TableSchema, alias: &str) -> Schema {
        let mut builder = Schema::builder();
        for column in table.schema().columns() {
            builder.push(Column::qualified(alias, column.name.clone(), column.data_type));
        }
        builder.build()
    }

    /// Rows carry their table name in the tag column.
    fn belongs_to(row: &Row, table: &TableSchema) -> bool {
        row.get_string(0)
            .is_ok_and(|tag| tag.eq_ignore_ascii_case(&table.name))
    }

    fn project(row: &Row, ordinals: &[usize]) -> Result<Row> {
        let values = ordinals
            .iter()
            .map(|&ordinal| row.get(ordinal).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::new(values))
    }
}
