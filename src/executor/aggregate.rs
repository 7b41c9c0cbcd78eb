/// GROUP BY and SUM/AVG aggregation.
///
/// Rows are bucketed by the tuple of their grouping column values, compared
/// by value. Groups come out in the order their first row was seen. Every
/// input column survives with the value of the group's first row; each
/// aggregate adds one synthetic INT column after them.
use std::collections::HashMap;

use super::Relation;
use crate::core::{Column, DataType, QueryError, Result, Row, Schema, Value};
use crate::parser::{AggregateFunction, Query};

/// One synthetic column: which function, over which input ordinal.
struct Accumulator {
    function: AggregateFunction,
    input: usize,
    label: String,
}

struct Group {
    first: Row,
    sums: Vec<i64>,
    count: i64,
}

pub struct AggregateExecutor;

impl AggregateExecutor {
    /// True if the query needs an aggregation stage at all.
    #[must_use]
    pub fn applies(query: &Query) -> bool {
        !query.group_by.is_empty() || query.has_aggregates()
    }

    pub fn execute(relation: Relation, query: &Query) -> Result<Relation> {
        let keys = query
            .group_by
            .iter()
            .map(|column| {
                relation
                    .schema
                    .lookup(column.qualifier.as_deref(), &column.name)
                    .map(|(ordinal, _)| ordinal)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut builder = Schema::builder();
        let mut remap = Vec::with_capacity(relation.schema.len());
        for column in relation.schema.columns() {
            remap.push(Some(builder.push(column.clone())));
        }
        builder.inherit_aliases(&relation.schema, &remap);

        let mut accumulators = Vec::new();
        for field in &query.fields {
            let Some(function) = field.aggregate else {
                continue;
            };
            let column = &field.column;
            let (input, data_type) = relation
                .schema
                .lookup(column.qualifier.as_deref(), &column.name)?;
            if data_type != DataType::Int {
                return Err(QueryError::type_mismatch(
                    column.to_string(),
                    format!("{} needs an INT column", function.as_str()),
                ));
            }
            let synthetic = match &field.alias {
                Some(alias) => Column::new(alias.clone(), DataType::Int),
                None => Column {
                    qualifier: column.qualifier.clone(),
                    name: function.column_name(column),
                    data_type: DataType::Int,
                },
            };
            let width = builder.len();
            if builder.push(synthetic) == width {
                accumulators.push(Accumulator {
                    function,
                    input,
                    label: field.to_string(),
                });
            }
        }

        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for row in relation.rows {
            let key = keys
                .iter()
                .map(|&ordinal| row.get(ordinal).cloned())
                .collect::<Result<Vec<_>>>()?;

            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    groups.push(Group {
                        first: row.clone(),
                        sums: vec![0; accumulators.len()],
                        count: 0,
                    });
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            let group = &mut groups[slot];
            for (sum, accumulator) in group.sums.iter_mut().zip(&accumulators) {
                let value = row.get_int(accumulator.input)?;
                *sum = sum
                    .checked_add(value)
                    .ok_or_else(|| QueryError::ArithmeticOverflow(accumulator.label.clone()))?;
            }
            group.count += 1;
        }

        log::debug!(
            "aggregated into {} group(s) on {} key column(s)",
            groups.len(),
            keys.len()
        );

        let rows = groups
            .into_iter()
            .map(|group| {
                let mut values = group.first.values;
                for (sum, accumulator) in group.sums.into_iter().zip(&accumulators) {
                    let value = match accumulator.function {
                        AggregateFunction::Sum => sum,
                        // integer division truncates toward zero
                        AggregateFunction::Avg => sum / group.count,
                    };
                    values.push(value.into());
                }
                Row::new(values)
            })
            .collect();

        Ok(Relation::new(builder.build(), rows))
    }
}
