/// Join engine - nested-loop joins chained through one intermediate result
///
/// Join conditions are applied in order. Each side of a condition resolves to
/// the intermediate result when that already holds the side's table, else to
/// the table's scanned relation. Tables no condition mentions are
/// cross-joined at the end, in alias order.
use std::collections::BTreeMap;

use super::conditions::ConditionEvaluator;
use super::Relation;
use crate::core::{QueryError, Result, Row, Schema, Value};
use crate::parser::{ColumnRef, Condition, Operand, Operator};

pub struct JoinExecutor;

impl JoinExecutor {
    pub fn execute(
        mut relations: BTreeMap<String, Relation>,
        conditions: &[&Condition],
    ) -> Result<Relation> {
        let mut current: Option<Relation> = None;

        for condition in conditions {
            let Operand::Column(right) = &condition.right else {
                return Err(QueryError::UnsupportedPredicate(format!(
                    "'{condition}' is not a join condition"
                )));
            };
            let left = &condition.left;
            let in_current = |column: &ColumnRef| {
                current
                    .as_ref()
                    .is_some_and(|r| column.qualifier.as_deref().is_some_and(|q| r.schema.has_qualifier(q)))
            };

            current = Some(match (in_current(left), in_current(right)) {
                (true, true) => {
                    let relation = current.take().unwrap_or_default();
                    Self::filter(relation, condition, right)?
                }
                (true, false) => {
                    let relation = current.take().unwrap_or_default();
                    let other = Self::take_base(&mut relations, right)?;
                    Self::nested_loop(&relation, &other, condition, right)?
                }
                (false, true) => {
                    let relation = current.take().unwrap_or_default();
                    let other = Self::take_base(&mut relations, left)?;
                    Self::nested_loop(&other, &relation, condition, right)?
                }
                (false, false) => {
                    let outer = Self::take_base(&mut relations, left)?;
                    let inner = Self::take_base(&mut relations, right)?;
                    let joined = Self::nested_loop(&outer, &inner, condition, right)?;
                    match current.take() {
                        Some(previous) => Self::cross(&previous, &joined)?,
                        None => joined,
                    }
                }
            });
            if let Some(relation) = &current {
                log::debug!("join on '{condition}': {} rows", relation.rows.len());
            }
        }

        for (alias, relation) in relations {
            current = Some(match current.take() {
                Some(previous) => {
                    let crossed = Self::cross(&previous, &relation)?;
                    log::debug!("cross join with '{alias}': {} rows", crossed.rows.len());
                    crossed
                }
                None => relation,
            });
        }
        Ok(current.unwrap_or_default())
    }

    fn take_base(relations: &mut BTreeMap<String, Relation>, column: &ColumnRef) -> Result<Relation> {
        column
            .qualifier
            .as_deref()
            .and_then(|q| relations.remove(q))
            .ok_or_else(|| QueryError::UnknownColumn(column.to_string()))
    }

    /// Both sides already live in `relation`: keep the rows that satisfy the
    /// condition.
    fn filter(relation: Relation, condition: &Condition, right: &ColumnRef) -> Result<Relation> {
        let left = &condition.left;
        let (l, _) = relation.schema.lookup(left.qualifier.as_deref(), &left.name)?;
        let (r, _) = relation.schema.lookup(right.qualifier.as_deref(), &right.name)?;
        let mut rows = Vec::new();
        for row in relation.rows {
            if Self::matches(condition, row.get(l)?, row.get(r)?) {
                rows.push(row);
            }
        }
        Ok(Relation {
            schema: relation.schema,
            rows,
        })
    }

    /// Join `outer` and `inner`; one of them holds the condition's left
    /// column, the other its right column. Every pair is tested.
    fn nested_loop(
        outer: &Relation,
        inner: &Relation,
        condition: &Condition,
        right: &ColumnRef,
    ) -> Result<Relation> {
        let left = &condition.left;
        let left_in_outer = left
            .qualifier
            .as_deref()
            .is_some_and(|q| outer.schema.has_qualifier(q));
        let (outer_column, inner_column) = if left_in_outer { (left, right) } else { (right, left) };
        let (o, _) = outer.schema.lookup(outer_column.qualifier.as_deref(), &outer_column.name)?;
        let (i, _) = inner.schema.lookup(inner_column.qualifier.as_deref(), &inner_column.name)?;

        // an equality join keeps one copy of the shared value
        let dropped = (condition.operator == Operator::Eq && !condition.negated).then_some((i, o));
        let layout = Layout::new(&outer.schema, &inner.schema, dropped);

        let mut rows = Vec::new();
        for outer_row in &outer.rows {
            let outer_value = outer_row.get(o)?;
            for inner_row in &inner.rows {
                let inner_value = inner_row.get(i)?;
                let (l, r) = if left_in_outer {
                    (outer_value, inner_value)
                } else {
                    (inner_value, outer_value)
                };
                if Self::matches(condition, l, r) {
                    rows.push(layout.combine(outer_row, inner_row)?);
                }
            }
        }
        Ok(Relation {
            schema: layout.schema,
            rows,
        })
    }

    fn cross(outer: &Relation, inner: &Relation) -> Result<Relation> {
        let layout = Layout::new(&outer.schema, &inner.schema, None);
        let mut rows = Vec::with_capacity(outer.rows.len() * inner.rows.len());
        for outer_row in &outer.rows {
            for inner_row in &inner.rows {
                rows.push(layout.combine(outer_row, inner_row)?);
            }
        }
        Ok(Relation {
            schema: layout.schema,
            rows,
        })
    }

    fn matches(condition: &Condition, left: &Value, right: &Value) -> bool {
        ConditionEvaluator::compare_values(left, condition.operator, right) != condition.negated
    }
}

/// Output schema of a two-way join and the input ordinals feeding it.
struct Layout {
    schema: Schema,
    outer: Vec<usize>,
    inner: Vec<usize>,
}

impl Layout {
    /// Union of both schemas without table-tag columns. `dropped` names an
    /// inner ordinal left out of the output and the outer ordinal it aliases.
    fn new(outer: &Schema, inner: &Schema, dropped: Option<(usize, usize)>) -> Self {
        let mut builder = Schema::builder();
        let mut outer_map = vec![None; outer.len()];
        let mut inner_map = vec![None; inner.len()];
        let mut outer_keep = Vec::new();
        let mut inner_keep = Vec::new();

        for (ordinal, column) in outer.columns().iter().enumerate() {
            if column.is_table_tag() {
                continue;
            }
            outer_map[ordinal] = Some(builder.push(column.clone()));
            outer_keep.push(ordinal);
        }
        for (ordinal, column) in inner.columns().iter().enumerate() {
            if column.is_table_tag() {
                continue;
            }
            match dropped {
                Some((inner_ordinal, outer_ordinal)) if inner_ordinal == ordinal => {
                    if let Some(target) = outer_map[outer_ordinal] {
                        builder.alias(column.qualifier.clone(), column.name.clone(), target);
                        inner_map[ordinal] = Some(target);
                    }
                }
                _ => {
                    inner_map[ordinal] = Some(builder.push(column.clone()));
                    inner_keep.push(ordinal);
                }
            }
        }
        builder.inherit_aliases(outer, &outer_map);
        builder.inherit_aliases(inner, &inner_map);

        Self {
            schema: builder.build(),
            outer: outer_keep,
            inner: inner_keep,
        }
    }

    fn combine(&self, outer: &Row, inner: &Row) -> Result<Row> {
        let mut values = Vec::with_capacity(self.outer.len() + self.inner.len());
        for &ordinal in &self.outer {
            values.push(outer.get(ordinal)?.clone());
        }
        for &ordinal in &self.inner {
            values.push(inner.get(ordinal)?.clone());
        }
        Ok(Row::new(values))
    }
}
