/// Validation of a parsed query against the catalog.
///
/// Runs before any scan so that unknown names and type/operator mismatches
/// surface as errors instead of silently filtering every row.
use std::collections::HashMap;

use crate::core::{Catalog, DataType, QueryError, Result, TableSchema};
use crate::parser::{ColumnRef, Condition, Literal, Operand, Query, Scalar, SelectField, SortTarget};

pub fn bind(query: &Query, catalog: &Catalog) -> Result<()> {
    for table in &query.tables {
        catalog.table(&table.name)?;
    }

    for alias in query.registry.aliases() {
        let table = table_for(query, catalog, alias)?;
        for column in query.registry.columns(alias) {
            column_type(table, alias, column)?;
        }
    }

    bind_aggregate_outputs(&query.fields)?;
    for field in &query.fields {
        if let Some(function) = field.aggregate {
            let data_type = resolve(query, catalog, field.column.qualifier.as_deref(), &field.column.name)?;
            if data_type != DataType::Int {
                return Err(QueryError::type_mismatch(
                    field.column.to_string(),
                    format!("{} needs an INT column, found {data_type}", function.as_str()),
                ));
            }
        }
    }

    if let Some(filter) = &query.filter {
        for condition in filter.conditions() {
            bind_condition(query, catalog, condition)?;
        }
    }

    for key in &query.order_by {
        if let SortTarget::Aggregate(function, column) = &key.target {
            let selected = query
                .fields
                .iter()
                .any(|f| f.aggregate == Some(*function) && f.column == *column);
            if !selected {
                return Err(QueryError::UnknownColumn(function.column_name(column)));
            }
        }
    }
    Ok(())
}

/// Each aggregate output column must come from one `(function, column)`
/// pair. Repeating the same aggregate is fine.
fn bind_aggregate_outputs(fields: &[SelectField]) -> Result<()> {
    let mut outputs: HashMap<(Option<String>, String), &SelectField> = HashMap::new();
    for field in fields {
        let Some(function) = field.aggregate else {
            continue;
        };
        let key = match &field.alias {
            Some(alias) => (None, alias.to_ascii_uppercase()),
            None => (
                field.column.qualifier.clone(),
                function.column_name(&field.column).to_ascii_uppercase(),
            ),
        };
        match outputs.get(&key) {
            Some(first)
                if first.aggregate != field.aggregate || !same_column(&first.column, &field.column) =>
            {
                return Err(QueryError::DuplicateOutputColumn(field.output_name()));
            }
            Some(_) => {}
            None => {
                outputs.insert(key, field);
            }
        }
    }
    Ok(())
}

fn same_column(a: &ColumnRef, b: &ColumnRef) -> bool {
    a.qualifier == b.qualifier && a.name.eq_ignore_ascii_case(&b.name)
}

fn bind_condition(query: &Query, catalog: &Catalog, condition: &Condition) -> Result<()> {
    let left = &condition.left;
    let column = left.to_string();
    let data_type = resolve(query, catalog, left.qualifier.as_deref(), &left.name)?;

    match &condition.right {
        Operand::Column(right) => {
            if !condition.is_join() {
                return Err(QueryError::UnsupportedPredicate(format!(
                    "'{condition}' compares two columns of the same table"
                )));
            }
            let right_type = resolve(query, catalog, right.qualifier.as_deref(), &right.name)?;
            if right_type != data_type {
                return Err(QueryError::type_mismatch(
                    column,
                    format!("cannot join {data_type} with {right_type} column {right}"),
                ));
            }
        }
        Operand::Scalar(scalar) => bind_scalar(&column, data_type, scalar)?,
        Operand::Pattern(_) => {
            if data_type != DataType::String {
                return Err(QueryError::type_mismatch(column, "LIKE needs a STRING column"));
            }
        }
        Operand::List(values) => {
            for value in values {
                bind_literal(&column, data_type, value)?;
            }
        }
        Operand::Range(low, high) => {
            if data_type != DataType::Int {
                return Err(QueryError::type_mismatch(column, "BETWEEN needs an INT column"));
            }
            bind_scalar(&column, data_type, low)?;
            bind_scalar(&column, data_type, high)?;
        }
    }
    Ok(())
}

fn bind_scalar(column: &str, data_type: DataType, scalar: &Scalar) -> Result<()> {
    match scalar {
        Scalar::Constant(literal) => bind_literal(column, data_type, literal),
        Scalar::Arithmetic(arithmetic) => {
            for operand in [&arithmetic.left, &arithmetic.right] {
                bind_literal(column, DataType::Int, operand)?;
            }
            Ok(())
        }
    }
}

fn bind_literal(column: &str, data_type: DataType, literal: &Literal) -> Result<()> {
    if data_type == DataType::Int && literal.as_int().is_none() {
        return Err(QueryError::type_mismatch(
            column,
            format!("{literal} is not an integer"),
        ));
    }
    Ok(())
}

fn table_for<'a>(query: &Query, catalog: &'a Catalog, alias: &str) -> Result<&'a TableSchema> {
    let name = query
        .registry
        .table_name(alias)
        .ok_or_else(|| QueryError::UnknownTable(alias.to_string()))?;
    catalog.table(name)
}

fn column_type(table: &TableSchema, alias: &str, column: &str) -> Result<DataType> {
    table
        .column(column)
        .map(|(_, data_type)| data_type)
        .map_err(|_| QueryError::UnknownColumn(format!("{alias}_{column}")))
}

fn resolve(
    query: &Query,
    catalog: &Catalog,
    qualifier: Option<&str>,
    name: &str,
) -> Result<DataType> {
    let alias = qualifier.ok_or_else(|| QueryError::UnknownColumn(name.to_string()))?;
    column_type(table_for(query, catalog, alias)?, alias, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;
    use crate::storage::loader::sample_catalog;

    fn check(sql: &str) -> Result<()> {
        bind(&parse_query(sql).unwrap(), &sample_catalog().unwrap())
    }

    #[test]
    fn test_valid_queries() {
        assert!(check("SELECT l_TAX FROM lineitem WHERE l_SHIPDATE LIKE '1998%'").is_ok());
        assert!(check("SELECT l_TAX FROM lineitem WHERE l_TAX BETWEEN 1 AND 10 * 50").is_ok());
        assert!(check("SELECT l_TAX FROM lineitem WHERE l_TAX = '500'").is_ok());
        assert!(check(
            "SELECT l_ORDERKEY , o_ORDERDATE FROM lineitem , orders WHERE o_ORDERKEY = l_ORDERKEY"
        )
        .is_ok());
    }

    #[test]
    fn test_unknown_table() {
        assert!(matches!(
            check("SELECT p_NAME FROM part"),
            Err(QueryError::UnknownTable(name)) if name == "part"
        ));
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            check("SELECT l_PRICE FROM lineitem"),
            Err(QueryError::UnknownColumn(name)) if name == "l_PRICE"
        ));
    }

    #[test]
    fn test_like_on_int_column() {
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem WHERE l_TAX LIKE '1%'"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_between_on_string_column() {
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem WHERE l_SHIPDATE BETWEEN 1 AND 2"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_text_against_int_column() {
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem WHERE l_TAX = 'high'"),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem WHERE l_TAX IN (1, 'x')"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregate_over_string_column() {
        assert!(matches!(
            check("SELECT SUM(l_RETURNFLAG) FROM lineitem"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_same_table_column_comparison() {
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem WHERE l_TAX = l_DISCOUNT"),
            Err(QueryError::UnsupportedPredicate(_))
        ));
    }

    #[test]
    fn test_join_type_mismatch() {
        assert!(matches!(
            check("SELECT l_TAX FROM lineitem , orders WHERE o_ORDERDATE = l_ORDERKEY"),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregates_sharing_an_output_name() {
        assert!(matches!(
            check("SELECT SUM(l_TAX) AS t , SUM(l_DISCOUNT) AS t FROM lineitem"),
            Err(QueryError::DuplicateOutputColumn(name)) if name == "t"
        ));
        assert!(matches!(
            check("SELECT SUM(l_TAX) AS s , AVG(l_TAX) AS S FROM lineitem"),
            Err(QueryError::DuplicateOutputColumn(_))
        ));
        assert!(check("SELECT SUM(l_TAX) AS t , SUM(l_TAX) AS t FROM lineitem").is_ok());
        assert!(check("SELECT SUM(l_TAX) , AVG(l_TAX) , SUM(l_DISCOUNT) AS t FROM lineitem").is_ok());
    }

    #[test]
    fn test_order_by_unselected_aggregate() {
        assert!(matches!(
            check("SELECT l_RETURNFLAG FROM lineitem GROUP BY l_RETURNFLAG ORDER BY SUM(l_TAX)"),
            Err(QueryError::UnknownColumn(name)) if name == "SUM(TAX)"
        ));
    }
}
