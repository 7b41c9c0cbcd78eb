// Module declarations
mod common;
mod fsm;
pub mod lexer;
pub mod registry;
mod statement;

// Re-export the AST
pub use registry::SchemaRegistry;
pub use statement::{
    AggregateFunction, Arithmetic, ArithmeticOp, ColumnRef, Condition, Filter, LikePattern,
    Literal, Operand, Operator, OrderKey, Predicate, Query, QueryType, Scalar, SelectField,
    SortTarget, TableRef,
};

use crate::core::ParseError;

/// Parse one SELECT statement. A trailing `;` is ignored.
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    let input = input.trim();
    let input = input.trim_end_matches(';');

    let tokens = lexer::tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let query = fsm::QueryParser::new().parse(&tokens)?;
    log::debug!("parsed query: {query}");
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(sql: &str) -> Query {
        let query = parse_query(sql).unwrap();
        let printed = query.to_string();
        let reparsed = parse_query(&printed)
            .unwrap_or_else(|e| panic!("failed to reparse '{printed}': {e}"));
        assert_eq!(query, reparsed, "round trip through '{printed}'");
        query
    }

    #[test]
    fn test_parse_simple_select() {
        let query = parse_query("SELECT l_ORDERKEY , l_TAX FROM lineitem").unwrap();
        assert_eq!(query.query_type, QueryType::Select);
        assert_eq!(
            query.fields,
            vec![
                SelectField::column(ColumnRef::qualified("l", "ORDERKEY")),
                SelectField::column(ColumnRef::qualified("l", "TAX")),
            ]
        );
        assert_eq!(query.tables, vec![TableRef::new("lineitem")]);
        assert!(query.filter.is_none());
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let upper = parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX > 5").unwrap();
        let lower = parse_query("select l_TAX from lineitem where l_TAX > 5").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_unqualified_columns_bind_to_single_table() {
        let query = parse_query("SELECT QUANTITY FROM lineitem WHERE TAX > 100").unwrap();
        assert_eq!(query.fields[0].column, ColumnRef::qualified("l", "QUANTITY"));
        let filter = query.filter.unwrap();
        assert_eq!(filter.lead.left, ColumnRef::qualified("l", "TAX"));
        assert_eq!(query.registry.columns("l"), ["QUANTITY", "TAX"]);
    }

    #[test]
    fn test_unqualified_column_with_two_tables() {
        assert_eq!(
            parse_query("SELECT QUANTITY FROM lineitem , orders"),
            Err(ParseError::AmbiguousColumn("QUANTITY".to_string()))
        );
    }

    #[test]
    fn test_unknown_qualifier() {
        assert_eq!(
            parse_query("SELECT x_TAX FROM lineitem"),
            Err(ParseError::UnknownQualifier("x".to_string()))
        );
    }

    #[test]
    fn test_duplicate_alias() {
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem , lines"),
            Err(ParseError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn test_where_chains() {
        let query = parse_query(
            "SELECT l_TAX FROM lineitem WHERE l_TAX > 5 AND l_TAX < 900 OR l_QUANTITY = 0 AND l_DISCOUNT != 3",
        )
        .unwrap();
        let filter = query.filter.unwrap();
        assert_eq!(filter.lead.operator, Operator::Gt);
        assert_eq!(filter.and.len(), 2);
        assert_eq!(filter.and[1].operator, Operator::Ne);
        assert_eq!(filter.or.len(), 1);
        assert_eq!(filter.or[0].left.name, "QUANTITY");
    }

    #[test]
    fn test_arithmetic_operand() {
        let query = parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX >= 100 * 2").unwrap();
        assert_eq!(
            query.filter.unwrap().lead.right,
            Operand::Scalar(Scalar::Arithmetic(Arithmetic {
                left: Literal::Number(100),
                op: ArithmeticOp::Mul,
                right: Literal::Number(2),
            }))
        );
    }

    #[test]
    fn test_like_pattern() {
        let query = parse_query("SELECT l_SHIPDATE FROM lineitem WHERE l_SHIPDATE LIKE '1998%'").unwrap();
        let lead = query.filter.unwrap().lead;
        assert_eq!(lead.operator, Operator::Like);
        let Operand::Pattern(pattern) = lead.right else {
            panic!("expected LIKE pattern");
        };
        assert_eq!(pattern.source, "1998%");
        assert_eq!(pattern.as_regex(), "^1998.*$");
        assert!(pattern.is_match("1998-09-03"));
        assert!(!pattern.is_match("x1998"));
    }

    #[test]
    fn test_like_escapes_regex_characters() {
        let pattern = LikePattern::compile("a.b%").unwrap();
        assert!(pattern.is_match("a.bcd"));
        assert!(!pattern.is_match("axbcd"));
    }

    #[test]
    fn test_in_lists() {
        let query = parse_query("SELECT l_TAX FROM lineitem WHERE l_RETURNFLAG IN ('A', 'B')").unwrap();
        assert_eq!(
            query.filter.unwrap().lead.right,
            Operand::List(vec![Literal::Text("A".to_string()), Literal::Text("B".to_string())])
        );

        let query = parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX IN ()").unwrap();
        assert_eq!(query.filter.unwrap().lead.right, Operand::List(vec![]));

        assert!(parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX IN (1, )").is_err());
    }

    #[test]
    fn test_between_with_and_without_parentheses() {
        let plain = parse_query("SELECT l_TAX FROM lineitem WHERE l_DISCOUNT BETWEEN 0 AND 0 + 500").unwrap();
        let paren = parse_query("SELECT l_TAX FROM lineitem WHERE l_DISCOUNT BETWEEN (0 AND 0 + 500)").unwrap();
        assert_eq!(plain, paren);
        assert_eq!(
            plain.filter.unwrap().lead.right,
            Operand::Range(
                Scalar::Constant(Literal::Number(0)),
                Scalar::Arithmetic(Arithmetic {
                    left: Literal::Number(0),
                    op: ArithmeticOp::Add,
                    right: Literal::Number(500),
                }),
            )
        );
    }

    #[test]
    fn test_between_followed_by_and_chain() {
        let query = parse_query(
            "SELECT l_TAX FROM lineitem WHERE l_TAX BETWEEN 1 AND 5 AND l_QUANTITY > 3",
        )
        .unwrap();
        let filter = query.filter.unwrap();
        assert_eq!(filter.lead.operator, Operator::Between);
        assert_eq!(filter.and.len(), 1);
    }

    #[test]
    fn test_not_flag() {
        let query = parse_query("SELECT l_TAX FROM lineitem WHERE l_RETURNFLAG NOT IN ('A')").unwrap();
        let lead = query.filter.unwrap().lead;
        assert!(lead.negated);
        assert_eq!(lead.operator, Operator::In);
    }

    #[test]
    fn test_join_condition() {
        let query = parse_query(
            "SELECT l_ORDERKEY , o_ORDERDATE FROM lineitem , orders WHERE o_ORDERKEY = l_ORDERKEY",
        )
        .unwrap();
        let joins = query.join_conditions();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].right, Operand::Column(ColumnRef::qualified("l", "ORDERKEY")));
        assert_eq!(query.registry.columns("l"), ["ORDERKEY"]);
        assert_eq!(query.registry.columns("o"), ["ORDERDATE", "ORDERKEY"]);
    }

    #[test]
    fn test_aggregates_and_aliases() {
        let query = parse_query(
            "SELECT l_RETURNFLAG , SUM(l_QUANTITY) AS total , AVG(l_TAX) FROM lineitem GROUP BY l_RETURNFLAG ORDER BY total DESC",
        )
        .unwrap();
        assert_eq!(query.fields[1].output_name(), "total");
        assert_eq!(query.fields[2].output_name(), "AVG(TAX)");
        assert_eq!(query.group_by, vec![ColumnRef::qualified("l", "RETURNFLAG")]);
        // the output alias is not a column of lineitem
        assert_eq!(
            query.order_by[0].target,
            SortTarget::Column(ColumnRef::new(None, "total"))
        );
        assert!(query.order_by[0].descending);
        assert_eq!(query.registry.columns("l"), ["RETURNFLAG", "QUANTITY", "TAX"]);
    }

    #[test]
    fn test_order_by_aggregate_and_direction() {
        let query = parse_query(
            "SELECT l_RETURNFLAG , SUM(l_QUANTITY) FROM lineitem GROUP BY l_RETURNFLAG ORDER BY SUM(l_QUANTITY) ASC , l_RETURNFLAG DESC",
        )
        .unwrap();
        assert_eq!(
            query.order_by,
            vec![
                OrderKey {
                    target: SortTarget::Aggregate(AggregateFunction::Sum, ColumnRef::qualified("l", "QUANTITY")),
                    descending: false,
                },
                OrderKey {
                    target: SortTarget::Column(ColumnRef::qualified("l", "RETURNFLAG")),
                    descending: true,
                },
            ]
        );
    }

    #[test]
    fn test_trailing_semicolon() {
        assert!(parse_query("SELECT l_TAX FROM lineitem;").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_query("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_query("UPDATE lineitem"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX >"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX BETWEEN (1 AND 5"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX = AND"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem WHERE l_TAX = 'open"),
            Err(ParseError::UnterminatedString(_))
        ));
    }

    #[test]
    fn test_repeated_alias_or_direction() {
        assert!(matches!(
            parse_query("SELECT SUM(l_TAX) AS a AS b FROM lineitem"),
            Err(ParseError::UnexpectedToken { expected: "',' or FROM", .. })
        ));
        assert!(matches!(
            parse_query("SELECT l_TAX FROM lineitem ORDER BY l_TAX ASC DESC"),
            Err(ParseError::UnexpectedToken { expected: "','", .. })
        ));
        let query = parse_query("SELECT l_TAX AS t , l_DISCOUNT FROM lineitem ORDER BY l_TAX DESC , l_DISCOUNT").unwrap();
        assert_eq!(query.fields[0].alias.as_deref(), Some("t"));
        assert!(query.order_by[0].descending);
        assert!(!query.order_by[1].descending);
    }

    #[test]
    fn test_round_trips() {
        round_trip("SELECT l_ORDERKEY , l_TAX FROM lineitem");
        round_trip("SELECT QUANTITY FROM lineitem WHERE SHIPDATE LIKE '1998%' AND DISCOUNT BETWEEN 0 AND 0 + 500");
        round_trip("SELECT l_TAX FROM lineitem WHERE l_TAX > 5 OR l_TAX < 2 AND l_QUANTITY NOT = 3");
        round_trip("SELECT l_TAX FROM lineitem WHERE l_RETURNFLAG IN ('A', B) OR l_TAX IN ()");
        round_trip(
            "SELECT l_ORDERKEY , l_TAX , o_SHIPPRIORITY FROM lineitem , orders WHERE o_ORDERKEY = l_ORDERKEY AND l_TAX >= 500",
        );
        round_trip(
            "SELECT l_RETURNFLAG , l_LINESTATUS , SUM(l_QUANTITY) AS q , AVG(l_TAX) FROM lineitem GROUP BY l_RETURNFLAG , l_LINESTATUS ORDER BY q DESC , l_LINESTATUS",
        );
    }

    #[test]
    fn test_describe() {
        let query = parse_query(
            "SELECT l_ORDERKEY , o_ORDERDATE FROM lineitem , orders WHERE o_ORDERKEY = l_ORDERKEY AND l_TAX > 5",
        )
        .unwrap();
        let dump = query.describe();
        assert!(dump.contains("query type: \"SELECT\""));
        assert!(dump.contains("select fields: \"l_ORDERKEY\", \"o_ORDERDATE\", "));
        assert!(dump.contains("tables: \"lineitem (l)\", \"orders (o)\", "));
        assert!(dump.contains("condition: \"o_ORDERKEY = l_ORDERKEY\", "));
        assert!(dump.contains("AND conditions: \"l_TAX > 5\", "));
        assert!(dump.contains("OR conditions: \n"));
    }
}
