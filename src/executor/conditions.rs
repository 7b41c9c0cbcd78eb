/// Condition evaluation for WHERE clauses
///
/// This module handles evaluation of WHERE conditions against rows.
/// Supports: =, !=, >, <, >=, <=, LIKE, IN, BETWEEN, NOT and the AND/OR
/// predicate tree built from the flat lead / AND / OR chains.
///
/// Comparisons are type-directed: INT columns compare numerically, STRING
/// columns lexicographically.
use std::cmp::Ordering;

use crate::core::{QueryError, Result, Row, Schema, Value};
use crate::parser::{
    Arithmetic, ArithmeticOp, Condition, Filter, Literal, Operand, Operator, Predicate, Scalar,
};

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate a whole WHERE clause: `(lead AND and...) OR or...`.
    pub fn evaluate_filter(schema: &Schema, row: &Row, filter: &Filter) -> Result<bool> {
        Self::evaluate_predicate(schema, row, &filter.to_predicate())
    }

    pub fn evaluate_predicate(schema: &Schema, row: &Row, predicate: &Predicate) -> Result<bool> {
        match predicate {
            Predicate::Comparison(condition) => Self::evaluate_with_schema(schema, row, condition),
            Predicate::And(children) => {
                for child in children {
                    if !Self::evaluate_predicate(schema, row, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(children) => {
                for child in children {
                    if Self::evaluate_predicate(schema, row, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(child) => Ok(!Self::evaluate_predicate(schema, row, child)?),
        }
    }

    /// Evaluate one condition against a row described by `schema`.
    pub fn evaluate_with_schema(schema: &Schema, row: &Row, condition: &Condition) -> Result<bool> {
        let left = &condition.left;
        let (ordinal, _) = schema.lookup(left.qualifier.as_deref(), &left.name)?;
        let value = row.get(ordinal)?;
        let column = left.to_string();

        let matched = match &condition.right {
            Operand::Scalar(scalar) => {
                let right = Self::scalar_value(scalar)?;
                let ordering = Self::compare_literal(&column, value, &right)?;
                Self::satisfies(condition.operator, ordering)
            }
            Operand::Pattern(pattern) => match value {
                Value::Str(text) => pattern.is_match(text),
                Value::Int(_) => {
                    return Err(QueryError::type_mismatch(column, "LIKE needs a STRING column"));
                }
            },
            Operand::List(values) => {
                let mut found = false;
                for literal in values {
                    if Self::compare_literal(&column, value, literal)? == Ordering::Equal {
                        found = true;
                        break;
                    }
                }
                found
            }
            Operand::Range(low, high) => {
                let Value::Int(v) = value else {
                    return Err(QueryError::type_mismatch(column, "BETWEEN needs an INT column"));
                };
                let low = Self::int_scalar(&column, low)?;
                let high = Self::int_scalar(&column, high)?;
                low <= *v && *v <= high
            }
            Operand::Column(_) => {
                return Err(QueryError::UnsupportedPredicate(format!(
                    "join condition '{condition}' in a single-table filter"
                )));
            }
        };
        Ok(matched != condition.negated)
    }

    /// Compare two column values with a comparison operator.
    #[must_use]
    pub fn compare_values(left: &Value, operator: Operator, right: &Value) -> bool {
        Self::satisfies(operator, left.compare(right))
    }

    /// Reduce a constant or arithmetic expression to a literal. Arithmetic
    /// runs on `i64`, division truncates toward zero.
    pub fn scalar_value(scalar: &Scalar) -> Result<Literal> {
        match scalar {
            Scalar::Constant(literal) => Ok(literal.clone()),
            Scalar::Arithmetic(arithmetic) => Self::arithmetic(arithmetic).map(Literal::Number),
        }
    }

    fn arithmetic(arithmetic: &Arithmetic) -> Result<i64> {
        let expression = arithmetic.to_string();
        let operand = |literal: &Literal| {
            literal.as_int().ok_or_else(|| {
                QueryError::type_mismatch(expression.clone(), format!("{literal} is not an integer"))
            })
        };
        let (a, b) = (operand(&arithmetic.left)?, operand(&arithmetic.right)?);
        let result = match arithmetic.op {
            ArithmeticOp::Add => a.checked_add(b),
            ArithmeticOp::Sub => a.checked_sub(b),
            ArithmeticOp::Mul => a.checked_mul(b),
            ArithmeticOp::Div => {
                if b == 0 {
                    return Err(QueryError::DivisionByZero(expression));
                }
                a.checked_div(b)
            }
        };
        result.ok_or(QueryError::ArithmeticOverflow(expression))
    }

    fn int_scalar(column: &str, scalar: &Scalar) -> Result<i64> {
        let literal = Self::scalar_value(scalar)?;
        literal
            .as_int()
            .ok_or_else(|| QueryError::type_mismatch(column, format!("{literal} is not an integer")))
    }

    /// Order a row value against a literal, using the value's type.
    fn compare_literal(column: &str, value: &Value, literal: &Literal) -> Result<Ordering> {
        match value {
            Value::Int(v) => {
                let other = literal.as_int().ok_or_else(|| {
                    QueryError::type_mismatch(column, format!("{literal} is not an integer"))
                })?;
                Ok(v.cmp(&other))
            }
            Value::Str(s) => Ok(s.as_str().cmp(literal.as_text().as_str())),
        }
    }

    fn satisfies(operator: Operator, ordering: Ordering) -> bool {
        match operator {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            Operator::Like | Operator::In | Operator::Between => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};
    use crate::parser::{ColumnRef, LikePattern};

    fn create_test_schema() -> Schema {
        Schema::builder()
            .with(Column::qualified("l", "QUANTITY", DataType::Int))
            .with(Column::qualified("l", "RETURNFLAG", DataType::String))
            .with(Column::qualified("l", "SHIPDATE", DataType::String))
            .build()
    }

    fn create_test_row() -> Row {
        Row::new(vec![
            Value::Int(30),
            Value::from("B"),
            Value::from("1998-09-04"),
        ])
    }

    fn column(name: &str) -> ColumnRef {
        ColumnRef::qualified("l", name)
    }

    fn number(n: i64) -> Operand {
        Operand::Scalar(Scalar::Constant(Literal::Number(n)))
    }

    fn text(s: &str) -> Operand {
        Operand::Scalar(Scalar::Constant(Literal::Text(s.to_string())))
    }

    fn eval(condition: &Condition) -> Result<bool> {
        ConditionEvaluator::evaluate_with_schema(&create_test_schema(), &create_test_row(), condition)
    }

    #[test]
    fn test_comparison_operators() {
        let cases = [
            (Operator::Eq, 30, true),
            (Operator::Eq, 31, false),
            (Operator::Ne, 31, true),
            (Operator::Gt, 25, true),
            (Operator::Gt, 30, false),
            (Operator::Lt, 35, true),
            (Operator::Gte, 30, true),
            (Operator::Lte, 29, false),
        ];
        for (operator, n, expected) in cases {
            let cond = Condition::new(column("QUANTITY"), operator, number(n));
            assert_eq!(eval(&cond).unwrap(), expected, "QUANTITY {operator} {n}");
            assert_eq!(eval(&cond.negate()).unwrap(), !expected);
        }
    }

    #[test]
    fn test_int_column_is_numeric() {
        // 30 > 4 numerically even though "30" < "4" as text
        let cond = Condition::new(column("QUANTITY"), Operator::Gt, text("4"));
        assert!(eval(&cond).unwrap());
        let cond = Condition::new(column("QUANTITY"), Operator::Gt, text("four"));
        assert!(matches!(eval(&cond), Err(QueryError::TypeMismatch { .. })));
    }

    #[test]
    fn test_string_column_is_lexicographic() {
        let cond = Condition::new(column("SHIPDATE"), Operator::Lt, text("1998-11-05"));
        assert!(eval(&cond).unwrap());
        let cond = Condition::new(column("RETURNFLAG"), Operator::Eq, text("B"));
        assert!(eval(&cond).unwrap());
    }

    #[test]
    fn test_arithmetic_operand() {
        let arithmetic = |left, op, right| {
            Operand::Scalar(Scalar::Arithmetic(Arithmetic {
                left: Literal::Number(left),
                op,
                right: Literal::Number(right),
            }))
        };
        let cond = Condition::new(column("QUANTITY"), Operator::Eq, arithmetic(3, ArithmeticOp::Mul, 10));
        assert!(eval(&cond).unwrap());
        let cond = Condition::new(column("QUANTITY"), Operator::Eq, arithmetic(61, ArithmeticOp::Div, 2));
        assert!(eval(&cond).unwrap());
        let cond = Condition::new(column("QUANTITY"), Operator::Eq, arithmetic(1, ArithmeticOp::Div, 0));
        assert!(matches!(eval(&cond), Err(QueryError::DivisionByZero(_))));
        let cond = Condition::new(column("QUANTITY"), Operator::Eq, arithmetic(i64::MAX, ArithmeticOp::Add, 1));
        assert!(matches!(eval(&cond), Err(QueryError::ArithmeticOverflow(_))));
    }

    #[test]
    fn test_between_is_inclusive() {
        let range = |low, high| {
            Operand::Range(
                Scalar::Constant(Literal::Number(low)),
                Scalar::Constant(Literal::Number(high)),
            )
        };
        assert!(eval(&Condition::new(column("QUANTITY"), Operator::Between, range(30, 40))).unwrap());
        assert!(eval(&Condition::new(column("QUANTITY"), Operator::Between, range(20, 30))).unwrap());
        assert!(!eval(&Condition::new(column("QUANTITY"), Operator::Between, range(31, 40))).unwrap());
        assert!(eval(&Condition::new(column("QUANTITY"), Operator::Between, range(31, 40)).negate()).unwrap());
    }

    #[test]
    fn test_in_list() {
        let list = |values: &[&str]| {
            Operand::List(values.iter().map(|v| Literal::Text((*v).to_string())).collect())
        };
        assert!(eval(&Condition::new(column("RETURNFLAG"), Operator::In, list(&["A", "B"]))).unwrap());
        assert!(!eval(&Condition::new(column("RETURNFLAG"), Operator::In, list(&["A", "C"]))).unwrap());
        assert!(!eval(&Condition::new(column("RETURNFLAG"), Operator::In, list(&[]))).unwrap());
        assert!(eval(&Condition::new(column("RETURNFLAG"), Operator::In, list(&[])).negate()).unwrap());
    }

    #[test]
    fn test_like() {
        let like = |pattern| Operand::Pattern(LikePattern::compile(pattern).unwrap());
        assert!(eval(&Condition::new(column("SHIPDATE"), Operator::Like, like("1998%"))).unwrap());
        assert!(eval(&Condition::new(column("SHIPDATE"), Operator::Like, like("%-09-%"))).unwrap());
        assert!(!eval(&Condition::new(column("SHIPDATE"), Operator::Like, like("1998"))).unwrap());
        assert!(matches!(
            eval(&Condition::new(column("QUANTITY"), Operator::Like, like("3%"))),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_column() {
        let cond = Condition::new(column("TAX"), Operator::Eq, number(1));
        assert!(matches!(eval(&cond), Err(QueryError::UnknownColumn(_))));
    }

    #[test]
    fn test_filter_combination() {
        let schema = create_test_schema();
        let row = create_test_row();
        let yes = Condition::new(column("QUANTITY"), Operator::Eq, number(30));
        let no = Condition::new(column("QUANTITY"), Operator::Eq, number(0));

        let filter = |lead: &Condition, and: &[&Condition], or: &[&Condition]| Filter {
            lead: lead.clone(),
            and: and.iter().map(|c| (*c).clone()).collect(),
            or: or.iter().map(|c| (*c).clone()).collect(),
        };
        let check = |f: &Filter| ConditionEvaluator::evaluate_filter(&schema, &row, f).unwrap();

        assert!(check(&filter(&yes, &[&yes], &[])));
        assert!(!check(&filter(&yes, &[&no], &[])));
        // (lead AND and) OR or
        assert!(check(&filter(&yes, &[&no], &[&yes])));
        assert!(check(&filter(&no, &[], &[&no, &yes])));
        assert!(!check(&filter(&no, &[&yes], &[&no])));
    }

    #[test]
    fn test_predicate_tree() {
        let schema = create_test_schema();
        let row = create_test_row();
        let yes = Predicate::Comparison(Condition::new(column("QUANTITY"), Operator::Eq, number(30)));
        let check = |p: &Predicate| ConditionEvaluator::evaluate_predicate(&schema, &row, p).unwrap();

        assert!(check(&Predicate::And(vec![])));
        assert!(!check(&Predicate::Or(vec![])));
        assert!(!check(&Predicate::Not(Box::new(yes.clone()))));
        assert!(check(&Predicate::Or(vec![Predicate::Not(Box::new(yes.clone())), yes])));
    }

    #[test]
    fn test_compare_values() {
        assert!(ConditionEvaluator::compare_values(&Value::Int(3), Operator::Lt, &Value::Int(10)));
        assert!(ConditionEvaluator::compare_values(&Value::from("3"), Operator::Gt, &Value::from("10")));
    }
}
