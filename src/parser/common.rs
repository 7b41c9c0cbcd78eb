use super::statement::{AggregateFunction, ColumnRef, Literal};
use crate::core::ParseError;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{alpha1, char, digit1},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, pair},
    IResult,
};

/// Words that end or restructure a clause and so never name a column or
/// stand for a bare text literal.
pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "AS", "GROUP", "ORDER", "BY", "ASC", "DESC",
    "LIKE", "IN", "BETWEEN",
];

#[must_use]
pub fn is_keyword(token: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(token))
}

pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

pub fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>())(input)
}

/// `'text'`, possibly empty.
pub fn string_literal(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)
}

pub fn aggregate_function(input: &str) -> IResult<&str, AggregateFunction> {
    alt((
        value(AggregateFunction::Sum, tag_no_case("SUM")),
        value(AggregateFunction::Avg, tag_no_case("AVG")),
    ))(input)
}

/// `SUM(l_QUANTITY)` → `(Sum, "l_QUANTITY")`.
pub fn aggregate_call(input: &str) -> IResult<&str, (AggregateFunction, &str)> {
    pair(
        aggregate_function,
        delimited(char('('), take_while1(|c| c != ')'), char(')')),
    )(input)
}

/// Split `<qualifier>_<name>` at the last underscore. Tokens without an
/// underscore (or starting with one) are unqualified.
#[must_use]
pub fn split_qualified(ident: &str) -> ColumnRef {
    match ident.rsplit_once('_') {
        Some((qualifier, name)) if !qualifier.is_empty() && !name.is_empty() => {
            ColumnRef::qualified(qualifier, name)
        }
        _ => ColumnRef::new(None, ident),
    }
}

/// A whole token usable as a table name or output alias.
pub fn alias_name(token: &str) -> Option<&str> {
    if is_keyword(token) {
        return None;
    }
    all_consuming(identifier)(token).ok().map(|(_, ident)| ident)
}

/// A whole token naming a column.
pub fn column_ref(token: &str) -> Option<ColumnRef> {
    if is_keyword(token) {
        return None;
    }
    all_consuming(identifier)(token)
        .ok()
        .map(|(_, ident)| split_qualified(ident))
}

/// A whole token holding `SUM(col)` or `AVG(col)`.
pub fn aggregate_ref(token: &str) -> Option<(AggregateFunction, ColumnRef)> {
    let (_, (function, inner)) = all_consuming(aggregate_call)(token).ok()?;
    column_ref(inner).map(|column| (function, column))
}

/// A whole token holding a literal: an unquoted integer, quoted text, or a
/// bare word taken as text.
pub fn literal(token: &str) -> Result<Literal, ParseError> {
    let parsed: IResult<&str, Literal> = all_consuming(alt((
        map(integer, Literal::Number),
        map(string_literal, |s: &str| Literal::Text(s.to_string())),
    )))(token);
    if let Ok((_, literal)) = parsed {
        return Ok(literal);
    }
    let numeric: IResult<&str, &str> = recognize(pair(opt(char('-')), digit1))(token);
    if matches!(numeric, Ok(("", _))) || token.starts_with('\'') || is_punctuation(token) {
        // out-of-range integers, stray quotes, separators
        return Err(ParseError::InvalidLiteral(token.to_string()));
    }
    Ok(Literal::Text(token.to_string()))
}

fn is_punctuation(token: &str) -> bool {
    matches!(token, "," | "(" | ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_last_underscore() {
        assert_eq!(split_qualified("l_QUANTITY"), ColumnRef::qualified("l", "QUANTITY"));
        assert_eq!(split_qualified("a_b_TAX"), ColumnRef::qualified("a_b", "TAX"));
        assert_eq!(split_qualified("QUANTITY"), ColumnRef::new(None, "QUANTITY"));
        assert_eq!(split_qualified("_TAX"), ColumnRef::new(None, "_TAX"));
    }

    #[test]
    fn test_column_ref_rejects_keywords_and_literals() {
        assert!(column_ref("FROM").is_none());
        assert!(column_ref("'x'").is_none());
        assert!(column_ref("42").is_none());
        assert!(column_ref("o_ORDERKEY").is_some());
    }

    #[test]
    fn test_aggregate_ref() {
        assert_eq!(
            aggregate_ref("sum(l_QUANTITY)"),
            Some((AggregateFunction::Sum, ColumnRef::qualified("l", "QUANTITY")))
        );
        assert_eq!(
            aggregate_ref("AVG(TAX)"),
            Some((AggregateFunction::Avg, ColumnRef::new(None, "TAX")))
        );
        assert_eq!(aggregate_ref("COUNT(TAX)"), None);
        assert_eq!(aggregate_ref("SUM(TAX)x"), None);
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal("42"), Ok(Literal::Number(42)));
        assert_eq!(literal("-7"), Ok(Literal::Number(-7)));
        assert_eq!(literal("'1998%'"), Ok(Literal::Text("1998%".to_string())));
        assert_eq!(literal("''"), Ok(Literal::Text(String::new())));
        assert_eq!(literal("A"), Ok(Literal::Text("A".to_string())));
        assert_eq!(literal("1998-09-03"), Ok(Literal::Text("1998-09-03".to_string())));
        assert!(matches!(literal("99999999999999999999"), Err(ParseError::InvalidLiteral(_))));
        assert!(matches!(literal(","), Err(ParseError::InvalidLiteral(_))));
    }
}
