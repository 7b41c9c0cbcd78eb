use std::fmt;

use regex::Regex;

use super::registry::SchemaRegistry;
use crate::core::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
}

/// A column as written in the query: `l_QUANTITY` or `QUANTITY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    #[must_use]
    pub fn new(qualifier: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.map(str::to_string),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn qualified(qualifier: &str, name: impl Into<String>) -> Self {
        Self::new(Some(qualifier), name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}_{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Avg,
}

impl AggregateFunction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }

    /// Name of the synthetic column an aggregate produces, e.g. `SUM(QUANTITY)`.
    #[must_use]
    pub fn column_name(&self, column: &ColumnRef) -> String {
        format!("{}({})", self.as_str(), column.name)
    }
}

/// An entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectField {
    pub column: ColumnRef,
    pub aggregate: Option<AggregateFunction>,
    pub alias: Option<String>,
}

impl SelectField {
    #[must_use]
    pub const fn column(column: ColumnRef) -> Self {
        Self {
            column,
            aggregate: None,
            alias: None,
        }
    }

    #[must_use]
    pub const fn aggregate(function: AggregateFunction, column: ColumnRef) -> Self {
        Self {
            column,
            aggregate: Some(function),
            alias: None,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Column name in the result set: the alias, else `SUM(col)`/`AVG(col)`,
    /// else the column name.
    #[must_use]
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match self.aggregate {
            Some(function) => function.column_name(&self.column),
            None => self.column.name.clone(),
        }
    }
}

impl fmt::Display for SelectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregate {
            Some(function) => write!(f, "{}({})", function.as_str(), self.column)?,
            None => write!(f, "{}", self.column)?,
        }
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: String,
}

impl TableRef {
    /// Tables are aliased by the first character of their name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let alias = name
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase().to_string())
            .unwrap_or_default();
        Self { name, alias }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
    Between,
}

impl Operator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
        }
    }

    /// Comparison operators written as symbols.
    #[must_use]
    pub fn from_symbol(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        !matches!(self, Self::Like | Self::In | Self::Between)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Number(i64),
    Text(String),
}

impl Literal {
    /// Integer value, parsing text literals.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Text value; numbers render in decimal.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    #[must_use]
    pub fn from_symbol(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arithmetic {
    pub left: Literal,
    pub op: ArithmeticOp,
    pub right: Literal,
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.as_str(), self.right)
    }
}

/// A constant or an arithmetic expression over two constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Constant(Literal),
    Arithmetic(Arithmetic),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(literal) => write!(f, "{literal}"),
            Self::Arithmetic(arithmetic) => write!(f, "{arithmetic}"),
        }
    }
}

/// LIKE pattern compiled to an anchored regex. `%` matches any run of
/// characters, everything else matches literally.
#[derive(Debug, Clone)]
pub struct LikePattern {
    pub source: String,
    regex: Regex,
}

impl LikePattern {
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let body = source
            .split('%')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{body}$")).map_err(|e| ParseError::InvalidLikePattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    #[must_use]
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for LikePattern {}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Scalar(Scalar),
    /// Column of another table: the condition is a join condition.
    Column(ColumnRef),
    Pattern(LikePattern),
    List(Vec<Literal>),
    Range(Scalar, Scalar),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Column(column) => write!(f, "{column}"),
            Self::Pattern(pattern) => write!(f, "'{}'", pattern.source),
            Self::List(values) => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "({})", values.join(", "))
            }
            Self::Range(low, high) => write!(f, "{low} AND {high}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub left: ColumnRef,
    pub operator: Operator,
    pub right: Operand,
    pub negated: bool,
}

impl Condition {
    #[must_use]
    pub const fn new(left: ColumnRef, operator: Operator, right: Operand) -> Self {
        Self {
            left,
            operator,
            right,
            negated: false,
        }
    }

    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// True if the right operand names a column of a different table.
    #[must_use]
    pub fn is_join(&self) -> bool {
        match &self.right {
            Operand::Column(right) => right.qualifier != self.left.qualifier,
            _ => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.left)?;
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{} {}", self.operator, self.right)
    }
}

/// The WHERE clause as written: one lead condition plus a flat AND chain and
/// a flat OR chain. Rows pass when `(lead AND and...) OR or...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub lead: Condition,
    pub and: Vec<Condition>,
    pub or: Vec<Condition>,
}

impl Filter {
    #[must_use]
    pub const fn new(lead: Condition) -> Self {
        Self {
            lead,
            and: Vec::new(),
            or: Vec::new(),
        }
    }

    /// Every condition in lead, AND, OR order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        std::iter::once(&self.lead).chain(&self.and).chain(&self.or)
    }

    pub(crate) fn conditions_mut(&mut self) -> impl Iterator<Item = &mut Condition> {
        std::iter::once(&mut self.lead)
            .chain(self.and.iter_mut())
            .chain(self.or.iter_mut())
    }

    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        let mut conjunction = vec![Predicate::Comparison(self.lead.clone())];
        conjunction.extend(self.and.iter().cloned().map(Predicate::Comparison));
        let mut disjunction = vec![Predicate::And(conjunction)];
        disjunction.extend(self.or.iter().cloned().map(Predicate::Comparison));
        Predicate::Or(disjunction)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lead)?;
        for condition in &self.and {
            write!(f, " AND {condition}")?;
        }
        for condition in &self.or {
            write!(f, " OR {condition}")?;
        }
        Ok(())
    }
}

/// Boolean expression tree the evaluator walks. An empty `And` is true, an
/// empty `Or` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Comparison(Condition),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortTarget {
    Column(ColumnRef),
    Aggregate(AggregateFunction, ColumnRef),
}

impl fmt::Display for SortTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Aggregate(function, column) => write!(f, "{}({column})", function.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub target: SortTarget,
    pub descending: bool,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if self.descending {
            f.write_str(" DESC")?;
        }
        Ok(())
    }
}

/// Parsed SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query_type: QueryType,
    pub fields: Vec<SelectField>,
    pub tables: Vec<TableRef>,
    pub filter: Option<Filter>,
    pub group_by: Vec<ColumnRef>,
    pub order_by: Vec<OrderKey>,
    /// Columns referenced per table alias.
    pub registry: SchemaRegistry,
}

impl Query {
    /// Join conditions in lead, AND, OR order.
    #[must_use]
    pub fn join_conditions(&self) -> Vec<&Condition> {
        self.filter
            .iter()
            .flat_map(Filter::conditions)
            .filter(|c| c.is_join())
            .collect()
    }

    #[must_use]
    pub fn has_aggregates(&self) -> bool {
        self.fields.iter().any(|f| f.aggregate.is_some())
    }

    #[must_use]
    pub fn table(&self, alias: &str) -> Option<&TableRef> {
        self.tables.iter().find(|t| t.alias == alias)
    }

    /// Line-oriented dump of the parsed query.
    #[must_use]
    pub fn describe(&self) -> String {
        fn quoted<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
            items.into_iter().map(|item| format!("\"{item}\", ")).collect()
        }

        let mut out = String::new();
        out.push_str("query type: \"SELECT\"\n");
        out.push_str(&format!("select fields: {}\n", quoted(&self.fields)));
        out.push_str(&format!(
            "tables: {}\n",
            quoted(self.tables.iter().map(|t| format!("{} ({})", t.name, t.alias)))
        ));
        let (lead, and, or) = match &self.filter {
            Some(filter) => (
                quoted(std::iter::once(&filter.lead)),
                quoted(&filter.and),
                quoted(&filter.or),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        out.push_str(&format!("condition: {lead}\n"));
        out.push_str(&format!("AND conditions: {and}\n"));
        out.push_str(&format!("OR conditions: {or}\n"));
        out.push_str(&format!("group by: {}\n", quoted(&self.group_by)));
        out.push_str(&format!("order by: {}\n", quoted(&self.order_by)));
        out
    }
}

/// Canonical SQL text. Parsing it yields an equal `Query`.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(items: &[T]) -> String {
            items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        }

        write!(f, "SELECT {}", list(&self.fields))?;
        let tables: Vec<&str> = self.tables.iter().map(|t| t.name.as_str()).collect();
        write!(f, " FROM {}", tables.join(", "))?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", list(&self.group_by))?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", list(&self.order_by))?;
        }
        Ok(())
    }
}
