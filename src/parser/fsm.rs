/// Token-driven state machine building a `Query`.
///
/// Each state names what the next token may be. Most transitions consume the
/// token; the states that close an open-ended operand (a comparison value or
/// an upper BETWEEN bound) hand the token back so `WhereContinue` sees it.
use super::common::{aggregate_ref, alias_name, column_ref, is_keyword, literal};
use super::lexer::Token;
use super::registry::SchemaRegistry;
use super::statement::{
    Arithmetic, ArithmeticOp, ColumnRef, Condition, Filter, LikePattern, Literal, Operand,
    Operator, OrderKey, Query, QueryType, Scalar, SelectField, SortTarget, TableRef,
};
use crate::core::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Lead,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Type,
    SelectField,
    SelectFieldNext,
    SelectAlias,
    SelectAliasNext,
    SelectFromTable,
    SelectFromNext,
    WhereField,
    WhereOperator,
    WhereComparison,
    WhereValueType,
    WhereArithmetic,
    WhereLike,
    WhereIn,
    WhereInValue,
    WhereInNext,
    WhereBetween,
    WhereBetweenValue(Bound),
    WhereBetweenArithmetic(Bound),
    WhereBetweenHigh,
    WhereContinue,
    WhereAnd,
    WhereOr,
    GroupBy,
    GroupByField,
    GroupByNext,
    OrderBy,
    OrderByField,
    OrderByNext,
    OrderByDirected,
}

impl State {
    /// What the state is waiting for, for error messages.
    const fn expects(self) -> &'static str {
        match self {
            Self::Type => "SELECT",
            Self::SelectField => "a column or aggregate",
            Self::SelectFieldNext => "',', AS or FROM",
            Self::SelectAlias => "an alias",
            Self::SelectAliasNext => "',' or FROM",
            Self::SelectFromTable => "a table name",
            Self::SelectFromNext => "',', WHERE, GROUP or ORDER",
            Self::WhereField | Self::WhereAnd | Self::WhereOr => "a column",
            Self::WhereOperator => "a comparison operator, LIKE, IN, BETWEEN or NOT",
            Self::WhereComparison
            | Self::WhereArithmetic
            | Self::WhereBetweenArithmetic(_)
            | Self::WhereBetweenHigh => "a value",
            Self::WhereValueType => "an arithmetic operator, AND, OR, GROUP or ORDER",
            Self::WhereLike => "a LIKE pattern",
            Self::WhereIn => "'('",
            Self::WhereInValue => "a value or ')'",
            Self::WhereInNext => "',' or ')'",
            Self::WhereBetween => "'(' or a value",
            Self::WhereBetweenValue(Bound::Low) => "AND",
            Self::WhereBetweenValue(Bound::High) => "')'",
            Self::WhereContinue => "AND, OR, GROUP or ORDER",
            Self::GroupBy | Self::OrderBy => "BY",
            Self::GroupByField => "a column",
            Self::GroupByNext => "',' or ORDER",
            Self::OrderByField => "a column or aggregate",
            Self::OrderByNext => "',', ASC or DESC",
            Self::OrderByDirected => "','",
        }
    }

    const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::SelectFromNext
                | Self::WhereValueType
                | Self::WhereContinue
                | Self::WhereBetweenValue(Bound::High)
                | Self::GroupByNext
                | Self::OrderByNext
                | Self::OrderByDirected
        )
    }
}

enum Step {
    Consumed,
    Reprocess,
}

/// Condition whose right operand is still being read.
struct Pending {
    chain: Chain,
    left: ColumnRef,
    negated: bool,
    operator: Operator,
    scalar: Option<Scalar>,
    arithmetic: Option<ArithmeticOp>,
    low: Option<Scalar>,
    parenthesized: bool,
    list: Vec<Literal>,
}

impl Pending {
    const fn new(chain: Chain, left: ColumnRef) -> Self {
        Self {
            chain,
            left,
            negated: false,
            operator: Operator::Eq,
            scalar: None,
            arithmetic: None,
            low: None,
            parenthesized: false,
            list: Vec::new(),
        }
    }

    /// Fold `<scalar> <op>` and a new literal into an arithmetic scalar.
    fn push_value(&mut self, value: Literal) {
        self.scalar = Some(match (self.scalar.take(), self.arithmetic.take()) {
            (Some(Scalar::Constant(left)), Some(op)) => Scalar::Arithmetic(Arithmetic {
                left,
                op,
                right: value,
            }),
            _ => Scalar::Constant(value),
        });
    }

    fn accepts_arithmetic(&self) -> bool {
        matches!(self.scalar, Some(Scalar::Constant(_)))
    }
}

#[derive(Default)]
struct Clauses {
    fields: Vec<SelectField>,
    tables: Vec<TableRef>,
    lead: Option<Condition>,
    and: Vec<Condition>,
    or: Vec<Condition>,
    group_by: Vec<ColumnRef>,
    order_by: Vec<OrderKey>,
}

pub(crate) struct QueryParser {
    state: State,
    clauses: Clauses,
    pending: Option<Pending>,
}

impl QueryParser {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Type,
            clauses: Clauses::default(),
            pending: None,
        }
    }

    pub(crate) fn parse(mut self, tokens: &[Token]) -> Result<Query, ParseError> {
        for token in tokens {
            while let Step::Reprocess = self.step(token)? {}
        }
        self.finish()
    }

    fn step(&mut self, token: &Token) -> Result<Step, ParseError> {
        let text = token.text.as_str();
        let next = match self.state {
            State::Type => {
                if !token.is_keyword("SELECT") {
                    return Err(self.unexpected(token));
                }
                State::SelectField
            }
            State::SelectField => {
                let field = if let Some((function, column)) = aggregate_ref(text) {
                    SelectField::aggregate(function, column)
                } else if let Some(column) = column_ref(text) {
                    SelectField::column(column)
                } else {
                    return Err(self.unexpected(token));
                };
                self.clauses.fields.push(field);
                State::SelectFieldNext
            }
            State::SelectFieldNext => match text {
                "," => State::SelectField,
                _ if token.is_keyword("AS") => State::SelectAlias,
                _ if token.is_keyword("FROM") => State::SelectFromTable,
                _ => return Err(self.unexpected(token)),
            },
            State::SelectAlias => {
                let Some(alias) = alias_name(text) else {
                    return Err(self.unexpected(token));
                };
                if let Some(field) = self.clauses.fields.last_mut() {
                    field.alias = Some(alias.to_string());
                }
                State::SelectAliasNext
            }
            State::SelectAliasNext => match text {
                "," => State::SelectField,
                _ if token.is_keyword("FROM") => State::SelectFromTable,
                _ => return Err(self.unexpected(token)),
            },
            State::SelectFromTable => {
                let Some(name) = alias_name(text) else {
                    return Err(self.unexpected(token));
                };
                self.clauses.tables.push(TableRef::new(name));
                State::SelectFromNext
            }
            State::SelectFromNext => match text {
                "," => State::SelectFromTable,
                _ if token.is_keyword("WHERE") => State::WhereField,
                _ if token.is_keyword("GROUP") => State::GroupBy,
                _ if token.is_keyword("ORDER") => State::OrderBy,
                _ => return Err(self.unexpected(token)),
            },
            State::WhereField | State::WhereAnd | State::WhereOr => {
                let chain = match self.state {
                    State::WhereAnd => Chain::And,
                    State::WhereOr => Chain::Or,
                    _ => Chain::Lead,
                };
                let Some(column) = column_ref(text) else {
                    return Err(self.unexpected(token));
                };
                self.pending = Some(Pending::new(chain, column));
                State::WhereOperator
            }
            State::WhereOperator => {
                let (operator, next) = if token.is_keyword("NOT") {
                    let pending = self.pending(token)?;
                    pending.negated = !pending.negated;
                    return Ok(Step::Consumed);
                } else if let Some(operator) = Operator::from_symbol(text) {
                    (operator, State::WhereComparison)
                } else if token.is_keyword("LIKE") {
                    (Operator::Like, State::WhereLike)
                } else if token.is_keyword("IN") {
                    (Operator::In, State::WhereIn)
                } else if token.is_keyword("BETWEEN") {
                    (Operator::Between, State::WhereBetween)
                } else {
                    return Err(self.unexpected(token));
                };
                self.pending(token)?.operator = operator;
                next
            }
            State::WhereComparison => {
                if let Some(column) = self.join_column(text) {
                    self.finish_condition(Operand::Column(column), token)?;
                    State::WhereContinue
                } else {
                    let value = self.value(token)?;
                    self.pending(token)?.push_value(value);
                    State::WhereValueType
                }
            }
            State::WhereValueType => {
                if let Some(op) = ArithmeticOp::from_symbol(text) {
                    let pending = self.pending(token)?;
                    if pending.accepts_arithmetic() {
                        pending.arithmetic = Some(op);
                        self.state = State::WhereArithmetic;
                        return Ok(Step::Consumed);
                    }
                }
                self.finish_scalar(token)?;
                self.state = State::WhereContinue;
                return Ok(Step::Reprocess);
            }
            State::WhereArithmetic => {
                let value = self.value(token)?;
                self.pending(token)?.push_value(value);
                State::WhereValueType
            }
            State::WhereLike => {
                let source = match self.value(token)? {
                    Literal::Text(text) => text,
                    Literal::Number(n) => n.to_string(),
                };
                let pattern = LikePattern::compile(&source)?;
                self.finish_condition(Operand::Pattern(pattern), token)?;
                State::WhereContinue
            }
            State::WhereIn => {
                if text != "(" {
                    return Err(self.unexpected(token));
                }
                State::WhereInValue
            }
            State::WhereInValue => {
                if text == ")" && self.pending(token)?.list.is_empty() {
                    self.finish_list(token)?;
                    State::WhereContinue
                } else {
                    let value = self.value(token)?;
                    self.pending(token)?.list.push(value);
                    State::WhereInNext
                }
            }
            State::WhereInNext => match text {
                "," => State::WhereInValue,
                ")" => {
                    self.finish_list(token)?;
                    State::WhereContinue
                }
                _ => return Err(self.unexpected(token)),
            },
            State::WhereBetween => {
                if text == "(" {
                    let pending = self.pending(token)?;
                    if pending.parenthesized {
                        return Err(self.unexpected(token));
                    }
                    pending.parenthesized = true;
                    return Ok(Step::Consumed);
                }
                let value = self.value(token)?;
                self.pending(token)?.push_value(value);
                State::WhereBetweenValue(Bound::Low)
            }
            State::WhereBetweenValue(bound) => {
                if let Some(op) = ArithmeticOp::from_symbol(text) {
                    let pending = self.pending(token)?;
                    if pending.accepts_arithmetic() {
                        pending.arithmetic = Some(op);
                        self.state = State::WhereBetweenArithmetic(bound);
                        return Ok(Step::Consumed);
                    }
                }
                return self.after_bound(bound, token);
            }
            State::WhereBetweenArithmetic(bound) => {
                let value = self.value(token)?;
                self.pending(token)?.push_value(value);
                State::WhereBetweenValue(bound)
            }
            State::WhereBetweenHigh => {
                let value = self.value(token)?;
                self.pending(token)?.push_value(value);
                State::WhereBetweenValue(Bound::High)
            }
            State::WhereContinue => {
                if token.is_keyword("AND") {
                    State::WhereAnd
                } else if token.is_keyword("OR") {
                    State::WhereOr
                } else if token.is_keyword("GROUP") {
                    State::GroupBy
                } else if token.is_keyword("ORDER") {
                    State::OrderBy
                } else {
                    return Err(self.unexpected(token));
                }
            }
            State::GroupBy | State::OrderBy => {
                if !token.is_keyword("BY") {
                    return Err(self.unexpected(token));
                }
                if self.state == State::GroupBy {
                    State::GroupByField
                } else {
                    State::OrderByField
                }
            }
            State::GroupByField => {
                let Some(column) = column_ref(text) else {
                    return Err(self.unexpected(token));
                };
                self.clauses.group_by.push(column);
                State::GroupByNext
            }
            State::GroupByNext => match text {
                "," => State::GroupByField,
                _ if token.is_keyword("ORDER") => State::OrderBy,
                _ => return Err(self.unexpected(token)),
            },
            State::OrderByField => {
                let target = if let Some((function, column)) = aggregate_ref(text) {
                    SortTarget::Aggregate(function, column)
                } else if let Some(column) = column_ref(text) {
                    SortTarget::Column(column)
                } else {
                    return Err(self.unexpected(token));
                };
                self.clauses.order_by.push(OrderKey {
                    target,
                    descending: false,
                });
                State::OrderByNext
            }
            State::OrderByNext => {
                let descending = if token.is_keyword("ASC") {
                    false
                } else if token.is_keyword("DESC") {
                    true
                } else if text == "," {
                    self.state = State::OrderByField;
                    return Ok(Step::Consumed);
                } else {
                    return Err(self.unexpected(token));
                };
                if let Some(key) = self.clauses.order_by.last_mut() {
                    key.descending = descending;
                }
                State::OrderByDirected
            }
            State::OrderByDirected => {
                if text != "," {
                    return Err(self.unexpected(token));
                }
                State::OrderByField
            }
        };
        self.state = next;
        Ok(Step::Consumed)
    }

    /// A BETWEEN bound is complete; `token` follows it.
    fn after_bound(&mut self, bound: Bound, token: &Token) -> Result<Step, ParseError> {
        match bound {
            Bound::Low => {
                if !token.is_keyword("AND") {
                    return Err(self.unexpected(token));
                }
                let pending = self.pending(token)?;
                pending.low = pending.scalar.take();
                self.state = State::WhereBetweenHigh;
                Ok(Step::Consumed)
            }
            Bound::High => {
                let parenthesized = self.pending(token)?.parenthesized;
                if parenthesized && token.text != ")" {
                    return Err(self.unexpected(token));
                }
                self.finish_range(token)?;
                self.state = State::WhereContinue;
                Ok(if parenthesized {
                    Step::Consumed
                } else {
                    Step::Reprocess
                })
            }
        }
    }

    /// Right operand naming a column of a table listed in FROM.
    fn join_column(&self, text: &str) -> Option<ColumnRef> {
        column_ref(text).filter(|column| {
            column
                .qualifier
                .as_deref()
                .is_some_and(|q| self.clauses.tables.iter().any(|t| t.alias == q))
        })
    }

    fn value(&self, token: &Token) -> Result<Literal, ParseError> {
        if is_keyword(&token.text) {
            return Err(self.unexpected(token));
        }
        literal(&token.text)
    }

    fn pending(&mut self, token: &Token) -> Result<&mut Pending, ParseError> {
        let error = self.unexpected(token);
        self.pending.as_mut().ok_or(error)
    }

    fn take_pending(&mut self) -> Result<Pending, ParseError> {
        self.pending.take().ok_or(ParseError::UnexpectedEnd {
            expected: self.state.expects(),
        })
    }

    fn finish_scalar(&mut self, token: &Token) -> Result<(), ParseError> {
        let scalar = self.pending(token)?.scalar.take();
        match scalar {
            Some(scalar) => self.finish_condition(Operand::Scalar(scalar), token),
            None => Err(self.unexpected(token)),
        }
    }

    fn finish_list(&mut self, token: &Token) -> Result<(), ParseError> {
        let list = std::mem::take(&mut self.pending(token)?.list);
        self.finish_condition(Operand::List(list), token)
    }

    fn finish_range(&mut self, token: &Token) -> Result<(), ParseError> {
        let pending = self.pending(token)?;
        match (pending.low.take(), pending.scalar.take()) {
            (Some(low), Some(high)) => self.finish_condition(Operand::Range(low, high), token),
            _ => Err(self.unexpected(token)),
        }
    }

    fn finish_condition(&mut self, right: Operand, token: &Token) -> Result<(), ParseError> {
        if self.pending.is_none() {
            return Err(self.unexpected(token));
        }
        self.close_condition(right)
    }

    fn close_condition(&mut self, right: Operand) -> Result<(), ParseError> {
        let pending = self.take_pending()?;
        let condition = Condition {
            left: pending.left,
            operator: pending.operator,
            right,
            negated: pending.negated,
        };
        match pending.chain {
            Chain::Lead => self.clauses.lead = Some(condition),
            Chain::And => self.clauses.and.push(condition),
            Chain::Or => self.clauses.or.push(condition),
        }
        Ok(())
    }

    fn unexpected(&self, token: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected: self.state.expects(),
            found: token.text.clone(),
            position: token.position,
        }
    }

    fn finish(mut self) -> Result<Query, ParseError> {
        if !self.state.is_terminal() {
            return Err(ParseError::UnexpectedEnd {
                expected: self.state.expects(),
            });
        }
        match self.state {
            State::WhereValueType => {
                let scalar = self
                    .pending
                    .as_mut()
                    .and_then(|pending| pending.scalar.take())
                    .ok_or(ParseError::UnexpectedEnd { expected: "a value" })?;
                self.close_condition(Operand::Scalar(scalar))?;
            }
            State::WhereBetweenValue(Bound::High) => {
                let expected = self.state.expects();
                let pending = self.pending.as_mut().ok_or(ParseError::UnexpectedEnd { expected })?;
                if pending.parenthesized {
                    return Err(ParseError::UnexpectedEnd { expected });
                }
                match (pending.low.take(), pending.scalar.take()) {
                    (Some(low), Some(high)) => self.close_condition(Operand::Range(low, high))?,
                    _ => return Err(ParseError::UnexpectedEnd { expected: "a value" }),
                }
            }
            _ => {}
        }
        self.build()
    }

    /// Qualify every column reference and fill the registry, in the order
    /// fields, WHERE operands, GROUP BY, ORDER BY.
    fn build(self) -> Result<Query, ParseError> {
        let Clauses {
            mut fields,
            tables,
            lead,
            and,
            or,
            mut group_by,
            mut order_by,
        } = self.clauses;

        let mut filter = lead.map(|lead| Filter { lead, and, or });

        let mut registry = SchemaRegistry::new();
        for table in &tables {
            registry.register_table(table)?;
        }

        let aliases: Vec<String> = fields.iter().filter_map(|f| f.alias.clone()).collect();
        let is_output_alias = |column: &ColumnRef| {
            column.qualifier.is_none() && aliases.iter().any(|a| a.eq_ignore_ascii_case(&column.name))
        };

        let mut referenced: Vec<&mut ColumnRef> = Vec::new();
        referenced.extend(fields.iter_mut().map(|f| &mut f.column));
        if let Some(filter) = filter.as_mut() {
            for condition in filter.conditions_mut() {
                referenced.push(&mut condition.left);
                if let Operand::Column(right) = &mut condition.right {
                    referenced.push(right);
                }
            }
        }
        referenced.extend(group_by.iter_mut());
        for key in &mut order_by {
            match &mut key.target {
                SortTarget::Column(column) if is_output_alias(&*column) => {}
                SortTarget::Column(column) | SortTarget::Aggregate(_, column) => {
                    referenced.push(column);
                }
            }
        }

        for column in referenced {
            qualify(column, &tables)?;
            registry.register_column(column)?;
        }

        Ok(Query {
            query_type: QueryType::Select,
            fields,
            tables,
            filter,
            group_by,
            order_by,
            registry,
        })
    }
}

/// Bind an unqualified column to the only table in FROM, and check that a
/// qualified one names a table that is there.
fn qualify(column: &mut ColumnRef, tables: &[TableRef]) -> Result<(), ParseError> {
    match column.qualifier.as_deref() {
        Some(qualifier) => {
            if !tables.iter().any(|t| t.alias == qualifier) {
                return Err(ParseError::UnknownQualifier(qualifier.to_string()));
            }
        }
        None => match tables {
            [only] => column.qualifier = Some(only.alias.clone()),
            _ => return Err(ParseError::AmbiguousColumn(column.name.clone())),
        },
    }
    Ok(())
}
