/// Executor module - runs a bound query against a storage collaborator
///
/// Structure:
/// - conditions: WHERE clause evaluation
/// - scan: per-table range scans with predicate pushdown
/// - join: nested-loop joins over the scanned relations
/// - aggregate: GROUP BY and SUM/AVG
/// - sort: ORDER BY
/// - projector: SELECT list → result set
/// - session: the whole pipeline behind one `execute` call

pub mod conditions;
pub mod scan;
pub mod join;
pub mod aggregate;
pub mod sort;
pub mod projector;
pub mod session;

pub use conditions::ConditionEvaluator;
pub use scan::ScanExecutor;
pub use join::JoinExecutor;
pub use aggregate::AggregateExecutor;
pub use sort::SortExecutor;
pub use projector::{Projector, ResultSet};
pub use session::Session;

use crate::core::{Row, Schema};

/// An intermediate result: rows plus the schema that names their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Relation {
    #[must_use]
    pub const fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
