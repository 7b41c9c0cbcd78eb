/// Query session - the full pipeline behind one SQL string
///
/// parse → bind → split per table → scan → join → aggregate → sort → project
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{AggregateExecutor, JoinExecutor, Projector, ResultSet, ScanExecutor, SortExecutor};
use crate::core::{Catalog, Result};
use crate::parser::{parse_query, Query};
use crate::planner::{bind, split_query};
use crate::storage::Storage;

pub struct Session<'a, S: Storage + ?Sized> {
    catalog: &'a Catalog,
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> Session<'a, S> {
    pub const fn new(catalog: &'a Catalog, storage: &'a S) -> Self {
        Self { catalog, storage }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Parse and run one SELECT statement.
    pub fn execute(&self, sql: &str) -> Result<ResultSet> {
        let query = parse_query(sql)?;
        self.run(&query)
    }

    /// Run an already parsed query.
    pub fn run(&self, query: &Query) -> Result<ResultSet> {
        bind(query, self.catalog)?;

        let mut relations = BTreeMap::new();
        for (alias, scan) in split_query(query) {
            let table = self.catalog.table(&scan.tables[0].name)?;
            let relation = ScanExecutor::execute(self.storage, table, &alias, &scan)?;
            relations.insert(alias, relation);
        }

        let joined = JoinExecutor::execute(relations, &query.join_conditions())?;
        let mut relation = if AggregateExecutor::applies(query) {
            AggregateExecutor::execute(joined, query)?
        } else {
            joined
        };
        SortExecutor::execute(&mut relation, &query.order_by, &query.fields)?;

        let result = Projector::project(&relation, &query.fields)?;
        log::info!("query returned {} row(s)", result.len());
        Ok(result)
    }

    /// The parsed query and the single-table scans it splits into, without
    /// touching storage.
    pub fn explain(&self, sql: &str) -> Result<String> {
        let query = parse_query(sql)?;
        bind(&query, self.catalog)?;

        let mut out = query.describe();
        for (alias, scan) in split_query(&query) {
            let _ = writeln!(out, "scan {alias}: {scan}");
        }
        for condition in query.join_conditions() {
            let _ = writeln!(out, "join: {condition}");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ParseError, QueryError, Value};
    use crate::storage::loader::load_sample;

    #[test]
    fn test_execute_simple_select() {
        let (catalog, store) = load_sample(30, 10).unwrap();
        let session = Session::new(&catalog, &store);
        let result = session
            .execute("SELECT l_LINENUMBER FROM lineitem WHERE l_SHIPMODE = 'MAIL' ORDER BY l_LINENUMBER DESC")
            .unwrap();
        assert_eq!(result.columns, vec!["LINENUMBER"]);
        assert_eq!(result.len(), 10);
        assert_eq!(result.rows[0], vec![Value::Int(28)]);
        assert_eq!(result.rows[9], vec![Value::Int(1)]);
    }

    #[test]
    fn test_execute_parse_error() {
        let (catalog, store) = load_sample(3, 1).unwrap();
        let session = Session::new(&catalog, &store);
        assert!(matches!(
            session.execute("   "),
            Err(QueryError::Parse(ParseError::Empty))
        ));
    }

    #[test]
    fn test_explain_lists_scans() {
        let (catalog, store) = load_sample(3, 1).unwrap();
        let session = Session::new(&catalog, &store);
        let plan = session
            .explain("SELECT l_TAX , o_ORDERDATE FROM lineitem , orders WHERE l_ORDERKEY = o_ORDERKEY AND l_TAX > 100")
            .unwrap();
        assert!(plan.contains("scan l: "));
        assert!(plan.contains("scan o: "));
        assert!(plan.contains("join: l_ORDERKEY = o_ORDERKEY"));
    }
}
