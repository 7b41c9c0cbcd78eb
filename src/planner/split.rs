/// Query splitting: one single-table scan per table alias.
use std::collections::BTreeMap;

use crate::parser::{ColumnRef, Condition, Filter, Query, SelectField};

/// Derive one single-table query per alias.
///
/// Each sub-query selects every column registered for its alias and carries
/// the non-join conditions whose left operand belongs to that alias, keeping
/// their lead / AND / OR placement. When the lead went elsewhere the first AND
/// condition takes its place; with no lead and no AND condition the filter is
/// always true (`true OR ...`) and is dropped.
#[must_use]
pub fn split_query(query: &Query) -> BTreeMap<String, Query> {
    let mut scans = BTreeMap::new();
    for alias in query.registry.aliases() {
        let Some(table) = query.table(alias) else {
            continue;
        };
        let fields = query
            .registry
            .columns(alias)
            .iter()
            .map(|name| SelectField::column(ColumnRef::qualified(alias, name.clone())))
            .collect();
        let sub_query = Query {
            query_type: query.query_type,
            fields,
            tables: vec![table.clone()],
            filter: query.filter.as_ref().and_then(|filter| push_down(filter, alias)),
            group_by: Vec::new(),
            order_by: Vec::new(),
            registry: query.registry.only(alias),
        };
        log::debug!("scan for '{alias}': {sub_query}");
        scans.insert(alias.to_string(), sub_query);
    }
    scans
}

fn push_down(filter: &Filter, alias: &str) -> Option<Filter> {
    let local = |condition: &&Condition| {
        !condition.is_join() && condition.left.qualifier.as_deref() == Some(alias)
    };
    let lead = Some(&filter.lead).filter(local).cloned();
    let mut and: Vec<Condition> = filter.and.iter().filter(local).cloned().collect();
    let or: Vec<Condition> = filter.or.iter().filter(local).cloned().collect();

    let lead = match lead {
        Some(lead) => lead,
        None if !and.is_empty() => and.remove(0),
        None => return None,
    };
    Some(Filter { lead, and, or })
}
