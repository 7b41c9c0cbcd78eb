/// In-memory key-value store
///
/// Reference implementation of the `Storage` collaborator: an ordered map of
/// packed keys to bincode-encoded rows. A scan span can be configured to
/// mimic stores that cut long scans short; the executor then has to resume.
use std::collections::btree_map;
use std::collections::BTreeMap;

use bytes::Bytes;

use super::key::{make_key, KeyRange};
use super::{ScanItem, Storage};
use crate::core::{Result, Row};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<u64, Bytes>,
    /// Maximum number of rows delivered by one scan call; `None` = unbounded.
    scan_span: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every scan to `span` rows (at least one).
    #[must_use]
    pub fn with_scan_span(mut self, span: usize) -> Self {
        self.scan_span = Some(span.max(1));
        self
    }

    #[must_use]
    pub const fn scan_span(&self) -> Option<usize> {
        self.scan_span
    }

    pub fn insert(&mut self, key: u64, row: &Row) -> Result<()> {
        self.entries.insert(key, row.encode()?);
        Ok(())
    }

    /// Store `row` under `(table_tag, primary_key)`.
    pub fn put(&mut self, table_tag: u8, primary_key: u64, row: &Row) -> Result<()> {
        let key = make_key(table_tag, primary_key)?;
        self.insert(key, row)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStore {
    fn scan(&self, range: KeyRange) -> Box<dyn Iterator<Item = Result<ScanItem>> + '_> {
        let inner = if range.is_empty() {
            // BTreeMap::range panics on start > end
            self.entries.range(0..0)
        } else {
            self.entries.range(range.start..range.end)
        };
        Box::new(MemoryScan {
            inner,
            remaining: self.scan_span,
            finished: false,
        })
    }
}

struct MemoryScan<'a> {
    inner: btree_map::Range<'a, u64, Bytes>,
    remaining: Option<usize>,
    finished: bool,
}

impl Iterator for MemoryScan<'_> {
    type Item = Result<ScanItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.remaining == Some(0) {
            // span exhausted: stop without an end marker
            self.finished = true;
            return None;
        }
        match self.inner.next() {
            Some((key, bytes)) => {
                if let Some(left) = self.remaining.as_mut() {
                    *left -= 1;
                }
                Some(
                    Row::decode(bytes)
                        .map(|row| ScanItem::Row { key: *key, row })
                        .map_err(Into::into),
                )
            }
            None => {
                self.finished = true;
                Some(Ok(ScanItem::End))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for pk in 0..5 {
            store.put(0, pk, &Row::new(vec![Value::from("lineitem"), Value::Int(pk as i64)])).unwrap();
        }
        store.put(1, 0, &Row::new(vec![Value::from("orders")])).unwrap();
        store
    }

    fn collect(items: impl Iterator<Item = Result<ScanItem>>) -> (Vec<u64>, bool) {
        let mut keys = Vec::new();
        let mut ended = false;
        for item in items {
            match item.unwrap() {
                ScanItem::Row { key, .. } => keys.push(key),
                ScanItem::End => ended = true,
            }
        }
        (keys, ended)
    }

    #[test]
    fn test_scan_stays_in_range() {
        let store = store();
        let range = KeyRange::new(make_key(0, 1).unwrap(), make_key(0, 4).unwrap());
        let (keys, ended) = collect(store.scan(range));
        assert_eq!(keys.len(), 3);
        assert!(ended);
    }

    #[test]
    fn test_scan_span_truncates_without_end() {
        let store = store().with_scan_span(2);
        let range = KeyRange::new(make_key(0, 0).unwrap(), make_key(1, 0).unwrap());
        let (keys, ended) = collect(store.scan(range));
        assert_eq!(keys.len(), 2);
        assert!(!ended);

        let (rest, ended) = collect(store.scan(range.after(keys[1])));
        assert_eq!(rest.len(), 2);
        assert!(!ended);
    }

    #[test]
    fn test_empty_range_ends_immediately() {
        let store = store();
        let (keys, ended) = collect(store.scan(KeyRange::new(10, 5)));
        assert!(keys.is_empty());
        assert!(ended);
    }
}
