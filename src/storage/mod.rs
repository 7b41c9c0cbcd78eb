// Storage layer - packed keys, scan interface, in-memory store

pub mod key;
mod memory;
pub mod loader;

pub use key::{make_key, split_key, KeyRange};
pub use memory::MemoryStore;

use crate::core::{Result, Row};

/// One step of a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Row { key: u64, row: Row },
    /// The range is exhausted. A scan that stops without this marker was
    /// truncated and has to be resumed after the last key it delivered.
    End,
}

/// Key-value store the engine reads from.
///
/// Implementations deliver rows in ascending key order. They may stop a scan
/// early (without `ScanItem::End`); callers resume with `KeyRange::after`.
pub trait Storage {
    fn scan(&self, range: KeyRange) -> Box<dyn Iterator<Item = Result<ScanItem>> + '_>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn scan(&self, range: KeyRange) -> Box<dyn Iterator<Item = Result<ScanItem>> + '_> {
        (**self).scan(range)
    }
}
