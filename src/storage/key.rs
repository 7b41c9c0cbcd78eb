/// Packed 64-bit storage keys.
///
/// The high 4 bits hold the table tag, the low 60 bits the primary key, so
/// each table owns one contiguous slice of the key space and a table scan is
/// a plain forward range scan.
use crate::core::{Result, StorageError};

pub const TAG_BITS: u32 = 4;
pub const PRIMARY_KEY_BITS: u32 = 64 - TAG_BITS;
pub const MAX_TABLE_TAG: u8 = (1 << TAG_BITS) - 1;
pub const PRIMARY_KEY_MASK: u64 = (1 << PRIMARY_KEY_BITS) - 1;

pub fn make_key(table_tag: u8, primary_key: u64) -> Result<u64> {
    if table_tag > MAX_TABLE_TAG {
        return Err(StorageError::TagOutOfRange(table_tag).into());
    }
    if primary_key > PRIMARY_KEY_MASK {
        return Err(StorageError::KeyOutOfRange(primary_key).into());
    }
    Ok((u64::from(table_tag) << PRIMARY_KEY_BITS) | primary_key)
}

/// Inverse of `make_key`: `(table_tag, primary_key)`.
#[must_use]
pub const fn split_key(key: u64) -> (u8, u64) {
    ((key >> PRIMARY_KEY_BITS) as u8, key & PRIMARY_KEY_MASK)
}

/// Half-open range of packed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub start: u64,
    pub end: u64,
}

impl KeyRange {
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, key: u64) -> bool {
        self.start <= key && key < self.end
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The part of this range strictly after `key`.
    #[must_use]
    pub const fn after(&self, key: u64) -> Self {
        Self {
            start: key.saturating_add(1),
            end: self.end,
        }
    }
}
