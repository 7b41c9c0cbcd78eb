use std::ops::Range;

use super::column::{Column, TABLE_TAG_COLUMN};
use super::data_type::DataType;
use super::error::{Result, StorageError};
use super::schema::Schema;
use crate::storage::key::{make_key, KeyRange, MAX_TABLE_TAG};

/// A stored table: its columns plus the slice of the key space it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// Discriminant packed into the high bits of every key of this table.
    pub tag: u8,
    /// Primary keys owned by the table, end exclusive.
    pub key_range: Range<u64>,
    schema: Schema,
}

impl TableSchema {
    /// Declare a table. The `TABLE` tag column is always ordinal 0, the given
    /// columns follow in order.
    pub fn new(
        name: impl Into<String>,
        tag: u8,
        key_range: Range<u64>,
        columns: &[(&str, DataType)],
    ) -> Result<Self> {
        if tag > MAX_TABLE_TAG {
            return Err(StorageError::TagOutOfRange(tag).into());
        }
        let mut builder = Schema::builder().with(Column::new(TABLE_TAG_COLUMN, DataType::String));
        for (column, data_type) in columns {
            builder.push(Column::new(column.to_ascii_uppercase(), *data_type));
        }
        Ok(Self {
            name: name.into(),
            tag,
            key_range,
            schema: builder.build(),
        })
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column(&self, name: &str) -> Result<(usize, DataType)> {
        self.schema.lookup(None, name)
    }

    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.schema.resolve(None, name)
    }

    /// Full key range of the table, as packed storage keys.
    pub fn keys(&self) -> Result<KeyRange> {
        Ok(KeyRange::new(
            make_key(self.tag, self.key_range.start)?,
            make_key(self.tag, self.key_range.end)?,
        ))
    }
}
