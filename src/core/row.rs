use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::{QueryError, Result, StorageError};
use super::value::Value;

/// A record addressed by column ordinal.
///
/// In the store a row is an opaque bincode buffer; the engine only touches
/// it through the typed accessors below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, ordinal: usize) -> Result<&Value> {
        self.values.get(ordinal).ok_or_else(|| {
            StorageError::OrdinalOutOfRange {
                ordinal,
                width: self.values.len(),
            }
            .into()
        })
    }

    pub fn get_int(&self, ordinal: usize) -> Result<i64> {
        match self.get(ordinal)? {
            Value::Int(i) => Ok(*i),
            Value::Str(s) => Err(QueryError::type_mismatch(
                format!("#{ordinal}"),
                format!("expected INT, found STRING '{s}'"),
            )),
        }
    }

    pub fn get_string(&self, ordinal: usize) -> Result<&str> {
        match self.get(ordinal)? {
            Value::Str(s) => Ok(s),
            Value::Int(i) => Err(QueryError::type_mismatch(
                format!("#{ordinal}"),
                format!("expected STRING, found INT {i}"),
            )),
        }
    }

    /// Builder-style setter. Writing one past the end appends.
    pub fn set(mut self, ordinal: usize, value: impl Into<Value>) -> Result<Self> {
        let width = self.values.len();
        match ordinal.cmp(&width) {
            std::cmp::Ordering::Less => self.values[ordinal] = value.into(),
            std::cmp::Ordering::Equal => self.values.push(value.into()),
            std::cmp::Ordering::Greater => {
                return Err(StorageError::OrdinalOutOfRange { ordinal, width }.into());
            }
        }
        Ok(self)
    }

    pub fn encode(&self) -> std::result::Result<Bytes, StorageError> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
