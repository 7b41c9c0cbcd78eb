use serde::{Deserialize, Serialize};
use super::data_type::DataType;

/// Name of the bookkeeping column that tags every stored row with its table.
pub const TABLE_TAG_COLUMN: &str = "TABLE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    /// Table alias the column came from; `None` for catalog and synthetic columns.
    pub qualifier: Option<String>,
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
            data_type,
        }
    }

    #[must_use]
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            data_type,
        }
    }

    #[must_use]
    pub fn is_table_tag(&self) -> bool {
        self.name.eq_ignore_ascii_case(TABLE_TAG_COLUMN)
    }

    /// `l_ORDERKEY` for qualified columns, the bare name otherwise.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{q}_{}", self.name),
            None => self.name.clone(),
        }
    }

    pub(crate) fn matches(&self, qualifier: Option<&str>, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && match (qualifier, self.qualifier.as_deref()) {
                (Some(wanted), Some(own)) => wanted == own,
                _ => true,
            }
    }

    pub(crate) fn matches_exactly(&self, qualifier: Option<&str>, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.qualifier.as_deref() == qualifier
    }
}
