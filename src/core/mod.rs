// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod column;
pub mod schema;
pub mod row;
pub mod table;
pub mod catalog;

// Re-exports for convenience
pub use error::{ParseError, QueryError, Result, StorageError};
pub use value::Value;
pub use data_type::DataType;
pub use column::{Column, TABLE_TAG_COLUMN};
pub use schema::{Schema, SchemaBuilder};
pub use row::Row;
pub use table::TableSchema;
pub use catalog::Catalog;
