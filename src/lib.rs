// kvquery - embedded analytic SELECT engine over an ordered key-value store
// Parse → bind → split per table → scan → join → aggregate → sort → project

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::format_push_string)]
#![allow(clippy::wildcard_enum_match_arm)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Values, rows, schemas, catalog, errors
pub mod core;

// Tokenizer and SELECT state machine
pub mod parser;

// Catalog binding and per-table query splitting
pub mod planner;

// Scan, join, aggregate, sort and projection stages
pub mod executor;

// Key encoding, storage trait, in-memory store and sample data
pub mod storage;

// Layered engine configuration
pub mod config;

// Re-export commonly used types for convenience
pub use crate::config::EngineConfig;
pub use crate::core::{Catalog, Column, DataType, ParseError, QueryError, Result, Row, Schema, StorageError, TableSchema, Value};
pub use executor::{ResultSet, Session};
pub use parser::{parse_query, Query};
pub use storage::{loader::load_sample, MemoryStore, ScanItem, Storage};
