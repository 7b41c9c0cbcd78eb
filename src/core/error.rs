use thiserror::Error;

/// Errors raised while turning query text into a `Query`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty query")]
    Empty,
    #[error("Unexpected token '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
    #[error("Unexpected end of query, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("Unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
    #[error("Invalid literal '{0}'")]
    InvalidLiteral(String),
    #[error("Invalid LIKE pattern '{pattern}': {reason}")]
    InvalidLikePattern { pattern: String, reason: String },
    #[error("Tables '{first}' and '{second}' share the alias '{alias}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
    #[error("Column '{0}' is ambiguous, qualify it with a table alias")]
    AmbiguousColumn(String),
    #[error("Alias '{0}' does not name a table in FROM")]
    UnknownQualifier(String),
}

/// Errors raised by the storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Row codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("Scan stalled at key {0:#x}: truncated without progress")]
    ScanStalled(u64),
    #[error("Table tag {0} does not fit in 4 bits")]
    TagOutOfRange(u8),
    #[error("Primary key {0} does not fit in 60 bits")]
    KeyOutOfRange(u64),
    #[error("Ordinal {ordinal} out of range for a row of {width} columns")]
    OrdinalOutOfRange { ordinal: usize, width: usize },
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Table '{0}' not found")]
    UnknownTable(String),
    #[error("Column '{0}' not found")]
    UnknownColumn(String),
    #[error("Type mismatch on '{column}': {reason}")]
    TypeMismatch { column: String, reason: String },
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),
    #[error("Division by zero in '{0}'")]
    DivisionByZero(String),
    #[error("Arithmetic overflow in '{0}'")]
    ArithmeticOverflow(String),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),
    #[error("Table tag {tag} already used by '{table}'")]
    TagAlreadyUsed { tag: u8, table: String },
    #[error("Output column '{0}' is produced by two different aggregates")]
    DuplicateOutputColumn(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    pub(crate) fn type_mismatch(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
