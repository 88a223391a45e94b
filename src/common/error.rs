//! Error types for flatdb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in flatdb.
///
/// Every failure is local to the operation that detects it. Variants carry
/// the table, record ID, or column needed to act on the failure.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ------------------------------------------------------------------
    // Not found
    // ------------------------------------------------------------------
    /// The table's data file does not exist.
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// The table's schema file does not exist.
    #[error("Schema for table '{0}' not found")]
    SchemaNotFound(String),

    /// The table's index file does not exist.
    #[error("Index for table '{0}' not found")]
    IndexNotFound(String),

    /// No record currently holds this logical ID.
    #[error("Record {id} not found in table '{table}'")]
    RecordNotFound { table: String, id: u32 },

    /// A referenced column is not part of the table's schema.
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    // ------------------------------------------------------------------
    // Schema errors
    // ------------------------------------------------------------------
    /// A schema line could not be parsed.
    #[error("Invalid schema line '{line}': {reason}")]
    InvalidSchema { line: String, reason: String },

    /// A schema line names a type with no reader/writer.
    #[error("Unknown type '{type_name}' for column '{column}'")]
    UnknownColumnType { column: String, type_name: String },

    /// Two columns share a name.
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A table name that cannot be used as a file stem.
    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),

    /// Table creation would overwrite an existing table.
    #[error("Table '{0}' already exists")]
    TableExists(String),

    // ------------------------------------------------------------------
    // Value errors
    // ------------------------------------------------------------------
    /// A value could not be converted to its column's type.
    #[error("Invalid value '{value}' for column '{column}': expected {expected}")]
    InvalidValue {
        column: String,
        value: String,
        expected: &'static str,
    },

    /// A string value exceeds its column's declared size.
    #[error("Value for column '{column}' is {len} bytes, exceeds maximum of {max}")]
    ValueTooLong {
        column: String,
        len: usize,
        max: usize,
    },

    /// Wrong number of values for the table's non-ID columns.
    #[error("Expected {expected} values, but got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    /// A record ID outside `0..num_records`.
    #[error("Invalid record ID {id} for table '{table}' with {num_records} records")]
    InvalidId {
        table: String,
        id: u32,
        num_records: u32,
    },

    /// A comparison operator other than `= == != <> < <= > >=`.
    #[error("Invalid comparison operator '{0}'")]
    InvalidOperator(String),

    /// The table cannot hold another record.
    #[error("Table '{0}' is full")]
    TableFull(String),

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------
    /// The data file header is short or fails validation.
    #[error("Corrupt header in table '{table}': {reason}")]
    CorruptHeader { table: String, reason: String },

    /// The index file disagrees with the header or data file.
    #[error("Corrupt index in table '{table}': {reason}")]
    CorruptIndex { table: String, reason: String },
}

impl Error {
    /// Whether this error reports something absent (table, record, column).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TableNotFound(_)
                | Error::SchemaNotFound(_)
                | Error::IndexNotFound(_)
                | Error::RecordNotFound { .. }
                | Error::ColumnNotFound { .. }
        )
    }
}
