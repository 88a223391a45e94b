//! Configuration for flatdb.
//!
//! The on-disk layout constants are compiled in; everything that depends on
//! the deployment (where tables live, file extensions, durability) is carried
//! by a [`StoreConfig`] value handed to the [`Database`](crate::Database).

use std::path::{Path, PathBuf};

/// Size of the table header at the start of every data file.
///
/// # Layout (60 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic ("SDB1")
/// 4       4     num_records (i32, little-endian)
/// 8       4     free_offset (u32, little-endian)
/// 12      4     checksum (CRC32 of bytes 0..12, little-endian)
/// 16      44    reserved (zero)
/// ```
pub const HEADER_SIZE: usize = 60;

/// Size of one index entry (an `i32` byte offset).
pub const INDEX_ENTRY_SIZE: usize = 4;

/// Name of the implicit first column of every table.
pub const ID_COLUMN: &str = "ID";

/// Magic tag written at the start of every data file.
pub const MAGIC: [u8; 4] = *b"SDB1";

/// Default extension of the data file (`T.bin`).
pub const DATA_FILE_EXTENSION: &str = "bin";

/// Default extension of the schema file (`T.schema`).
pub const SCHEMA_FILE_EXTENSION: &str = "schema";

/// Default extension of the index file (`T.idx`).
pub const INDEX_FILE_EXTENSION: &str = "idx";

/// Largest number of records a table can hold (the count is stored as `i32`).
pub const MAX_RECORDS: u32 = i32::MAX as u32;

/// Options for a [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding every table's files.
    pub data_dir: PathBuf,

    /// Extension of data files.
    pub data_extension: String,

    /// Extension of schema files.
    pub schema_extension: String,

    /// Extension of index files.
    pub index_extension: String,

    /// Whether every mutating write is followed by `fsync()`.
    pub sync_writes: bool,

    /// Whether headers and index lengths are validated when a table is opened.
    pub verify_headers: bool,
}

impl StoreConfig {
    /// Configuration rooted at `data_dir` with the default extensions.
    ///
    /// Writes are synced and headers verified.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            data_extension: DATA_FILE_EXTENSION.to_string(),
            schema_extension: SCHEMA_FILE_EXTENSION.to_string(),
            index_extension: INDEX_FILE_EXTENSION.to_string(),
            sync_writes: true,
            verify_headers: true,
        }
    }

    /// Configuration for tests: same layout, no `fsync()`.
    pub fn default_for_test<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            sync_writes: false,
            ..Self::new(data_dir)
        }
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn with_header_verification(mut self, verify_headers: bool) -> Self {
        self.verify_headers = verify_headers;
        self
    }

    /// Override the three file extensions (given without the leading dot).
    pub fn with_extensions(mut self, data: &str, schema: &str, index: &str) -> Self {
        self.data_extension = data.to_string();
        self.schema_extension = schema.to_string();
        self.index_extension = index.to_string();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("data")
    }
}
