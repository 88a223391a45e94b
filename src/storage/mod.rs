//! Storage layer - the three files behind every table.
//!
//! This module handles persistent storage:
//! - [`TableFiles`] - Where a table's files live
//! - [`TableHeader`] / [`DataFile`] - The data file and its header
//! - [`IndexFile`] - Logical ID to byte offset map
//! - [`schema`] - Column definitions and record layout
//! - [`record`] - Fixed-width record encoding

mod data_file;
mod header;
mod index_file;
pub mod record;
pub mod schema;
mod table_files;

pub use data_file::DataFile;
pub use header::TableHeader;
pub use index_file::IndexFile;
pub use record::{RecordCodec, Row, Value};
pub use schema::{ColumnInfo, ColumnType, Schema};
pub use table_files::TableFiles;
