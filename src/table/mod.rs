//! Table layer - operations that keep a table's files consistent.
//!
//! - [`Database`] - create/insert/read/update/delete/query entry point
//! - `OpenTable` - the files, schema, and header one operation works on

mod database;
mod open_table;

pub use database::Database;
pub(crate) use open_table::OpenTable;
