//! flatdb - a single-file-per-table record store.
//!
//! Each table is three files: a data file of fixed-width records behind a
//! 60-byte header, a text schema, and a dense offset index.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            flatdb                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │   Table Layer (table/)   │   │   Query Layer (query/)   │   │
//! │  │  Database: create/insert │   │  QueryEngine: scan with  │   │
//! │  │  read/update/delete      │   │  conditions + projection │   │
//! │  └────────────┬─────────────┘   └────────────┬─────────────┘   │
//! │               └──────────────┬───────────────┘                 │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │  TableHeader + DataFile    T.bin   header + records      │   │
//! │  │  Schema                    T.schema  column layout       │   │
//! │  │  IndexFile                 T.idx   ID → byte offset      │   │
//! │  │  RecordCodec               fixed-width row encoding      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (RecordId, Error, config)
//! - [`storage`] - File formats and record encoding
//! - [`table`] - Table operations
//! - [`query`] - Filtered scans
//!
//! # Quick Start
//! ```no_run
//! use flatdb::{CompareOp, Condition, Database, RecordId, StoreConfig};
//!
//! let db = Database::new(StoreConfig::new("data"));
//! db.create_table("users", "Name:string(20), Age:int").unwrap();
//!
//! db.insert("users", &["'Alice'", "30"]).unwrap();
//! db.insert("users", &["'Bob'", "25"]).unwrap();
//!
//! let adults = db
//!     .query("users", &["Name"], &[Condition::new("Age", CompareOp::Gt, 26)])
//!     .unwrap();
//! assert_eq!(adults.len(), 1);
//!
//! db.delete("users", RecordId::new(0)).unwrap();
//! ```

pub mod common;
pub mod query;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::config::{HEADER_SIZE, ID_COLUMN};
pub use common::{Error, RecordId, Result, StoreConfig};

pub use query::{CompareOp, Condition, QueryEngine};
pub use storage::{ColumnInfo, ColumnType, RecordCodec, Row, Schema, TableHeader, Value};
pub use table::Database;
