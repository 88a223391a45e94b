//! Database - table operations over the header, schema, index, and data files.

use std::fs;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::common::config::{HEADER_SIZE, MAX_RECORDS};
use crate::common::{Error, RecordId, Result, StoreConfig};
use crate::query::{Condition, QueryEngine};
use crate::storage::schema::{create_schema, load_schema};
use crate::storage::{DataFile, IndexFile, RecordCodec, Row, Schema, TableFiles, TableHeader};

use super::open_table::OpenTable;

/// Entry point for every table operation.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │                        Database                          │
/// │  create_table  insert  read_all  read_by_id  update ...  │
/// └───────┬──────────────┬──────────────┬────────────────────┘
///         │              │              │
///   ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐  ┌──────────┐
///   │  Schema   │  │ DataFile  │  │ IndexFile │  │  Record  │
///   │ T.schema  │  │  T.bin    │  │  T.idx    │  │  Codec   │
///   └───────────┘  └───────────┘  └───────────┘  └──────────┘
/// ```
///
/// # Thread Safety
/// Mutating operations take an internal lock exclusively and reads take it
/// shared, so a `Database` can be shared across threads and a read never
/// sees an insert or delete half applied. Nothing protects the files from
/// other processes.
///
/// # Consistency
/// Every operation opens the files it needs, performs its reads and writes,
/// and closes them. There is no cross-file atomicity: an I/O failure in the
/// middle of an insert or delete can leave the header, index, and data file
/// disagreeing. Inserts and deletes write the header last.
///
/// # Example
/// ```no_run
/// use flatdb::{Database, RecordId, StoreConfig};
///
/// let db = Database::new(StoreConfig::new("data"));
/// db.create_table("users", "Name:string(20), Age:int").unwrap();
///
/// let id = db.insert("users", &["'Alice'", "30"]).unwrap();
/// let row = db.read_by_id("users", id).unwrap();
/// println!("{}", row);
/// ```
pub struct Database {
    config: StoreConfig,
    /// Held exclusively by create/insert/update/delete/drop, shared by reads.
    lock: RwLock<()>,
}

impl Database {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            lock: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Table lifecycle
    // ========================================================================

    /// Create a table from a comma-separated column spec such as
    /// `"Name:string(20), Age:int"`. An `ID:int` column is prepended.
    ///
    /// Writes the schema file, then a data file holding an empty header,
    /// then an empty index. A failure after the schema is written leaves the
    /// schema file behind.
    ///
    /// # Errors
    /// - `Error::TableExists` if any of the table's files exist
    /// - schema errors if the spec doesn't parse; nothing is written then
    pub fn create_table(&self, name: &str, column_spec: &str) -> Result<Schema> {
        let _guard = self.lock.write();

        let files = TableFiles::resolve(&self.config, name)?;
        if files.any_exists() {
            return Err(Error::TableExists(name.to_string()));
        }
        fs::create_dir_all(&self.config.data_dir)?;

        let schema = create_schema(&files, column_spec, self.config.sync_writes)?;
        DataFile::create(&files, &TableHeader::new(), self.config.sync_writes)?;
        IndexFile::create(&files, self.config.sync_writes)?;

        info!(
            table = name,
            columns = schema.len(),
            record_size = schema.record_size(),
            "created table"
        );
        Ok(schema)
    }

    /// Remove all three files of a table.
    ///
    /// # Errors
    /// Returns `Error::TableNotFound` if none of the files exist.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let _guard = self.lock.write();

        let files = TableFiles::resolve(&self.config, name)?;
        if !files.any_exists() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        for path in [&files.data, &files.schema, &files.index] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }

        info!(table = name, "dropped table");
        Ok(())
    }

    /// Whether the table's data and schema files both exist.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.read();
        let files = TableFiles::resolve(&self.config, name)?;
        Ok(files.data.exists() && files.schema.exists())
    }

    /// The table's schema, `ID` first.
    pub fn schema(&self, name: &str) -> Result<Schema> {
        let _guard = self.lock.read();
        load_schema(&TableFiles::resolve(&self.config, name)?)
    }

    /// The table's header as stored (after configured verification).
    pub fn header(&self, name: &str) -> Result<TableHeader> {
        let _guard = self.lock.read();
        Ok(OpenTable::open(&self.config, name)?.header)
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// Append a record and return its assigned ID.
    ///
    /// `values` cover every column except `ID`, in schema order. The ID is
    /// the table's record count before the insert. The record is fully
    /// encoded before anything is written, so a rejected value leaves the
    /// table untouched.
    ///
    /// # Errors
    /// - `Error::TableNotFound` / `Error::SchemaNotFound` for an unknown table
    /// - value errors from [`RecordCodec::encode`]
    /// - `Error::TableFull` if the count or free offset would overflow
    pub fn insert<S: AsRef<str>>(&self, name: &str, values: &[S]) -> Result<RecordId> {
        let _guard = self.lock.write();

        let mut table = OpenTable::open(&self.config, name)?;
        let id = RecordId::new(table.num_records);
        let record_size = table.schema.record_size();

        let bytes = RecordCodec::new(&table.schema).encode(id, values)?;

        let offset = table.header.free_offset;
        let next_free = offset
            .checked_add(record_size as u32)
            .filter(|&n| n <= i32::MAX as u32 && table.num_records < MAX_RECORDS)
            .ok_or_else(|| Error::TableFull(name.to_string()))?;

        let mut index = table.index_or_create()?;
        table.data.write_at(offset as u64, &bytes)?;
        index.append(id, offset as u64)?;
        table.commit_header(table.num_records + 1, next_free)?;

        debug!(table = name, id = id.0, offset, "inserted record");
        Ok(id)
    }

    /// Every record, in data file order.
    ///
    /// Reads `num_records` consecutive records starting right after the
    /// header, without consulting the index.
    pub fn read_all(&self, name: &str) -> Result<Vec<Row>> {
        let _guard = self.lock.read();
        let mut table = OpenTable::open(&self.config, name)?;
        let record_size = table.schema.record_size() as u64;

        let mut rows = Vec::with_capacity(table.num_records as usize);
        for i in 0..table.num_records as u64 {
            let bytes = table.read_record(HEADER_SIZE as u64 + i * record_size)?;
            rows.push(RecordCodec::new(&table.schema).decode(&bytes)?);
        }
        Ok(rows)
    }

    /// The record currently holding logical ID `id`, resolved through the
    /// index.
    ///
    /// # Errors
    /// Returns `Error::RecordNotFound` if `id` is not live.
    pub fn read_by_id(&self, name: &str, id: RecordId) -> Result<Row> {
        let _guard = self.lock.read();
        let mut table = OpenTable::open(&self.config, name)?;
        table.check_live(id)?;

        let offset = table.index()?.get(id)?;
        let bytes = table.read_record(offset)?;
        RecordCodec::new(&table.schema).decode(&bytes)
    }

    /// Replace every non-`ID` column of record `id` in place.
    ///
    /// The new record is encoded into a scratch buffer and written in one
    /// write after all values validate; a rejected value changes nothing.
    /// The stored ID, the record's offset, and its size never change.
    ///
    /// # Errors
    /// - `Error::ValueCountMismatch` if `values` doesn't cover every
    ///   non-`ID` column
    /// - `Error::RecordNotFound` if `id` is not live
    /// - value errors from [`RecordCodec::encode`]
    pub fn update<S: AsRef<str>>(&self, name: &str, id: RecordId, values: &[S]) -> Result<()> {
        let _guard = self.lock.write();

        let mut table = OpenTable::open(&self.config, name)?;
        let expected = table.schema.value_count();
        if values.len() != expected {
            return Err(Error::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        table.check_live(id)?;

        let offset = table.index()?.get(id)?;
        let current = table.read_record(offset)?;

        let mut bytes = RecordCodec::new(&table.schema).encode(id, values)?;
        let id_range = table.schema.range_of(0);
        bytes[id_range.clone()].copy_from_slice(&current[id_range]);

        table.data.write_at(offset, &bytes)?;

        debug!(table = name, id = id.0, offset, "updated record");
        Ok(())
    }

    /// Delete record `id`, keeping IDs dense.
    ///
    /// The last record is copied into the deleted slot and renumbered to
    /// `id`; the last index entry is dropped, and the data file shrinks by
    /// one record. Deleting the last record only shrinks.
    ///
    /// ```text
    /// before:  [0:A] [1:B] [2:C] [3:D] [4:E]     delete 2
    /// after:   [0:A] [1:B] [2:E] [3:D]
    /// ```
    ///
    /// # Errors
    /// - `Error::InvalidId` if `id >= num_records`
    /// - `Error::CorruptIndex` if the last record is not at the end of the
    ///   data file (checked before anything is written)
    pub fn delete(&self, name: &str, id: RecordId) -> Result<()> {
        let _guard = self.lock.write();

        let mut table = OpenTable::open(&self.config, name)?;
        if id.0 >= table.num_records {
            return Err(Error::InvalidId {
                table: name.to_string(),
                id: id.0,
                num_records: table.num_records,
            });
        }

        let record_size = table.schema.record_size() as u64;
        let last = RecordId::new(table.num_records - 1);

        let mut index = table.index()?;
        let delete_offset = index.get(id)?;
        let last_offset = index.get(last)?;

        let free_offset = table.header.free_offset as u64;
        if last_offset + record_size != free_offset {
            return Err(Error::CorruptIndex {
                table: name.to_string(),
                reason: format!(
                    "last record at offset {} does not end at free offset {}",
                    last_offset, free_offset
                ),
            });
        }

        if id != last {
            let mut moved = table.read_record(last_offset)?;
            RecordCodec::new(&table.schema).write_id(&mut moved, id)?;
            table.data.write_at(delete_offset, &moved)?;
            debug!(
                table = name,
                from = last.0,
                to = id.0,
                offset = delete_offset,
                "moved last record into deleted slot"
            );
        }

        index.truncate(last.0)?;
        table.commit_header(last.0, last_offset as u32)?;
        table.data.truncate(last_offset)?;

        debug!(table = name, id = id.0, remaining = last.0, "deleted record");
        Ok(())
    }

    /// Rows of `name` matching every condition, projected to `columns`.
    ///
    /// See [`QueryEngine::scan`].
    pub fn query<S: AsRef<str>>(
        &self,
        name: &str,
        columns: &[S],
        conditions: &[Condition],
    ) -> Result<Vec<Row>> {
        let _guard = self.lock.read();
        QueryEngine::new(&self.config).scan(name, columns, conditions)
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Check every invariant tying the table's files together.
    ///
    /// Runs with header verification on regardless of configuration:
    /// - the header passes [`TableHeader::verify`]
    /// - the index has one entry per record
    /// - entry `i` is `HEADER_SIZE + i * record_size`
    /// - the record at entry `i` stores ID `i`
    pub fn check_table(&self, name: &str) -> Result<()> {
        let _guard = self.lock.read();
        let mut table = OpenTable::open_with(&self.config, name, true)?;
        let offsets = table.index()?.entries()?;
        let record_size = table.schema.record_size() as u64;

        for (i, &offset) in offsets.iter().enumerate() {
            let expected = HEADER_SIZE as u64 + i as u64 * record_size;
            if offset != expected {
                return Err(Error::CorruptIndex {
                    table: name.to_string(),
                    reason: format!(
                        "entry {} points at {}, expected {}",
                        i, offset, expected
                    ),
                });
            }

            let bytes = table.read_record(offset)?;
            let stored = RecordCodec::new(&table.schema).decode(&bytes)?.id();
            if stored != Some(RecordId::new(i as u32)) {
                return Err(Error::CorruptIndex {
                    table: name.to_string(),
                    reason: format!("record at entry {} stores ID {:?}", i, stored),
                });
            }
        }
        Ok(())
    }
}
