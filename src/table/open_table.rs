//! Per-operation view of a table: schema, header, and data file handle.

use crate::common::{Error, RecordId, Result, StoreConfig};
use crate::storage::{DataFile, IndexFile, Schema, TableFiles, TableHeader};
use crate::storage::schema::load_schema;

/// Everything an operation needs to touch one table.
///
/// Opened at the start of an operation and dropped at its end, which
/// releases the data file handle on every exit path.
pub(crate) struct OpenTable {
    pub files: TableFiles,
    pub schema: Schema,
    pub header: TableHeader,
    /// `header.num_records`, checked non-negative.
    pub num_records: u32,
    pub data: DataFile,
    sync: bool,
    verify: bool,
}

impl OpenTable {
    /// Open `table` using the configured header verification.
    pub fn open(config: &StoreConfig, table: &str) -> Result<Self> {
        Self::open_with(config, table, config.verify_headers)
    }

    /// Open `table`, validating the header when `verify` is set.
    ///
    /// # Errors
    /// - `Error::TableNotFound` if the data file is missing
    /// - `Error::SchemaNotFound` if the schema file is missing
    /// - `Error::CorruptHeader` if the header is short, has a negative
    ///   count, or (with `verify`) fails [`TableHeader::verify`]
    pub fn open_with(config: &StoreConfig, table: &str, verify: bool) -> Result<Self> {
        let files = TableFiles::resolve(config, table)?;
        let mut data = DataFile::open(&files, config.sync_writes)?;
        let schema = load_schema(&files)?;
        let header = data.read_header()?;

        if verify {
            header.verify(&files.table, schema.record_size())?;
        }
        let num_records = header.record_count().ok_or_else(|| Error::CorruptHeader {
            table: files.table.clone(),
            reason: format!("negative record count {}", header.num_records),
        })?;

        Ok(Self {
            files,
            schema,
            header,
            num_records,
            data,
            sync: config.sync_writes,
            verify,
        })
    }

    /// Open the index file, checking its length against the header.
    pub fn index(&self) -> Result<IndexFile> {
        let index = IndexFile::open(&self.files, self.sync)?;
        self.check_index_len(&index)?;
        Ok(index)
    }

    /// Like [`OpenTable::index`], creating an empty index on first use.
    pub fn index_or_create(&self) -> Result<IndexFile> {
        let index = IndexFile::open_or_create(&self.files, self.sync)?;
        self.check_index_len(&index)?;
        Ok(index)
    }

    fn check_index_len(&self, index: &IndexFile) -> Result<()> {
        if !self.verify {
            return Ok(());
        }
        let len = index.len()?;
        if len != self.num_records {
            return Err(Error::CorruptIndex {
                table: self.files.table.clone(),
                reason: format!(
                    "{} entries for {} records",
                    len, self.num_records
                ),
            });
        }
        Ok(())
    }

    /// Fail with `RecordNotFound` unless `id` is a live logical ID.
    pub fn check_live(&self, id: RecordId) -> Result<()> {
        if id.0 < self.num_records {
            Ok(())
        } else {
            Err(Error::RecordNotFound {
                table: self.files.table.clone(),
                id: id.0,
            })
        }
    }

    /// Read the record starting at `offset`.
    pub fn read_record(&mut self, offset: u64) -> Result<Vec<u8>> {
        self.data.read_vec(offset, self.schema.record_size())
    }

    /// Set the record count and free offset, then write the header.
    pub fn commit_header(&mut self, num_records: u32, free_offset: u32) -> Result<()> {
        self.header.set_record_count(&self.files.table, num_records)?;
        self.header.free_offset = free_offset;
        self.data.write_header(&self.header)?;
        self.num_records = num_records;
        Ok(())
    }
}
