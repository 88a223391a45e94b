//! Data file - header and fixed-width record I/O for one table.
//!
//! The [`DataFile`] handles all direct operations on `T.bin`:
//! - Reading and writing the table header
//! - Reading and writing records at byte offsets
//! - Truncating the file after a delete

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::common::config::HEADER_SIZE;
use crate::common::{Error, Result};
use crate::storage::header::TableHeader;
use crate::storage::table_files::TableFiles;

/// An open handle on a table's data file.
///
/// # File Layout
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────┬──────────┐
/// │  Header  │ Record 0 │ Record 1 │   ...   │ Record N │
/// │ (60 B)   │ (R B)    │ (R B)    │         │ (R B)    │
/// └──────────┴──────────┴──────────┴─────────┴──────────┘
/// Offset:  0        60       60+R      ...     60+N×R
/// ```
///
/// Record offsets come from the index; the data file itself knows nothing
/// about record boundaries.
///
/// # Ownership
/// A `DataFile` is opened by one operation and dropped when that operation
/// returns, on success or error. Handles are never shared between calls.
///
/// # Durability
/// With `sync` set, every write is followed by `fsync()`.
pub struct DataFile {
    file: File,
    table: String,
    sync: bool,
}

impl DataFile {
    /// Create a new data file containing only `header`.
    ///
    /// # Errors
    /// Returns `Error::TableExists` if the file already exists.
    pub fn create(files: &TableFiles, header: &TableHeader, sync: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&files.data)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::TableExists(files.table.clone()),
                _ => Error::Io(e),
            })?;

        let mut data_file = Self {
            file,
            table: files.table.clone(),
            sync,
        };
        data_file.write_header(header)?;
        Ok(data_file)
    }

    /// Open an existing data file.
    ///
    /// # Errors
    /// Returns `Error::TableNotFound` if the file doesn't exist.
    pub fn open(files: &TableFiles, sync: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&files.data)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::TableNotFound(files.table.clone()),
                _ => Error::Io(e),
            })?;

        Ok(Self {
            file,
            table: files.table.clone(),
            sync,
        })
    }

    /// Write `header` to an existing data file, or create the file with
    /// only the header if it doesn't exist.
    ///
    /// An existing file keeps every byte past the header.
    pub fn write_header_to(files: &TableFiles, header: &TableHeader, sync: bool) -> Result<()> {
        if files.data.exists() {
            Self::open(files, sync)?.write_header(header)
        } else {
            Self::create(files, header, sync).map(|_| ())
        }
    }

    /// Read the header.
    ///
    /// The header is returned as stored; see [`TableHeader::verify`].
    ///
    /// # Errors
    /// Returns `Error::CorruptHeader` if the file is shorter than the header.
    pub fn read_header(&mut self) -> Result<TableHeader> {
        let mut buf = [0u8; HEADER_SIZE];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::CorruptHeader {
                table: self.table.clone(),
                reason: format!("file is shorter than the {}-byte header", HEADER_SIZE),
            },
            _ => Error::Io(e),
        })?;

        Ok(TableHeader::from_bytes(&buf))
    }

    /// Overwrite the first `HEADER_SIZE` bytes with `header`.
    pub fn write_header(&mut self, header: &TableHeader) -> Result<()> {
        self.write_at(0, &header.to_bytes())
    }

    /// Fill `buf` from `offset`.
    ///
    /// # Errors
    /// Returns `Error::Io` with `UnexpectedEof` if the file ends first.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Read `len` bytes starting at `offset`.
    pub fn read_vec(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Write all of `bytes` at `offset`, extending the file if needed.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Cut the file to `len` bytes.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Current size of the file in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
