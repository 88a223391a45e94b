//! Index file - dense map from logical record ID to data file offset.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::common::config::INDEX_ENTRY_SIZE;
use crate::common::{Error, RecordId, Result};
use crate::storage::table_files::TableFiles;

/// An open handle on a table's index file.
///
/// # File Layout
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────┐
/// │ offset 0 │ offset 1 │ offset 2 │   ...   │
/// │ (i32 LE) │ (i32 LE) │ (i32 LE) │         │
/// └──────────┴──────────┴──────────┴─────────┘
/// Entry for ID `i` lives at byte `i × 4`.
/// ```
///
/// Offsets are absolute positions in the data file (they already include
/// the header). The file holds exactly one entry per live record.
pub struct IndexFile {
    file: File,
    table: String,
    sync: bool,
}

impl IndexFile {
    /// Create an empty index file, replacing any existing one.
    pub fn create(files: &TableFiles, sync: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&files.index)?;

        Ok(Self::wrap(file, files, sync))
    }

    /// Open an existing index file.
    ///
    /// # Errors
    /// Returns `Error::IndexNotFound` if the file doesn't exist.
    pub fn open(files: &TableFiles, sync: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&files.index)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::IndexNotFound(files.table.clone()),
                _ => Error::Io(e),
            })?;

        Ok(Self::wrap(file, files, sync))
    }

    /// Open the index file, creating an empty one on first use.
    pub fn open_or_create(files: &TableFiles, sync: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&files.index)?;

        Ok(Self::wrap(file, files, sync))
    }

    fn wrap(file: File, files: &TableFiles, sync: bool) -> Self {
        Self {
            file,
            table: files.table.clone(),
            sync,
        }
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptIndex {
            table: self.table.clone(),
            reason,
        }
    }

    /// Number of entries in the file.
    ///
    /// # Errors
    /// Returns `Error::CorruptIndex` if the file size is not a whole number
    /// of entries.
    pub fn len(&self) -> Result<u32> {
        let bytes = self.file.metadata()?.len();
        if bytes % INDEX_ENTRY_SIZE as u64 != 0 {
            return Err(self.corrupt(format!(
                "size {} is not a multiple of {}",
                bytes, INDEX_ENTRY_SIZE
            )));
        }
        u32::try_from(bytes / INDEX_ENTRY_SIZE as u64)
            .map_err(|_| self.corrupt(format!("{} bytes is too many entries", bytes)))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Resolve `id` to its data file offset.
    ///
    /// # Errors
    /// - `Error::RecordNotFound` if the file has no entry for `id`
    /// - `Error::CorruptIndex` if the stored offset is negative
    pub fn get(&mut self, id: RecordId) -> Result<u64> {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        self.file.seek(SeekFrom::Start(id.index_position()))?;
        self.file.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::RecordNotFound {
                table: self.table.clone(),
                id: id.0,
            },
            _ => Error::Io(e),
        })?;

        self.decode_entry(id, buf)
    }

    fn decode_entry(&self, id: RecordId, buf: [u8; INDEX_ENTRY_SIZE]) -> Result<u64> {
        let offset = i32::from_le_bytes(buf);
        u64::try_from(offset)
            .map_err(|_| self.corrupt(format!("negative offset {} for record {}", offset, id)))
    }

    /// Read every entry in ID order.
    pub fn entries(&mut self) -> Result<Vec<u64>> {
        let len = self.len()?;
        let mut bytes = vec![0u8; len as usize * INDEX_ENTRY_SIZE];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut bytes)?;

        bytes
            .chunks_exact(INDEX_ENTRY_SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                let buf = [chunk[0], chunk[1], chunk[2], chunk[3]];
                self.decode_entry(RecordId::new(i as u32), buf)
            })
            .collect()
    }

    /// Point `id` at `offset`.
    ///
    /// # Errors
    /// Returns `Error::TableFull` if `offset` doesn't fit an `i32` entry.
    pub fn set(&mut self, id: RecordId, offset: u64) -> Result<()> {
        let entry = i32::try_from(offset).map_err(|_| Error::TableFull(self.table.clone()))?;

        self.file.seek(SeekFrom::Start(id.index_position()))?;
        self.file.write_all(&entry.to_le_bytes())?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Add the entry for a newly inserted record.
    ///
    /// `position` is the table's record count before the insert, so the
    /// entry lands one past the last known entry.
    pub fn append(&mut self, position: RecordId, offset: u64) -> Result<()> {
        self.set(position, offset)
    }

    /// Move entries down one slot: entry `i` takes the value of entry `i+1`
    /// for every `i` in `[from, to)`. Entry `to` is then stale and is cut
    /// off, leaving `to` entries.
    ///
    /// # Errors
    /// Returns `Error::RecordNotFound` if entry `to` doesn't exist.
    pub fn shift_range(&mut self, from: RecordId, to: RecordId) -> Result<()> {
        let len = self.len()?;
        if to.0 >= len {
            return Err(Error::RecordNotFound {
                table: self.table.clone(),
                id: to.0,
            });
        }

        if from < to {
            let count = (to.0 - from.0) as usize;
            let mut block = vec![0u8; count * INDEX_ENTRY_SIZE];
            self.file
                .seek(SeekFrom::Start(RecordId::new(from.0 + 1).index_position()))?;
            self.file.read_exact(&mut block)?;

            self.file.seek(SeekFrom::Start(from.index_position()))?;
            self.file.write_all(&block)?;
        }

        self.truncate(to.0)
    }

    /// Keep only the first `len` entries.
    pub fn truncate(&mut self, len: u32) -> Result<()> {
        self.file.set_len(RecordId::new(len).index_position())?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StoreConfig;
    use tempfile::tempdir;

    fn files(dir: &std::path::Path) -> TableFiles {
        TableFiles::resolve(&StoreConfig::default_for_test(dir), "t").unwrap()
    }

    fn index_with(files: &TableFiles, offsets: &[u64]) -> IndexFile {
        let mut index = IndexFile::create(files, false).unwrap();
        for (i, &offset) in offsets.iter().enumerate() {
            index.append(RecordId::new(i as u32), offset).unwrap();
        }
        index
    }

    #[test]
    fn test_append_and_get() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[60, 84, 108]);

        assert_eq!(index.len().unwrap(), 3);
        assert_eq!(index.get(RecordId::new(0)).unwrap(), 60);
        assert_eq!(index.get(RecordId::new(2)).unwrap(), 108);
        assert_eq!(index.entries().unwrap(), vec![60, 84, 108]);
    }

    #[test]
    fn test_get_out_of_range() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[60]);

        assert!(matches!(
            index.get(RecordId::new(1)),
            Err(Error::RecordNotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_open_missing() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());

        assert!(matches!(
            IndexFile::open(&files, false),
            Err(Error::IndexNotFound(_))
        ));

        // open_or_create makes an empty file
        let index = IndexFile::open_or_create(&files, false).unwrap();
        assert!(index.is_empty().unwrap());
        assert!(IndexFile::open(&files, false).is_ok());
    }

    #[test]
    fn test_open_or_create_keeps_entries() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        drop(index_with(&files, &[60, 84]));

        let mut index = IndexFile::open_or_create(&files, false).unwrap();
        assert_eq!(index.entries().unwrap(), vec![60, 84]);
    }

    #[test]
    fn test_shift_range() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[10, 20, 30, 40, 50]);

        index.shift_range(RecordId::new(1), RecordId::new(4)).unwrap();
        assert_eq!(index.entries().unwrap(), vec![10, 30, 40, 50]);
    }

    #[test]
    fn test_shift_range_empty_range_drops_tail() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[10, 20, 30]);

        index.shift_range(RecordId::new(2), RecordId::new(2)).unwrap();
        assert_eq!(index.entries().unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_shift_range_past_end_fails() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[10, 20]);

        assert!(index.shift_range(RecordId::new(0), RecordId::new(2)).is_err());
        assert_eq!(index.entries().unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_truncate() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        let mut index = index_with(&files, &[10, 20, 30]);

        index.truncate(1).unwrap();
        assert_eq!(index.len().unwrap(), 1);
        assert!(index.get(RecordId::new(1)).is_err());
    }

    #[test]
    fn test_ragged_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        std::fs::write(&files.index, [0u8; 6]).unwrap();

        let index = IndexFile::open(&files, false).unwrap();
        assert!(matches!(index.len(), Err(Error::CorruptIndex { .. })));
    }

    #[test]
    fn test_negative_entry_is_corrupt() {
        let dir = tempdir().unwrap();
        let files = files(dir.path());
        std::fs::write(&files.index, (-1i32).to_le_bytes()).unwrap();

        let mut index = IndexFile::open(&files, false).unwrap();
        assert!(matches!(
            index.get(RecordId::new(0)),
            Err(Error::CorruptIndex { .. })
        ));
    }
}
