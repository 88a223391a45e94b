//! Table header definition.
//!
//! Every data file starts with a [`TableHeader`] containing:
//! - a magic tag identifying the format
//! - the number of live records
//! - the free offset where the next record will be appended
//! - a CRC32 over the three fields above

use crate::common::config::{HEADER_SIZE, MAGIC, MAX_RECORDS};
use crate::common::{Error, Result};

/// Metadata stored at the beginning of every data file.
///
/// # Layout (60 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic
/// 4       4     num_records (i32, little-endian)
/// 8       4     free_offset (u32, little-endian)
/// 12      4     checksum (CRC32 of bytes 0..12, little-endian)
/// 16      44    reserved (zero)
/// ```
///
/// The header is a plain value: it is re-read and re-written around each
/// mutation rather than cached. Serialization never validates; call
/// [`TableHeader::verify`] to check a header read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// File identifier.
    pub magic: [u8; 4],
    /// Number of records in the file.
    pub num_records: i32,
    /// Byte position where the next record will be written.
    pub free_offset: u32,
    /// CRC32 as read from disk. Recomputed on every write.
    pub checksum: u32,
}

impl TableHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Offset of each field within the header.
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_NUM_RECORDS: usize = 4;
    pub const OFFSET_FREE_OFFSET: usize = 8;
    pub const OFFSET_CHECKSUM: usize = 12;

    /// Header of an empty table.
    pub fn new() -> Self {
        let mut header = Self {
            magic: MAGIC,
            num_records: 0,
            free_offset: HEADER_SIZE as u32,
            checksum: 0,
        };
        header.checksum = header.compute_checksum();
        header
    }

    /// Read a header from a header-sized buffer.
    pub fn from_bytes(data: &[u8; HEADER_SIZE]) -> Self {
        let field = |offset: usize| -> [u8; 4] {
            [
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]
        };

        Self {
            magic: field(Self::OFFSET_MAGIC),
            num_records: i32::from_le_bytes(field(Self::OFFSET_NUM_RECORDS)),
            free_offset: u32::from_le_bytes(field(Self::OFFSET_FREE_OFFSET)),
            checksum: u32::from_le_bytes(field(Self::OFFSET_CHECKSUM)),
        }
    }

    /// Serialize this header. The checksum field is recomputed.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut data = [0u8; HEADER_SIZE];
        self.write_fields(&mut data);

        let checksum = Self::checksum_of(&data);
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
        data
    }

    fn write_fields(&self, data: &mut [u8; HEADER_SIZE]) {
        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&self.magic);
        data[Self::OFFSET_NUM_RECORDS..Self::OFFSET_NUM_RECORDS + 4]
            .copy_from_slice(&self.num_records.to_le_bytes());
        data[Self::OFFSET_FREE_OFFSET..Self::OFFSET_FREE_OFFSET + 4]
            .copy_from_slice(&self.free_offset.to_le_bytes());
    }

    fn checksum_of(data: &[u8; HEADER_SIZE]) -> u32 {
        crc32fast::hash(&data[..Self::OFFSET_CHECKSUM])
    }

    /// CRC32 of the current field values.
    pub fn compute_checksum(&self) -> u32 {
        let mut data = [0u8; HEADER_SIZE];
        self.write_fields(&mut data);
        Self::checksum_of(&data)
    }

    /// Record count, or `None` if the stored count is negative.
    pub fn record_count(&self) -> Option<u32> {
        u32::try_from(self.num_records).ok()
    }

    /// Set the record count.
    ///
    /// # Errors
    /// Returns `Error::TableFull` if `count` exceeds `MAX_RECORDS`.
    pub fn set_record_count(&mut self, table: &str, count: u32) -> Result<()> {
        if count > MAX_RECORDS {
            return Err(Error::TableFull(table.to_string()));
        }
        self.num_records = count as i32;
        Ok(())
    }

    /// Free offset implied by `num_records` records of `record_size` bytes.
    pub fn expected_free_offset(num_records: u32, record_size: usize) -> Option<u32> {
        (num_records as u64)
            .checked_mul(record_size as u64)
            .and_then(|n| n.checked_add(HEADER_SIZE as u64))
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Validate magic, checksum, record count, and free offset.
    ///
    /// # Errors
    /// Returns `Error::CorruptHeader` naming the first failed check.
    pub fn verify(&self, table: &str, record_size: usize) -> Result<()> {
        let corrupt = |reason: String| Error::CorruptHeader {
            table: table.to_string(),
            reason,
        };

        if self.magic != MAGIC {
            return Err(corrupt(format!("bad magic {:?}", self.magic)));
        }
        if self.checksum != self.compute_checksum() {
            return Err(corrupt(format!(
                "checksum mismatch (stored {:#010x}, computed {:#010x})",
                self.checksum,
                self.compute_checksum()
            )));
        }
        let count = self
            .record_count()
            .ok_or_else(|| corrupt(format!("negative record count {}", self.num_records)))?;

        match Self::expected_free_offset(count, record_size) {
            Some(expected) if expected == self.free_offset => Ok(()),
            Some(expected) => Err(corrupt(format!(
                "free offset {} does not match {} records of {} bytes (expected {})",
                self.free_offset, count, record_size, expected
            ))),
            None => Err(corrupt(format!(
                "{} records of {} bytes overflow the file",
                count, record_size
            ))),
        }
    }
}

impl Default for TableHeader {
    fn default() -> Self {
        Self::new()
    }
}
