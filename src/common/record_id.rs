//! Record identifier type.

use std::fmt;

/// Dense logical position of a record within its table.
///
/// IDs always form `0..num_records`. They are reassigned when a record is
/// deleted, so a `RecordId` names a position, not a stable row identity.
///
/// # Example
/// ```
/// use flatdb::RecordId;
///
/// let id = RecordId::new(3);
/// assert_eq!(id.0, 3);
/// assert_eq!(id.index_position(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

impl RecordId {
    /// Create a new RecordId.
    #[inline]
    pub fn new(id: u32) -> Self {
        RecordId(id)
    }

    /// Byte position of this ID's entry in the index file.
    #[inline]
    pub fn index_position(&self) -> u64 {
        self.0 as u64 * crate::common::config::INDEX_ENTRY_SIZE as u64
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        RecordId(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
