//! Per-table file locations.

use std::path::PathBuf;

use crate::common::{Error, Result, StoreConfig};

/// Paths of the three files backing one table.
///
/// ```text
/// <data_dir>/T.bin     header + fixed-width records
/// <data_dir>/T.schema  one `name:type` line per column
/// <data_dir>/T.idx     dense i32 offsets, one per logical ID
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFiles {
    /// Table name, used in error messages.
    pub table: String,
    pub data: PathBuf,
    pub schema: PathBuf,
    pub index: PathBuf,
}

impl TableFiles {
    /// Resolve the files of `table` under the configured data directory.
    ///
    /// # Errors
    /// Returns `Error::InvalidTableName` if the name is empty or is not a
    /// plain file stem (path separators, `.`/`..`, NUL).
    pub fn resolve(config: &StoreConfig, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        let file = |ext: &str| config.data_dir.join(format!("{}.{}", table, ext));

        Ok(Self {
            table: table.to_string(),
            data: file(&config.data_extension),
            schema: file(&config.schema_extension),
            index: file(&config.index_extension),
        })
    }

    /// Whether any of the table's files is present.
    pub fn any_exists(&self) -> bool {
        self.data.exists() || self.schema.exists() || self.index.exists()
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    let bad = table.is_empty()
        || table == "."
        || table == ".."
        || table.chars().any(|c| c == '/' || c == '\\' || c == '\0');

    if bad {
        Err(Error::InvalidTableName(table.to_string()))
    } else {
        Ok(())
    }
}
