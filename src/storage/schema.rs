//! Table schemas and the `T.schema` file.
//!
//! A schema file holds one column per line, in record order:
//! ```text
//! ID:int
//! Name:string(20)
//! Score:float
//! ```
//! The `ID:int` column is always first and is injected at table creation.

use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};

use crate::common::config::ID_COLUMN;
use crate::common::{Error, Result};
use crate::storage::table_files::TableFiles;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 4-byte little-endian `i32`.
    Int,
    /// 4-byte little-endian `f32`.
    Float,
    /// Fixed-size byte string, NUL-padded.
    String,
}

impl ColumnType {
    /// Type token as written in schema files.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::String => "string",
        }
    }

    /// Match a type token, ignoring ASCII case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "int" => Some(ColumnType::Int),
            "float" => Some(ColumnType::Float),
            "string" => Some(ColumnType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name, unique within its table (case-sensitive).
    pub name: String,
    pub column_type: ColumnType,
    /// Bytes occupied in every record.
    pub size: usize,
}

impl ColumnInfo {
    pub fn int(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::Int,
            size: 4,
        }
    }

    pub fn float(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::Float,
            size: 4,
        }
    }

    pub fn string(name: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::String,
            size,
        }
    }

    /// Whether this is the implicit record ID column.
    pub fn is_id(&self) -> bool {
        self.name == ID_COLUMN
    }

    /// Parse a schema line: `name:type`, `name:type(size)` or `name type(size)`.
    ///
    /// `int` and `float` are always 4 bytes; `string` requires a positive
    /// size in parentheses.
    ///
    /// # Errors
    /// - `Error::InvalidSchema` for a missing name or type, or a bad size
    /// - `Error::UnknownColumnType` for a type other than int/float/string
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let invalid = |reason: &str| Error::InvalidSchema {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (name, type_part) = match line.split_once(':') {
            Some(parts) => parts,
            None => line
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid("missing column type"))?,
        };
        let name = name.trim();
        let type_part = type_part.trim();

        if name.is_empty() {
            return Err(invalid("missing column name"));
        }

        let (token, size_part) = match type_part.split_once('(') {
            Some((token, rest)) => {
                let size = rest
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("unterminated size"))?;
                (token.trim(), Some(size.trim()))
            }
            None => (type_part, None),
        };

        if token.is_empty() {
            return Err(invalid("missing column type"));
        }

        let column_type =
            ColumnType::from_token(token).ok_or_else(|| Error::UnknownColumnType {
                column: name.to_string(),
                type_name: token.to_string(),
            })?;

        let size = match column_type {
            ColumnType::Int | ColumnType::Float => 4,
            ColumnType::String => {
                let size: usize = size_part
                    .ok_or_else(|| invalid("string column needs a size"))?
                    .parse()
                    .map_err(|_| invalid("size is not a number"))?;
                if size == 0 {
                    return Err(invalid("size must be positive"));
                }
                size
            }
        };

        Ok(Self {
            name: name.to_string(),
            column_type,
            size,
        })
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column_type {
            ColumnType::String => write!(f, "{}:{}({})", self.name, self.column_type, self.size),
            _ => write!(f, "{}:{}", self.name, self.column_type),
        }
    }
}

/// Ordered columns of a table plus the derived record layout.
///
/// # Record Layout
/// ```text
/// ┌────────┬────────────────┬──────────┐
/// │ ID     │ Name           │ Score    │
/// │ int 4B │ string(20) 20B │ float 4B │
/// └────────┴────────────────┴──────────┘
/// offset 0  4                24         record_size = 28
/// ```
///
/// Immutable once a table is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
    /// Byte offset of each column within a record.
    offsets: Vec<usize>,
    record_size: usize,
}

impl Schema {
    /// Build a schema from a full column list.
    ///
    /// # Errors
    /// - `Error::InvalidSchema` if the first column is not `ID:int` or the
    ///   record size overflows
    /// - `Error::DuplicateColumn` if two columns share a name
    pub fn new(columns: Vec<ColumnInfo>) -> Result<Self> {
        match columns.first() {
            Some(first) if first.is_id() && first.column_type == ColumnType::Int => {}
            _ => {
                return Err(Error::InvalidSchema {
                    line: columns.first().map(|c| c.to_string()).unwrap_or_default(),
                    reason: format!("first column must be {}:int", ID_COLUMN),
                })
            }
        }

        let mut offsets = Vec::with_capacity(columns.len());
        let mut record_size: usize = 0;
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::DuplicateColumn(column.name.clone()));
            }
            offsets.push(record_size);
            record_size = record_size
                .checked_add(column.size)
                .filter(|&n| u32::try_from(n).is_ok())
                .ok_or_else(|| Error::InvalidSchema {
                    line: column.to_string(),
                    reason: "record size overflows".to_string(),
                })?;
        }

        Ok(Self {
            columns,
            offsets,
            record_size,
        })
    }

    /// Prepend `ID:int` to user-supplied columns.
    pub fn with_id_column(user_columns: Vec<ColumnInfo>) -> Result<Self> {
        let mut columns = Vec::with_capacity(user_columns.len() + 1);
        columns.push(ColumnInfo::int(ID_COLUMN));
        columns.extend(user_columns);
        Self::new(columns)
    }

    /// Parse schema file text: one column per nonblank line.
    pub fn parse(text: &str) -> Result<Self> {
        let columns = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(ColumnInfo::parse)
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Parse a comma-separated column spec such as
    /// `"Name:string(20), Age:int"`. Blank fragments are skipped.
    pub fn parse_column_spec(spec: &str) -> Result<Vec<ColumnInfo>> {
        spec.split(',')
            .filter(|fragment| !fragment.trim().is_empty())
            .map(ColumnInfo::parse)
            .collect()
    }

    /// Schema file contents: one canonical line per column.
    pub fn to_schema_text(&self) -> String {
        self.columns.iter().map(|c| format!("{}\n", c)).collect()
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, index: usize) -> &ColumnInfo {
        &self.columns[index]
    }

    /// Number of columns, including `ID`.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of columns a caller supplies values for (all but `ID`).
    #[inline]
    pub fn value_count(&self) -> usize {
        self.columns.len() - 1
    }

    /// Total bytes per record.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Byte offset of column `index` within a record.
    #[inline]
    pub fn offset_of(&self, index: usize) -> usize {
        self.offsets[index]
    }

    /// Byte range of column `index` within a record.
    #[inline]
    pub fn range_of(&self, index: usize) -> std::ops::Range<usize> {
        let start = self.offsets[index];
        start..start + self.columns[index].size
    }

    /// Position of the column named `name` (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Read and parse the table's schema file.
///
/// # Errors
/// Returns `Error::SchemaNotFound` if the file doesn't exist.
pub fn load_schema(files: &TableFiles) -> Result<Schema> {
    let text = fs::read_to_string(&files.schema).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::SchemaNotFound(files.table.clone()),
        _ => Error::Io(e),
    })?;
    Schema::parse(&text)
}

/// Parse `column_spec`, prepend `ID:int`, and write the schema file.
///
/// Nothing is written unless the whole spec parses.
pub fn create_schema(files: &TableFiles, column_spec: &str, sync: bool) -> Result<Schema> {
    let schema = Schema::with_id_column(Schema::parse_column_spec(column_spec)?)?;

    let mut file = File::create(&files.schema)?;
    file.write_all(schema.to_schema_text().as_bytes())?;
    if sync {
        file.sync_all()?;
    }

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StoreConfig;
    use tempfile::tempdir;

    #[test]
    fn test_parse_string_column() {
        let col = ColumnInfo::parse("Name:string(20)").unwrap();
        assert_eq!(col.name, "Name");
        assert_eq!(col.column_type.name(), "string");
        assert_eq!(col.size, 20);
    }

    #[test]
    fn test_parse_int_column() {
        let col = ColumnInfo::parse("Age:int").unwrap();
        assert_eq!(col.name, "Age");
        assert_eq!(col.column_type.name(), "int");
        assert_eq!(col.size, 4);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(ColumnInfo::parse("  Score : FLOAT ").unwrap(), ColumnInfo::float("Score"));
        assert_eq!(
            ColumnInfo::parse("City string(12)").unwrap(),
            ColumnInfo::string("City", 12)
        );
        assert_eq!(
            ColumnInfo::parse("Code:string( 3 )").unwrap(),
            ColumnInfo::string("Code", 3)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ColumnInfo::parse("Name:string"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse("Name:string(0)"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse("Name:string(abc)"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse("Name:string(5"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse(":int"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse("Name"),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(matches!(
            ColumnInfo::parse("When:date"),
            Err(Error::UnknownColumnType { type_name, .. }) if type_name == "date"
        ));
    }

    #[test]
    fn test_display_roundtrip() {
        for line in ["ID:int", "Score:float", "Name:string(20)"] {
            assert_eq!(ColumnInfo::parse(line).unwrap().to_string(), line);
        }
    }

    #[test]
    fn test_schema_layout() {
        let schema = Schema::with_id_column(vec![
            ColumnInfo::string("Name", 20),
            ColumnInfo::float("Score"),
        ])
        .unwrap();

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.value_count(), 2);
        assert_eq!(schema.record_size(), 28);
        assert_eq!(schema.offset_of(0), 0);
        assert_eq!(schema.offset_of(1), 4);
        assert_eq!(schema.offset_of(2), 24);
        assert_eq!(schema.range_of(1), 4..24);
        assert_eq!(schema.column_index("Score"), Some(2));
        assert_eq!(schema.column_index("score"), None);
    }

    #[test]
    fn test_schema_requires_id_first() {
        assert!(matches!(
            Schema::new(vec![ColumnInfo::int("Age")]),
            Err(Error::InvalidSchema { .. })
        ));
        assert!(Schema::new(vec![]).is_err());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        assert!(matches!(
            Schema::with_id_column(vec![ColumnInfo::int("ID")]),
            Err(Error::DuplicateColumn(name)) if name == "ID"
        ));
        assert!(matches!(
            Schema::with_id_column(vec![ColumnInfo::int("A"), ColumnInfo::float("A")]),
            Err(Error::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_parse_column_spec() {
        let columns = Schema::parse_column_spec("Name:string(10), Age:int,").unwrap();
        assert_eq!(
            columns,
            vec![ColumnInfo::string("Name", 10), ColumnInfo::int("Age")]
        );
    }

    #[test]
    fn test_create_and_load_schema() {
        let dir = tempdir().unwrap();
        let files = TableFiles::resolve(&StoreConfig::default_for_test(dir.path()), "t").unwrap();

        let created = create_schema(&files, "Name:string(20), Age:int", false).unwrap();
        assert_eq!(
            fs::read_to_string(&files.schema).unwrap(),
            "ID:int\nName:string(20)\nAge:int\n"
        );

        let loaded = load_schema(&files).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.column(0).name, "ID");
    }

    #[test]
    fn test_create_schema_writes_nothing_on_error() {
        let dir = tempdir().unwrap();
        let files = TableFiles::resolve(&StoreConfig::default_for_test(dir.path()), "t").unwrap();

        assert!(create_schema(&files, "Name:string(20), When:date", false).is_err());
        assert!(!files.schema.exists());
    }

    #[test]
    fn test_load_schema_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let files = TableFiles::resolve(&StoreConfig::default_for_test(dir.path()), "t").unwrap();
        fs::write(&files.schema, "ID:int\n\nName:string(20)\n\nAge:int\n").unwrap();

        let schema = load_schema(&files).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.column(1), &ColumnInfo::string("Name", 20));
        assert_eq!(schema.column(2), &ColumnInfo::int("Age"));
    }

    #[test]
    fn test_load_missing_schema() {
        let dir = tempdir().unwrap();
        let files = TableFiles::resolve(&StoreConfig::default_for_test(dir.path()), "t").unwrap();

        assert!(matches!(
            load_schema(&files),
            Err(Error::SchemaNotFound(name)) if name == "t"
        ));
    }
}
