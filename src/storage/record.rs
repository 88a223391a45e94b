//! Fixed-width record encoding.
//!
//! A record is `schema.record_size()` bytes with columns laid out back to
//! back in schema order:
//! - `int`: `i32`, little-endian
//! - `float`: `f32`, little-endian
//! - `string(N)`: raw bytes, left-justified, NUL-padded to N (no length prefix)

use std::fmt;

use crate::common::{Error, RecordId, Result};
use crate::storage::schema::{ColumnInfo, ColumnType, Schema};

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(String),
}

impl Value {
    /// Numeric view of int and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v as f64),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Named values of one record, in column order.
///
/// Full reads hold every schema column; query results hold the projected
/// columns in the requested order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &str, value: Value) {
        self.fields.push((column.to_string(), value));
    }

    /// Value of the column named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// The record's `ID`, if it was read or projected.
    pub fn id(&self) -> Option<RecordId> {
        match self.get(crate::common::config::ID_COLUMN) {
            Some(Value::Int(id)) => u32::try_from(*id).ok().map(RecordId::new),
            _ => None,
        }
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// Encodes and decodes records of one schema.
///
/// # Example
/// ```
/// use flatdb::{RecordCodec, RecordId, Schema, Value};
///
/// let schema = Schema::parse("ID:int\nName:string(8)\nAge:int\n").unwrap();
/// let codec = RecordCodec::new(&schema);
///
/// let bytes = codec.encode(RecordId::new(0), &["'Alice'", "30"]).unwrap();
/// assert_eq!(bytes.len(), 16);
///
/// let row = codec.decode(&bytes).unwrap();
/// assert_eq!(row.get("Name"), Some(&Value::Str("Alice".into())));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec<'a> {
    schema: &'a Schema,
}

impl<'a> RecordCodec<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Encode a full record.
    ///
    /// `id` fills the `ID` column; `values` supply every other column in
    /// schema order. Every value is validated before the buffer is returned,
    /// so a failed encode never yields partial bytes.
    ///
    /// # Errors
    /// - `Error::ValueCountMismatch` if `values.len() != schema.value_count()`
    /// - `Error::InvalidValue` if a number doesn't parse
    /// - `Error::ValueTooLong` if a string exceeds its column size
    pub fn encode<S: AsRef<str>>(&self, id: RecordId, values: &[S]) -> Result<Vec<u8>> {
        let expected = self.schema.value_count();
        if values.len() != expected {
            return Err(Error::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let mut buf = vec![0u8; self.schema.record_size()];
        self.write_id(&mut buf, id)?;

        // Column 0 is ID; values line up with columns 1..
        for (index, raw) in (1..self.schema.len()).zip(values) {
            let range = self.schema.range_of(index);
            encode_value(self.schema.column(index), raw.as_ref(), &mut buf[range])?;
        }

        Ok(buf)
    }

    /// Overwrite the `ID` column of an encoded record.
    pub fn write_id(&self, buf: &mut [u8], id: RecordId) -> Result<()> {
        let stored = i32::try_from(id.0).map_err(|_| Error::InvalidValue {
            column: self.schema.column(0).name.clone(),
            value: id.to_string(),
            expected: "an i32 record ID",
        })?;
        let range = self.schema.range_of(0);
        self.check_len(buf.len())?;
        buf[range].copy_from_slice(&stored.to_le_bytes());
        Ok(())
    }

    /// Decode every column.
    pub fn decode(&self, bytes: &[u8]) -> Result<Row> {
        self.check_len(bytes.len())?;

        let mut row = Row::new();
        for (index, column) in self.schema.columns().iter().enumerate() {
            row.push(&column.name, self.decode_column(index, bytes)?);
        }
        Ok(row)
    }

    /// Decode column `index` only.
    ///
    /// # Errors
    /// Returns `Error::InvalidValue` if `index` is past the last column or
    /// `bytes` is not exactly one record.
    pub fn decode_column(&self, index: usize, bytes: &[u8]) -> Result<Value> {
        self.check_len(bytes.len())?;
        let column = self
            .schema
            .columns()
            .get(index)
            .ok_or_else(|| Error::InvalidValue {
                column: format!("#{}", index),
                value: index.to_string(),
                expected: "a column index within the schema",
            })?;
        Ok(decode_value(column, &bytes[self.schema.range_of(index)]))
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len == self.schema.record_size() {
            Ok(())
        } else {
            Err(Error::InvalidValue {
                column: "<record>".to_string(),
                value: format!("{} bytes", len),
                expected: "a buffer of exactly one record",
            })
        }
    }
}

/// Strip one layer of matching single or double quotes.
pub(crate) fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    raw
}

/// Convert `raw` per the column type into `out` (exactly `column.size` bytes).
fn encode_value(column: &ColumnInfo, raw: &str, out: &mut [u8]) -> Result<()> {
    let invalid = |expected: &'static str| Error::InvalidValue {
        column: column.name.clone(),
        value: raw.to_string(),
        expected,
    };

    match column.column_type {
        ColumnType::Int => {
            let value: i32 = raw.trim().parse().map_err(|_| invalid("an integer"))?;
            out.copy_from_slice(&value.to_le_bytes());
        }
        ColumnType::Float => {
            let value: f32 = raw.trim().parse().map_err(|_| invalid("a float"))?;
            out.copy_from_slice(&value.to_le_bytes());
        }
        ColumnType::String => {
            let value = unquote(raw).as_bytes();
            if value.len() > column.size {
                return Err(Error::ValueTooLong {
                    column: column.name.clone(),
                    len: value.len(),
                    max: column.size,
                });
            }
            out[..value.len()].copy_from_slice(value);
            out[value.len()..].fill(0);
        }
    }
    Ok(())
}

/// Inverse of [`encode_value`]; `bytes` is exactly `column.size` long.
fn decode_value(column: &ColumnInfo, bytes: &[u8]) -> Value {
    match column.column_type {
        ColumnType::Int => Value::Int(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        ColumnType::Float => {
            Value::Float(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        ColumnType::String => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Value::Str(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
    }
}
