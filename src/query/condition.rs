//! Comparison conditions for filtered scans.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::common::{Error, Result};
use crate::storage::record::unquote;
use crate::storage::{ColumnType, Value};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Whether `lhs op rhs` holds given `lhs.partial_cmp(rhs)`.
    ///
    /// Unordered operands (NaN) satisfy only `!=`.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (CompareOp::Ne, ord) => ord != Some(Ordering::Equal),
            (_, None) => false,
            (CompareOp::Eq, Some(ord)) => ord == Ordering::Equal,
            (CompareOp::Lt, Some(ord)) => ord == Ordering::Less,
            (CompareOp::Le, Some(ord)) => ord != Ordering::Greater,
            (CompareOp::Gt, Some(ord)) => ord == Ordering::Greater,
            (CompareOp::Ge, Some(ord)) => ord != Ordering::Less,
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            other => Err(Error::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `column op literal`, e.g. `Age > 20`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
    /// Literal text as written, kept when it was read as a number.
    text: Option<String>,
}

impl Condition {
    pub fn new(column: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            op,
            value: value.into(),
            text: None,
        }
    }

    /// Build a condition from text tokens.
    ///
    /// The literal becomes an int if it parses as `i32`, else a float if it
    /// parses as `f32`, else a string with one layer of quotes removed.
    /// A numeric literal keeps its text for comparison with string columns,
    /// so `007` matches the string `"007"`, not `"7"`.
    pub fn parse(column: &str, op: &str, literal: &str) -> Result<Self> {
        let literal = literal.trim();
        let value = if let Ok(v) = literal.parse::<i32>() {
            Value::Int(v)
        } else if let Ok(v) = literal.parse::<f32>() {
            Value::Float(v)
        } else {
            return Ok(Self::new(
                column.trim(),
                op.parse()?,
                Value::Str(unquote(literal).to_string()),
            ));
        };

        let mut condition = Self::new(column.trim(), op.parse()?, value);
        condition.text = Some(literal.to_string());
        Ok(condition)
    }

    /// The literal converted for comparison with a column of `column_type`.
    ///
    /// Numeric literals compare with string columns by their text; string
    /// literals compare with numeric columns if they parse as numbers.
    /// Returns `None` when no such conversion exists.
    pub fn literal_for(&self, column_type: ColumnType) -> Option<Value> {
        match (column_type, &self.value) {
            (ColumnType::String, Value::Str(_)) => Some(self.value.clone()),
            (ColumnType::String, other) => Some(Value::Str(
                self.text.clone().unwrap_or_else(|| other.to_string()),
            )),
            (_, Value::Int(_)) | (_, Value::Float(_)) => Some(self.value.clone()),
            (ColumnType::Int, Value::Str(s)) => s
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .or_else(|_| s.trim().parse::<f32>().map(Value::Float))
                .ok(),
            (ColumnType::Float, Value::Str(s)) => s.trim().parse::<f32>().map(Value::Float).ok(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Str(s) => write!(f, "{} {} '{}'", self.column, self.op, s),
            v => write!(f, "{} {} {}", self.column, self.op, v),
        }
    }
}

/// Order two values: ints exactly, strings lexicographically by bytes,
/// mixed numerics as `f64`. Strings never order against numbers.
pub fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators() {
        for (text, op) in [
            ("=", CompareOp::Eq),
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<>", CompareOp::Ne),
            ("<", CompareOp::Lt),
            ("<=", CompareOp::Le),
            (">", CompareOp::Gt),
            (">=", CompareOp::Ge),
        ] {
            assert_eq!(text.parse::<CompareOp>().unwrap(), op);
        }
        assert!(matches!(
            "=~".parse::<CompareOp>(),
            Err(Error::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_holds() {
        let less = Some(Ordering::Less);
        let equal = Some(Ordering::Equal);

        assert!(CompareOp::Lt.holds(less));
        assert!(CompareOp::Le.holds(less));
        assert!(CompareOp::Le.holds(equal));
        assert!(!CompareOp::Gt.holds(equal));
        assert!(CompareOp::Ge.holds(equal));
        assert!(CompareOp::Ne.holds(less));
        assert!(!CompareOp::Ne.holds(equal));

        // NaN
        assert!(!CompareOp::Eq.holds(None));
        assert!(!CompareOp::Lt.holds(None));
        assert!(CompareOp::Ne.holds(None));
    }

    #[test]
    fn test_condition_parse_literals() {
        let cond = Condition::parse("Age", ">", "20").unwrap();
        assert_eq!(cond.column, "Age");
        assert_eq!(cond.op, CompareOp::Gt);
        assert_eq!(cond.value, Value::Int(20));
        assert_eq!(
            Condition::parse("Score", "<=", "2.5").unwrap().value,
            Value::Float(2.5)
        );
        assert_eq!(
            Condition::parse("Name", "=", "'Bob'").unwrap().value,
            Value::Str("Bob".to_string())
        );
        assert!(Condition::parse("Name", "like", "x").is_err());
    }

    #[test]
    fn test_literal_for_column_types() {
        let cond = Condition::new("X", CompareOp::Eq, 5);
        assert_eq!(cond.literal_for(ColumnType::String), Some(Value::Str("5".into())));
        assert_eq!(cond.literal_for(ColumnType::Float), Some(Value::Int(5)));

        let cond = Condition::new("X", CompareOp::Eq, "12");
        assert_eq!(cond.literal_for(ColumnType::Int), Some(Value::Int(12)));

        let cond = Condition::new("X", CompareOp::Eq, "abc");
        assert_eq!(cond.literal_for(ColumnType::Int), None);
        assert_eq!(cond.literal_for(ColumnType::Float), None);
    }

    #[test]
    fn test_parsed_number_keeps_text_for_string_columns() {
        for literal in ["007", "1.50", "nan", "+3"] {
            let cond = Condition::parse("Code", "=", literal).unwrap();
            assert_eq!(
                cond.literal_for(ColumnType::String),
                Some(Value::Str(literal.to_string()))
            );
        }

        // numeric columns still compare by value
        let cond = Condition::parse("Age", "=", "007").unwrap();
        assert_eq!(cond.literal_for(ColumnType::Int), Some(Value::Int(7)));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(&Value::Int(3), &Value::Int(20)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Float(2.5), &Value::Int(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&Value::Str("apple".into()), &Value::Str("banana".into())),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::Str("1".into()), &Value::Int(1)), None);
        assert_eq!(
            compare_values(&Value::Float(f32::NAN), &Value::Float(1.0)),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Condition::new("Age", CompareOp::Ge, 21).to_string(), "Age >= 21");
        assert_eq!(
            Condition::new("Name", CompareOp::Ne, "Bob").to_string(),
            "Name != 'Bob'"
        );
    }
}
