//! Query engine - filtered, projected full scans.

use tracing::warn;

use crate::common::{Error, Result, StoreConfig};
use crate::query::condition::{compare_values, CompareOp, Condition};
use crate::storage::{RecordCodec, Row, Schema, Value};
use crate::table::OpenTable;

/// Runs read-only scans over one table at a time.
///
/// A scan never writes to the header, index, schema, or data file, so
/// repeating a scan with no mutation in between returns the same rows.
pub struct QueryEngine<'a> {
    config: &'a StoreConfig,
}

/// A condition bound to a schema column.
#[derive(Debug)]
struct Predicate {
    column: usize,
    op: CompareOp,
    literal: Value,
}

impl Predicate {
    fn matches(&self, value: &Value) -> bool {
        self.op.holds(compare_values(value, &self.literal))
    }
}

impl<'a> QueryEngine<'a> {
    pub fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    /// Scan `table` in logical ID order, keeping records for which every
    /// condition holds and projecting them to `columns`.
    ///
    /// - `"*"` (or an empty column list) selects every column in schema
    ///   order. Unknown column names are skipped with a warning.
    /// - Conditions are ANDed. Ints and floats compare numerically, strings
    ///   lexicographically.
    /// - A condition on an unknown column, or with a literal that can't be
    ///   compared with its column, matches nothing (with a warning); the scan
    ///   itself still succeeds.
    ///
    /// Only the columns needed for conditions and projection are decoded.
    ///
    /// # Errors
    /// Fails only if the table can't be opened or read.
    pub fn scan<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &[S],
        conditions: &[Condition],
    ) -> Result<Vec<Row>> {
        let mut open = OpenTable::open(self.config, table)?;
        let offsets = open.index()?.entries()?;

        let projection = resolve_projection(&open.schema, table, columns);
        let predicates = match bind_conditions(&open.schema, table, conditions) {
            Some(predicates) => predicates,
            None => return Ok(Vec::new()),
        };

        let codec = RecordCodec::new(&open.schema);
        let mut buf = vec![0u8; open.schema.record_size()];
        let mut decoded: Vec<Option<Value>> = vec![None; open.schema.len()];
        let mut rows = Vec::new();

        for id in 0..open.num_records {
            let offset = *offsets
                .get(id as usize)
                .ok_or_else(|| Error::RecordNotFound {
                    table: table.to_string(),
                    id,
                })?;
            open.data.read_at(offset, &mut buf)?;
            decoded.iter_mut().for_each(|slot| *slot = None);

            let mut keep = true;
            for predicate in &predicates {
                let value = column_value(&codec, &mut decoded, predicate.column, &buf)?;
                if !predicate.matches(value) {
                    keep = false;
                    break;
                }
            }
            if !keep {
                continue;
            }

            let mut row = Row::new();
            for &index in &projection {
                let value = column_value(&codec, &mut decoded, index, &buf)?.clone();
                row.push(&open.schema.column(index).name, value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Decode column `index` of `buf` once per record.
fn column_value<'v>(
    codec: &RecordCodec<'_>,
    decoded: &'v mut [Option<Value>],
    index: usize,
    buf: &[u8],
) -> Result<&'v Value> {
    let slot = &mut decoded[index];
    let value = match slot.take() {
        Some(value) => value,
        None => codec.decode_column(index, buf)?,
    };
    Ok(slot.insert(value))
}

/// Schema positions of the requested columns, in request order.
fn resolve_projection<S: AsRef<str>>(schema: &Schema, table: &str, columns: &[S]) -> Vec<usize> {
    if columns.is_empty() {
        return (0..schema.len()).collect();
    }

    let mut projection = Vec::with_capacity(columns.len());
    for name in columns {
        let name = name.as_ref().trim();
        if name == "*" {
            projection.extend(0..schema.len());
        } else if let Some(index) = schema.column_index(name) {
            projection.push(index);
        } else {
            warn!(table, column = name, "skipping unknown column in projection");
        }
    }
    projection
}

/// Bind every condition to its column, or `None` if one can never match.
fn bind_conditions(schema: &Schema, table: &str, conditions: &[Condition]) -> Option<Vec<Predicate>> {
    let mut predicates = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let Some(column) = schema.column_index(&condition.column) else {
            warn!(table, %condition, "condition on unknown column matches no records");
            return None;
        };

        let column_type = schema.column(column).column_type;
        let Some(literal) = condition.literal_for(column_type) else {
            warn!(
                table,
                %condition,
                column_type = column_type.name(),
                "condition literal not comparable with column, matches no records"
            );
            return None;
        };

        predicates.push(Predicate {
            column,
            op: condition.op,
            literal,
        });
    }
    Some(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Database;
    use tempfile::tempdir;

    fn create_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::new(StoreConfig::default_for_test(dir.path()));
        db.create_table("people", "Name:string(10), Age:int, Score:float")
            .unwrap();
        for (name, age, score) in [
            ("Ann", "20", "1.5"),
            ("Bob", "25", "2.5"),
            ("Cid", "30", "3.5"),
        ] {
            db.insert("people", &[name, age, score]).unwrap();
        }
        (db, dir)
    }

    fn ages(rows: &[Row]) -> Vec<i32> {
        rows.iter()
            .map(|r| match r.get("Age") {
                Some(Value::Int(age)) => *age,
                other => panic!("unexpected Age {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_star_no_conditions() {
        let (db, _dir) = create_db();
        let rows = db.query("people", &["*"], &[]).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["ID", "Name", "Age", "Score"]
        );
        assert_eq!(rows, db.read_all("people").unwrap());
    }

    #[test]
    fn test_greater_than_filter() {
        let (db, _dir) = create_db();
        let rows = db
            .query("people", &["*"], &[Condition::new("Age", CompareOp::Gt, 20)])
            .unwrap();

        assert_eq!(ages(&rows), vec![25, 30]);
    }

    #[test]
    fn test_conjunction() {
        let (db, _dir) = create_db();
        let rows = db
            .query(
                "people",
                &["Name", "Age"],
                &[
                    Condition::new("Age", CompareOp::Ge, 20),
                    Condition::new("Score", CompareOp::Lt, 3.0f32),
                    Condition::new("Name", CompareOp::Ne, "Ann"),
                ],
            )
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Name"), Some(&Value::Str("Bob".to_string())));
    }

    #[test]
    fn test_projection_order_and_unknown_columns() {
        let (db, _dir) = create_db();
        let rows = db
            .query("people", &["Score", "Missing", "ID"], &[])
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].columns().collect::<Vec<_>>(), vec!["Score", "ID"]);
        assert_eq!(rows[2].values().cloned().collect::<Vec<_>>(), vec![
            Value::Float(3.5),
            Value::Int(2)
        ]);
    }

    #[test]
    fn test_string_comparison() {
        let (db, _dir) = create_db();
        let rows = db
            .query("people", &["Age"], &[Condition::new("Name", CompareOp::Ge, "Bob")])
            .unwrap();

        assert_eq!(ages(&rows), vec![25, 30]);
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        let (db, _dir) = create_db();

        // float literal against int column
        let rows = db
            .query("people", &["Age"], &[Condition::new("Age", CompareOp::Lt, 25.5f32)])
            .unwrap();
        assert_eq!(ages(&rows), vec![20, 25]);

        // numeric text literal against int column
        let rows = db
            .query("people", &["Age"], &[Condition::new("Age", CompareOp::Eq, "30")])
            .unwrap();
        assert_eq!(ages(&rows), vec![30]);
    }

    #[test]
    fn test_numeric_looking_literal_on_string_column() {
        let dir = tempdir().unwrap();
        let db = Database::new(StoreConfig::default_for_test(dir.path()));
        db.create_table("codes", "Code:string(5)").unwrap();
        for code in ["007", "1.50", "7"] {
            db.insert("codes", &[code]).unwrap();
        }

        for literal in ["007", "1.50"] {
            let rows = db
                .query("codes", &["Code"], &[Condition::parse("Code", "=", literal).unwrap()])
                .unwrap();
            assert_eq!(rows.len(), 1, "Code = {}", literal);
            assert_eq!(rows[0].get("Code"), Some(&Value::Str(literal.to_string())));
        }
    }

    #[test]
    fn test_unknown_condition_column_matches_nothing() {
        let (db, _dir) = create_db();
        let rows = db
            .query("people", &["*"], &[Condition::new("Height", CompareOp::Gt, 1)])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_incomparable_literal_matches_nothing() {
        let (db, _dir) = create_db();
        let rows = db
            .query("people", &["*"], &[Condition::new("Age", CompareOp::Ne, "old")])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_scan_is_read_only_and_repeatable() {
        let (db, dir) = create_db();
        let bin = dir.path().join("people.bin");
        let idx = dir.path().join("people.idx");
        let before = (std::fs::read(&bin).unwrap(), std::fs::read(&idx).unwrap());

        let conditions = [Condition::new("Age", CompareOp::Gt, 20)];
        let first = db.query("people", &["Name"], &conditions).unwrap();
        let second = db.query("people", &["Name"], &conditions).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            before,
            (std::fs::read(&bin).unwrap(), std::fs::read(&idx).unwrap())
        );
    }

    #[test]
    fn test_scan_follows_index_after_delete() {
        let (db, _dir) = create_db();
        db.delete("people", crate::RecordId::new(0)).unwrap();

        let rows = db.query("people", &["ID", "Age"], &[]).unwrap();
        assert_eq!(ages(&rows), vec![30, 25]);
        assert_eq!(rows[0].id(), Some(crate::RecordId::new(0)));
    }

    #[test]
    fn test_unknown_table() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::default_for_test(dir.path());
        let engine = QueryEngine::new(&config);

        assert!(matches!(
            engine.scan::<&str>("nope", &[], &[]),
            Err(Error::TableNotFound(_))
        ));
    }
}
