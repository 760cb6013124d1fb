use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;

/// A single row keyed by column name.
pub type Row = Map<String, Value>;

/// Matches types carrying a precision and optional scale, e.g. `DECIMAL(38, 2)`.
static PRECISION_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]+)\(\d+(?:,\s*\d+)?\)$").expect("precision type regex is valid")
});

/// Strip the precision and scale from a drill type name.
///
/// `DECIMAL(3,4)` becomes `DECIMAL`, `CHAR(30)` becomes `CHAR`. Names not of
/// that shape are returned unchanged.
pub fn clean_type_name(type_name: &str) -> &str {
    match PRECISION_TYPE.captures(type_name) {
        Some(caps) => caps.get(1).map_or(type_name, |m| m.as_str()),
        None => type_name,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub column: String,
    pub data_type: String,
}

/// Rows returned by a single query along with a cursor into them.
#[derive(Debug, Clone)]
pub struct ResultSet {
    query: String,
    columns: Vec<String>,
    metadata: Vec<String>,
    rows: Vec<Row>,
    schema: Vec<SchemaField>,
    cursor: usize,
}

impl ResultSet {
    pub fn new(query: String, columns: Vec<String>, metadata: Vec<String>, rows: Vec<Row>) -> Self {
        // Drill omits metadata for some statements (e.g. SHOW), in which case
        // the field types are left empty.
        let schema = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| SchemaField {
                column: column.clone(),
                data_type: metadata
                    .get(idx)
                    .map(|t| clean_type_name(t).to_string())
                    .unwrap_or_default(),
            })
            .collect();

        ResultSet {
            query,
            columns,
            metadata,
            rows,
            schema,
            cursor: 0,
        }
    }

    /// The sql that produced this result.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Type names as reported by drill, before cleaning.
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    pub fn schema(&self) -> &[SchemaField] {
        &self.schema
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Return the row under the cursor and advance, or `None` once every row
    /// has been fetched.
    pub fn fetch_next_row(&mut self) -> Option<&Row> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some(row)
    }

    /// Deserialize the row under the cursor into `T` and advance.
    ///
    /// The cursor is advanced even if deserialization fails.
    pub fn fetch_next_as<T: DeserializeOwned>(&mut self) -> Option<Result<T>> {
        let row = self.fetch_next_row()?.clone();
        Some(serde_json::from_value(Value::Object(row)).map_err(Into::into))
    }

    /// All rows, regardless of the cursor position.
    pub fn fetch_all_rows(&self) -> &[Row] {
        &self.rows
    }

    /// Move the cursor to `n`. Positions past the end are rejected and leave
    /// the cursor where it was. Seeking to `row_count()` is allowed and
    /// leaves nothing left to fetch.
    pub fn seek(&mut self, n: usize) -> bool {
        if n > self.rows.len() {
            return false;
        }
        self.cursor = n;
        true
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(values: Value) -> Vec<Row> {
        match values {
            Value::Array(rows) => rows
                .into_iter()
                .map(|r| match r {
                    Value::Object(m) => m,
                    other => panic!("not an object: {other}"),
                })
                .collect(),
            other => panic!("not an array: {other}"),
        }
    }

    fn employees() -> ResultSet {
        ResultSet::new(
            "SELECT * FROM cp.`employee.json` LIMIT 3".to_string(),
            vec!["employee_id".to_string(), "salary".to_string()],
            vec!["BIGINT".to_string(), "DECIMAL(10, 4)".to_string()],
            rows(json!([
                {"employee_id": "1", "salary": "80000.0000"},
                {"employee_id": "2", "salary": "40000.0000"},
                {"employee_id": "4", "salary": "40000.0000"},
            ])),
        )
    }

    #[test]
    fn clean_type_names() {
        assert_eq!("DECIMAL", clean_type_name("DECIMAL(3,4)"));
        assert_eq!("DECIMAL", clean_type_name("DECIMAL(3, 4)"));
        assert_eq!("FLOAT8", clean_type_name("FLOAT8"));
        assert_eq!("CHAR", clean_type_name("CHAR(30)"));
        assert_eq!("VARCHAR", clean_type_name("VARCHAR(65535)"));
        // Not a precision suffix.
        assert_eq!("MAP(VARCHAR)", clean_type_name("MAP(VARCHAR)"));
        assert_eq!("", clean_type_name(""));
    }

    #[test]
    fn schema_pairs_columns_with_clean_types() {
        let res = employees();
        assert_eq!(
            vec![
                SchemaField {
                    column: "employee_id".to_string(),
                    data_type: "BIGINT".to_string(),
                },
                SchemaField {
                    column: "salary".to_string(),
                    data_type: "DECIMAL".to_string(),
                },
            ],
            res.schema()
        );
        assert_eq!("DECIMAL(10, 4)", res.metadata()[1]);
    }

    #[test]
    fn schema_without_metadata() {
        let res = ResultSet::new(
            "SHOW DATABASES".to_string(),
            vec!["SCHEMA_NAME".to_string()],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!("", res.schema()[0].data_type);
    }

    #[test]
    fn fetch_every_row_once_then_end() {
        let mut res = employees();
        assert_eq!(2, res.column_count());
        assert_eq!(3, res.row_count());

        let mut ids = Vec::new();
        for _ in 0..res.row_count() {
            let row = res.fetch_next_row().unwrap();
            ids.push(row["employee_id"].as_str().unwrap().to_string());
        }
        assert_eq!(vec!["1", "2", "4"], ids);

        assert!(res.fetch_next_row().is_none());
        assert!(res.fetch_next_row().is_none());
        assert_eq!(3, res.cursor());
    }

    #[test]
    fn fetch_all_does_not_move_cursor() {
        let mut res = employees();
        res.fetch_next_row().unwrap();
        assert_eq!(3, res.fetch_all_rows().len());
        assert_eq!(1, res.cursor());
    }

    #[test]
    fn seek_within_bounds() {
        let mut res = employees();

        assert!(res.seek(2));
        assert_eq!("4", res.fetch_next_row().unwrap()["employee_id"]);

        assert!(res.seek(0));
        assert_eq!("1", res.fetch_next_row().unwrap()["employee_id"]);

        assert!(res.seek(3));
        assert!(res.fetch_next_row().is_none());
    }

    #[test]
    fn seek_out_of_bounds_keeps_cursor() {
        let mut res = employees();
        res.fetch_next_row().unwrap();

        assert!(!res.seek(4));
        assert!(!res.seek(usize::MAX));
        assert_eq!(1, res.cursor());
    }

    #[test]
    fn fetch_typed_rows() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Employee {
            employee_id: String,
            salary: String,
        }

        let mut res = employees();
        let first: Employee = res.fetch_next_as().unwrap().unwrap();
        assert_eq!(
            Employee {
                employee_id: "1".to_string(),
                salary: "80000.0000".to_string(),
            },
            first
        );

        #[derive(Debug, Deserialize)]
        #[allow(unused)]
        struct Wrong {
            missing: String,
        }
        assert!(res.fetch_next_as::<Wrong>().unwrap().is_err());
        assert_eq!(2, res.cursor());
    }
}
