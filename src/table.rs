// In-memory table of records.
// Columns accumulate in first-seen order; rows are padded with nulls for columns they lack.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use serde_json::{Map, Number, Value};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Parse a cell read back from a cache file. Empty cells are null.
    fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            Scalar::Null
        } else {
            Scalar::Text(cell.to_string())
        }
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(b),
            Value::Number(n) => Scalar::Number(n),
            Value::String(s) => Scalar::Text(s),
            // Nested values are kept as compact JSON text.
            nested => Scalar::Text(nested.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A header of one empty field marks a table with no columns.
fn is_empty_header(headers: &csv::StringRecord) -> bool {
    headers.len() == 1 && headers.get(0) == Some("")
}

/// A JSON object as returned by the API, one per row.
pub type Record = Map<String, Value>;

/// Ordered rows sharing the union of every record's columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a cell by row number and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        let col = *self.index.get(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Append one record, adding any columns not seen before.
    pub fn push_record(&mut self, record: Record) {
        let mut row = vec![Scalar::Null; self.columns.len()];
        for (name, value) in record {
            let col = self.column_index(&name);
            if col >= row.len() {
                row.resize(col + 1, Scalar::Null);
            }
            row[col] = Scalar::from(value);
        }
        self.rows.push(row);
    }

    /// Append records in order.
    pub fn extend_records(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.push_record(record);
        }
    }

    /// Cell text for every row, with nulls as empty strings.
    pub fn to_text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    /// Read a table from CSV with a header row. Every value comes back as text.
    pub fn read_csv<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let mut table = Table::new();
        let headers = reader.headers()?.clone();
        if !is_empty_header(&headers) {
            for name in headers.iter() {
                let unique = table.unique_column_name(name);
                table.column_index(&unique);
            }
        }

        for result in reader.records() {
            let record = result?;
            if table.columns.is_empty() {
                table.rows.push(Vec::new());
            } else {
                table
                    .rows
                    .push(record.iter().map(Scalar::from_cell).collect());
            }
        }

        Ok(table)
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> std::result::Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        if !self.columns.is_empty() || !self.rows.is_empty() {
            // Zero columns are written as a single empty field, read back as no columns.
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// A header name not yet taken: repeats become `name.1`, `name.2`, ...
    fn unique_column_name(&self, name: &str) -> String {
        let mut unique = name.to_string();
        let mut n = 1;
        while self.index.contains_key(&unique) {
            unique = format!("{}.{}", name, n);
            n += 1;
        }
        unique
    }

    /// Index of a column, registering it (and padding existing rows) if new.
    fn column_index(&mut self, name: &str) -> usize {
        if let Some(&col) = self.index.get(name) {
            return col;
        }

        let col = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), col);
        for row in &mut self.rows {
            row.push(Scalar::Null);
        }
        col
    }
}
