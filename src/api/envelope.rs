// Page envelope schema.
// Validates one page of a paginated response into typed fields.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::table::Record;

/// Outer wrapper: every response nests its page under `payload`.
#[derive(Debug, Deserialize)]
struct Envelope {
    payload: Map<String, Value>,
}

/// One page of records plus pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// 1-based index of this page.
    pub page: u64,
    /// Total number of pages reported by the server.
    pub max_page: u64,
    /// Cursor to the next page, `None` on the last page.
    pub next_page: Option<String>,
}

impl Page {
    /// Parse a response body, taking records from `records_field`.
    ///
    /// The error string names the first field that is missing or mistyped.
    pub fn parse(body: &str, records_field: &str) -> Result<Self, String> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| format!("invalid envelope: {}", e))?;
        let mut payload = envelope.payload;

        let records = match payload.remove(records_field) {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(format!(
                        "{}[{}] is {}, expected an object",
                        records_field,
                        i,
                        kind(&other)
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(format!(
                    "{} is {}, expected an array",
                    records_field,
                    kind(&other)
                ));
            }
            None => return Err(format!("missing records field `{}`", records_field)),
        };

        let page = required_count(&payload, "page")?;
        let max_page = required_count(&payload, "max_page")?;

        let next_page = match payload.get("next_page") {
            Some(Value::Null) => None,
            Some(Value::String(cursor)) if cursor.is_empty() => None,
            Some(Value::String(cursor)) => Some(cursor.clone()),
            Some(other) => {
                return Err(format!("next_page is {}, expected a string or null", kind(other)));
            }
            None => return Err("missing field `next_page`".to_string()),
        };

        Ok(Self {
            records,
            page,
            max_page,
            next_page,
        })
    }
}

fn required_count(payload: &Map<String, Value>, field: &str) -> Result<u64, String> {
    match payload.get(field) {
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("{} is {}, expected a non-negative integer", field, kind(value))),
        None => Err(format!("missing field `{}`", field)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
