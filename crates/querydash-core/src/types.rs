use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One parsed data line, keyed by header name.
pub type Row = HashMap<String, String>;

/// Headers plus rows parsed from a single query response.
///
/// Every row carries a value for every header (possibly empty). The result is
/// never mutated after parsing; an empty result doubles as the sentinel for a
/// failed or column-less query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    headers: Vec<String>,
    data: Vec<Row>,
}

impl QueryResult {
    pub fn new(headers: Vec<String>, data: Vec<Row>) -> Self {
        Self { headers, data }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn data(&self) -> &[Row] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.data.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        self.data
            .get(row)
            .and_then(|r| r.get(header))
            .map(String::as_str)
    }

    /// Values of the row in header order, for tabular display.
    pub fn ordered_values(&self, row: usize) -> Option<Vec<&str>> {
        let r = self.data.get(row)?;
        Some(
            self.headers
                .iter()
                .map(|h| r.get(h).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.headers, self.data)
    }
}
