//! Lightweight CSV parsing for query responses.
//!
//! Fields are split on every comma and lose at most one surrounding double
//! quote on each side. Quoted commas, escaped quotes and multi-line fields are
//! not recognised.

use crate::types::{QueryResult, Row};

pub fn parse(text: &str) -> QueryResult {
    let mut lines = text
        .lines()
        .filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(line) => split_fields(line),
        None => return QueryResult::empty(),
    };

    let data = lines.map(|line| build_row(&headers, line)).collect();
    QueryResult::new(headers, data)
}

fn build_row(headers: &[String], line: &str) -> Row {
    let values = split_fields(line);
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let value = values.get(idx).cloned().unwrap_or_default();
            (header.clone(), value)
        })
        .collect()
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| strip_quotes(f).to_string()).collect()
}

fn strip_quotes(field: &str) -> &str {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}
