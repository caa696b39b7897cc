use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::dataset::{Dataset, Row};

const DAY_COLUMN: &str = "Day";
const MISSING: &str = "-";

/// Render model of one section, derived purely from its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionView {
    Table {
        section: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Empty {
        section: String,
        message: String,
    },
}

pub fn present(dataset: &Dataset, active: &str) -> SectionView {
    let rows = dataset.rows(active).unwrap_or_default();
    if rows.is_empty() {
        return SectionView::Empty {
            section: active.to_string(),
            message: empty_message(active),
        };
    }

    let columns = columns(rows);
    let cells = rows
        .iter()
        .map(|row| columns.iter().map(|c| format_cell(row.get(c))).collect())
        .collect();
    SectionView::Table {
        section: active.to_string(),
        columns,
        rows: cells,
    }
}

pub fn empty_message(section: &str) -> String {
    format!("No rows found for {}", section)
}

/// Union of row keys: "Day" first, the rest by `collate`.
pub fn columns(rows: &[Row]) -> Vec<String> {
    let keys: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys()).map(String::as_str).collect();
    let mut columns: Vec<String> = keys.into_iter().map(str::to_string).collect();
    columns.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        (DAY_COLUMN, DAY_COLUMN) => Ordering::Equal,
        (DAY_COLUMN, _) => Ordering::Less,
        (_, DAY_COLUMN) => Ordering::Greater,
        _ => collate(a, b),
    });
    columns
}

/// Locale-style ordering: case-insensitive first, then lowercase before
/// uppercase.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) if s == "NaN" => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
