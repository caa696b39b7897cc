//! Timetable dataset: named sections of loosely-shaped rows.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One timetable row: column name to scalar display value.
/// Column sets may differ between rows of the same section.
pub type Row = Map<String, Value>;

/// Sections keep the order in which the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Dataset {
    sections: Vec<(String, Vec<Row>)>,
}

impl Dataset {
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn first_section(&self) -> Option<&str> {
        self.section_names().next()
    }

    pub fn rows(&self, section: &str) -> Option<&[Row]> {
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn contains(&self, section: &str) -> bool {
        self.rows(section).is_some()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for Dataset {
    type Error = String;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut sections = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let rows = match value {
                Value::Null => Vec::new(),
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(row) => Ok(row),
                        other => Err(format!(
                            "row {} of section '{}' is not an object: {}",
                            i, name, other
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                other => {
                    return Err(format!(
                        "section '{}' is not a list of rows: {}",
                        name, other
                    ))
                }
            };
            sections.push((name, rows));
        }
        Ok(Self { sections })
    }
}
