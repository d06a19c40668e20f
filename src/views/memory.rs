//! In-memory [`DataView`] over JSON rows.
//!
//! Useful for small reference tables, rows fetched from a remote API, and tests. Matching
//! works on the text form of each value: strings as-is, numbers and booleans via their
//! display form, `null` never matches.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

use crate::core::{DataView, Row};
use crate::errors::DataTablesError;
use crate::filtering::{ColumnMatch, MatchMode, OrderKey, PaginationWindow, Predicate};
use crate::models::{ColumnSpec, Direction};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryView {
    rows: Vec<Row>,
}

impl MemoryView {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build a view from JSON values; anything that is not an object is skipped
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Predicate with its regexes compiled once
enum Matcher {
    Contains { column: String, needle: String },
    Regex { column: String, regex: Regex },
    Any(Vec<Matcher>),
    All(Vec<Matcher>),
}

impl Matcher {
    fn compile(predicate: &Predicate) -> Result<Self, DataTablesError> {
        Ok(match predicate {
            Predicate::Match(ColumnMatch { column, value, mode: MatchMode::Contains }) => {
                Self::Contains {
                    column: column.clone(),
                    needle: value.to_lowercase(),
                }
            }
            Predicate::Match(ColumnMatch { column, value, mode: MatchMode::Regex }) => {
                let regex = RegexBuilder::new(value)
                    .case_insensitive(true)
                    .build()
                    .map_err(DataTablesError::data_source)?;
                Self::Regex {
                    column: column.clone(),
                    regex,
                }
            }
            Predicate::Any(clauses) => {
                Self::Any(clauses.iter().map(Self::compile).collect::<Result<_, _>>()?)
            }
            Predicate::All(clauses) => {
                Self::All(clauses.iter().map(Self::compile).collect::<Result<_, _>>()?)
            }
        })
    }

    fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Contains { column, needle } => {
                text_of(row.get(column)).is_some_and(|text| text.to_lowercase().contains(needle))
            }
            Self::Regex { column, regex } => {
                text_of(row.get(column)).is_some_and(|text| regex.is_match(&text))
            }
            Self::Any(clauses) => clauses.iter().any(|clause| clause.matches(row)),
            Self::All(clauses) => clauses.iter().all(|clause| clause.matches(row)),
        }
    }
}

/// Searchable text of a value; missing and null values have none
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Rank used when two values have different JSON types
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => l
                .as_f64()
                .partial_cmp(&r.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            left.to_string().cmp(&right.to_string())
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn compare_rows(left: &Row, right: &Row, keys: &[OrderKey]) -> Ordering {
    keys.iter()
        .map(|key| {
            let ordering = compare_values(
                left.get(&key.column).unwrap_or(&Value::Null),
                right.get(&key.column).unwrap_or(&Value::Null),
            );
            match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl DataView for MemoryView {
    async fn count(&self) -> Result<u64, DataTablesError> {
        u64::try_from(self.rows.len()).map_err(DataTablesError::data_source)
    }

    fn filter(mut self, predicate: &Predicate) -> Result<Self, DataTablesError> {
        let matcher = Matcher::compile(predicate)?;
        self.rows.retain(|row| matcher.matches(row));
        Ok(self)
    }

    fn order_by(mut self, keys: &[OrderKey]) -> Result<Self, DataTablesError> {
        // stable, so rows equal on every key keep their original order
        self.rows.sort_by(|left, right| compare_rows(left, right, keys));
        Ok(self)
    }

    fn project(mut self, columns: &ColumnSpec) -> Result<Self, DataTablesError> {
        for row in &mut self.rows {
            *row = columns
                .iter()
                .map(|column| {
                    let value = row.get(column).cloned().unwrap_or(Value::Null);
                    (column.to_string(), value)
                })
                .collect();
        }
        Ok(self)
    }

    fn slice(mut self, window: &PaginationWindow) -> Result<Self, DataTablesError> {
        let bounds = window.bounds(self.rows.len());
        self.rows.truncate(bounds.end);
        self.rows.drain(..bounds.start);
        Ok(self)
    }

    async fn materialize(self) -> Result<Vec<Row>, DataTablesError> {
        Ok(self.rows)
    }
}
