use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use utoipa::ToSchema;

use crate::core::Row;
use crate::errors::DataTablesError;
use crate::filtering::column_index::ColumnIndex;
use crate::filtering::pagination::PaginationWindow;
use crate::filtering::query_parser;

/// Default page size when the client sends no `length`.
pub const DEFAULT_LENGTH: i64 = 10;

/// Per-endpoint parsing configuration.
///
/// `start` is always 0-based and defaults to 0; only the page size default is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataTableConfig {
    /// Page size used when the request carries no `length` key
    pub default_length: i64,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            default_length: DEFAULT_LENGTH,
        }
    }
}

/// Sort direction of one `order[j]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// The `columns[i][data]` key of a column.
///
/// DataTables sends either a property name or, for array-sourced tables, the integer
/// position. Columns without a `data` key fall back to their position in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataKey {
    Named(String),
    Index(usize),
}

impl DataKey {
    /// Key used for lookups and for sort keys handed to the store
    #[must_use]
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Named(name) => Cow::Borrowed(name),
            Self::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// A search term, either the global `search[...]` box or a column's `columns[i][search][...]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchTerm {
    pub value: String,
    pub regex: bool,
}

impl SearchTerm {
    #[must_use]
    pub fn new(value: impl Into<String>, regex: bool) -> Self {
        Self {
            value: value.into(),
            regex,
        }
    }

    /// Empty search values never produce a clause
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Metadata the client sends for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRequest {
    /// Position `i` in `columns[i]`
    pub index: usize,
    pub data: DataKey,
    pub name: Option<String>,
    pub searchable: bool,
    pub orderable: bool,
    pub search: SearchTerm,
}

impl ColumnRequest {
    /// A searchable, orderable column keyed by `data`
    #[must_use]
    pub fn new(index: usize, data: impl Into<String>) -> Self {
        Self {
            index,
            data: DataKey::Named(data.into()),
            name: None,
            searchable: true,
            orderable: true,
            search: SearchTerm::default(),
        }
    }
}

/// One `order[j]` entry: a reference into `columns` plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub column: usize,
    pub direction: Direction,
}

/// A fully parsed DataTables server-side processing request.
///
/// Built once at the boundary by [`DataTablesRequest::parse`]; the filter and order builders
/// only ever see this typed form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTablesRequest {
    /// Opaque correlation token, echoed back verbatim
    pub draw: Option<String>,
    /// Columns as declared by the client; the parser sorts them by wire index
    pub columns: Vec<ColumnRequest>,
    /// Sort entries in client priority order
    pub order: Vec<OrderRequest>,
    pub search: SearchTerm,
    pub window: PaginationWindow,
}

impl DataTablesRequest {
    /// Parse a raw (form-urlencoded) query string with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DataTablesError::MalformedRequest`] when the query violates the wire protocol.
    pub fn parse(query: &str) -> Result<Self, DataTablesError> {
        Self::parse_with(query, &DataTableConfig::default())
    }

    /// Parse a raw query string using endpoint-specific defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DataTablesError::MalformedRequest`] when the query violates the wire protocol.
    pub fn parse_with(query: &str, config: &DataTableConfig) -> Result<Self, DataTablesError> {
        query_parser::parse_query(query, config)
    }

    /// Column metadata by wire index. Does not rely on `columns` being sorted.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnRequest> {
        self.columns.iter().find(|column| column.index == index)
    }

    /// Build the data-key and name lookups for this request
    #[must_use]
    pub fn column_index(&self) -> ColumnIndex {
        ColumnIndex::new(&self.columns)
    }
}

/// Semantic column names an endpoint exposes, in output order.
///
/// This is fixed per endpoint and is the contract between the translation core and the
/// store: only these columns are searched and returned, and they become the row keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSpec(Vec<String>);

impl ColumnSpec {
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Response envelope expected by the DataTables client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataTablesResponse {
    /// Echo of the request's `draw` token
    pub draw: Option<String>,
    /// Number of records before any filtering
    pub records_total: u64,
    /// Number of records after filtering, before pagination
    pub records_filtered: u64,
    /// Rows of the requested page, keyed by the endpoint's column names
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Row>,
}

impl DataTablesResponse {
    /// Package counts and rows. `draw` is not validated.
    #[must_use]
    pub fn assemble(
        draw: Option<String>,
        records_total: u64,
        records_filtered: u64,
        data: Vec<Row>,
    ) -> Self {
        Self {
            draw,
            records_total,
            records_filtered,
            data,
        }
    }
}
