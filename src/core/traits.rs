use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::DataTablesError;
use crate::filtering::{OrderKey, PaginationWindow, Predicate};
use crate::models::ColumnSpec;

/// One materialized record, keyed by column name
pub type Row = Map<String, Value>;

/// A lazily built query over some store.
///
/// Each step consumes the view and returns a narrower one, so a pipeline is a chain of
/// independent calls that can be interrupted between any two of them. Only `count` and
/// `materialize` touch the store; the other steps are expected to only build the query.
///
/// Implementations report store failures as [`DataTablesError::DataSource`]; the pipeline
/// passes them through unchanged and never retries.
#[async_trait]
pub trait DataView: Sized + Send + Sync {
    /// Number of records currently selected
    async fn count(&self) -> Result<u64, DataTablesError>;

    /// Keep only records matching the predicate
    fn filter(self, predicate: &Predicate) -> Result<Self, DataTablesError>;

    /// Sort by the keys, first key first
    fn order_by(self, keys: &[OrderKey]) -> Result<Self, DataTablesError>;

    /// Restrict records to exactly these columns, in this order
    fn project(self, columns: &ColumnSpec) -> Result<Self, DataTablesError>;

    /// Skip `window.start` records and keep at most `window.length`
    fn slice(self, window: &PaginationWindow) -> Result<Self, DataTablesError>;

    /// Execute the query and return its rows
    async fn materialize(self) -> Result<Vec<Row>, DataTablesError>;
}
