//! Typed query pipeline.
//!
//! A [`QueryContext`] moves through fixed stages and each stage only exposes the next step:
//!
//! ```text
//! new (count total) -> filter (count filtered) -> order -> project -> paginate -> materialize
//! ```
//!
//! `records_total` is captured before any filter and `records_filtered` right after it, so
//! neither depends on ordering, projection or the page window.

use std::marker::PhantomData;

use crate::core::traits::{DataView, Row};
use crate::errors::DataTablesError;
use crate::filtering::{OrderKey, PaginationWindow, Predicate};
use crate::models::ColumnSpec;

/// Stage: nothing applied yet, total count known
pub struct Unfiltered;
/// Stage: filter applied, filtered count known
pub struct Filtered;
/// Stage: sort keys applied
pub struct Ordered;
/// Stage: output columns selected
pub struct Projected;
/// Stage: page window applied
pub struct Paginated;

/// Query state for one request. Never shared between requests.
pub struct QueryContext<V, S> {
    view: V,
    total_records: u64,
    total_filtered_records: u64,
    _stage: PhantomData<S>,
}

/// Rows of the requested page plus the counts captured along the way
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub total_records: u64,
    pub total_filtered_records: u64,
}

impl<V, S> QueryContext<V, S> {
    fn into_stage<T>(self) -> QueryContext<V, T> {
        QueryContext {
            view: self.view,
            total_records: self.total_records,
            total_filtered_records: self.total_filtered_records,
            _stage: PhantomData,
        }
    }

    fn map_view<T>(
        self,
        step: impl FnOnce(V) -> Result<V, DataTablesError>,
    ) -> Result<QueryContext<V, T>, DataTablesError> {
        Ok(QueryContext {
            view: step(self.view)?,
            total_records: self.total_records,
            total_filtered_records: self.total_filtered_records,
            _stage: PhantomData,
        })
    }

    #[must_use]
    pub const fn total_records(&self) -> u64 {
        self.total_records
    }

    #[must_use]
    pub const fn total_filtered_records(&self) -> u64 {
        self.total_filtered_records
    }
}

impl<V: DataView> QueryContext<V, Unfiltered> {
    /// Start a pipeline, counting every record of the view.
    ///
    /// # Errors
    ///
    /// Propagates the view's count failure.
    pub async fn new(view: V) -> Result<Self, DataTablesError> {
        let total_records = view.count().await?;
        tracing::debug!(total_records, "Counted unfiltered records");
        Ok(Self {
            view,
            total_records,
            total_filtered_records: total_records,
            _stage: PhantomData,
        })
    }

    /// Apply the predicate, if any, and count what remains.
    ///
    /// # Errors
    ///
    /// Propagates the view's filter or count failure.
    pub async fn filter(
        self,
        predicate: Option<&Predicate>,
    ) -> Result<QueryContext<V, Filtered>, DataTablesError> {
        let Some(predicate) = predicate else {
            return Ok(self.into_stage());
        };
        let Self { view, total_records, .. } = self;
        let view = view.filter(predicate)?;
        let total_filtered_records = view.count().await?;
        tracing::debug!(total_records, total_filtered_records, "Counted filtered records");
        Ok(QueryContext {
            view,
            total_records,
            total_filtered_records,
            _stage: PhantomData,
        })
    }
}

impl<V: DataView> QueryContext<V, Filtered> {
    /// Apply sort keys. No keys leaves the store's natural order.
    ///
    /// # Errors
    ///
    /// Propagates the view's ordering failure.
    pub fn order(self, keys: &[OrderKey]) -> Result<QueryContext<V, Ordered>, DataTablesError> {
        if keys.is_empty() {
            return Ok(self.into_stage());
        }
        self.map_view(|view| view.order_by(keys))
    }
}

impl<V: DataView> QueryContext<V, Ordered> {
    /// Restrict rows to the endpoint's columns; row keys are the column names verbatim.
    ///
    /// # Errors
    ///
    /// Propagates the view's projection failure.
    pub fn project(
        self,
        columns: &ColumnSpec,
    ) -> Result<QueryContext<V, Projected>, DataTablesError> {
        self.map_view(|view| view.project(columns))
    }
}

impl<V: DataView> QueryContext<V, Projected> {
    /// Apply the page window. `start=0, length=-1` leaves the view untouched.
    ///
    /// # Errors
    ///
    /// Propagates the view's slicing failure.
    pub fn paginate(
        self,
        window: &PaginationWindow,
    ) -> Result<QueryContext<V, Paginated>, DataTablesError> {
        if window.is_unbounded() {
            return Ok(self.into_stage());
        }
        tracing::debug!(start = window.start, limit = ?window.limit(), "Applying page window");
        self.map_view(|view| view.slice(window))
    }
}

impl<V: DataView> QueryContext<V, Paginated> {
    /// Execute the query.
    ///
    /// # Errors
    ///
    /// Propagates the view's execution failure.
    pub async fn materialize(self) -> Result<QueryOutput, DataTablesError> {
        let rows = self.view.materialize().await?;
        tracing::debug!(rows = rows.len(), "Materialized page");
        Ok(QueryOutput {
            rows,
            total_records: self.total_records,
            total_filtered_records: self.total_filtered_records,
        })
    }
}
