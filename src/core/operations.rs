//! # DataTable Endpoints
//!
//! [`process`] runs one request against one data view. [`DataTableEndpoint`] packages the
//! pieces an HTTP endpoint needs (its columns, where its data comes from, an optional row
//! hook) so a router can serve it with [`datatable_handler`](crate::routes::datatable_handler).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use serverside_datatable::{ColumnSpec, DataTableEndpoint, DataTablesError, EntityView, Row};
//! use async_trait::async_trait;
//!
//! pub struct PeopleTable {
//!     db: DatabaseConnection,
//! }
//!
//! #[async_trait]
//! impl DataTableEndpoint for PeopleTable {
//!     type View = EntityView<person::Entity>;
//!
//!     fn columns(&self) -> ColumnSpec {
//!         ColumnSpec::new(["id", "first_name", "last_name"])
//!     }
//!
//!     async fn data_view(&self) -> Result<Self::View, DataTablesError> {
//!         Ok(EntityView::new(person::Entity::find(), self.db.clone()))
//!     }
//!
//!     // Enrich rows after counting, e.g. with a computed display name
//!     async fn transform_rows(&self, mut rows: Vec<Row>) -> Result<Vec<Row>, DataTablesError> {
//!         for row in &mut rows {
//!             let full = format!("{} {}", row["first_name"], row["last_name"]);
//!             row.insert("full_name".into(), full.into());
//!         }
//!         Ok(rows)
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::core::pipeline::{QueryContext, QueryOutput};
use crate::core::traits::{DataView, Row};
use crate::errors::DataTablesError;
use crate::filtering::{build_filter, build_order};
use crate::models::{ColumnSpec, DataTableConfig, DataTablesRequest, DataTablesResponse};

/// Run the filter, order, project and paginate stages and return the page with its counts.
///
/// # Errors
///
/// Propagates any [`DataTablesError::DataSource`] raised by the view.
pub async fn execute<V: DataView>(
    request: &DataTablesRequest,
    columns: &ColumnSpec,
    view: V,
) -> Result<QueryOutput, DataTablesError> {
    let predicate = build_filter(columns, request);
    let order = build_order(request);

    QueryContext::new(view)
        .await?
        .filter(predicate.as_ref())
        .await?
        .order(&order)?
        .project(columns)?
        .paginate(&request.window)?
        .materialize()
        .await
}

/// Answer a request from a data view.
///
/// # Errors
///
/// Propagates any [`DataTablesError::DataSource`] raised by the view.
pub async fn process<V: DataView>(
    request: &DataTablesRequest,
    columns: &ColumnSpec,
    view: V,
) -> Result<DataTablesResponse, DataTablesError> {
    process_with(request, columns, view, |rows| rows).await
}

/// Answer a request, passing the page's rows through `transform_rows` before assembly.
/// Counts are unaffected by the transform.
///
/// # Errors
///
/// Propagates any [`DataTablesError::DataSource`] raised by the view.
pub async fn process_with<V, F>(
    request: &DataTablesRequest,
    columns: &ColumnSpec,
    view: V,
    transform_rows: F,
) -> Result<DataTablesResponse, DataTablesError>
where
    V: DataView,
    F: FnOnce(Vec<Row>) -> Vec<Row> + Send,
{
    let output = execute(request, columns, view).await?;
    Ok(DataTablesResponse::assemble(
        request.draw.clone(),
        output.total_records,
        output.total_filtered_records,
        transform_rows(output.rows),
    ))
}

/// A server-side DataTables endpoint.
///
/// Only [`columns`](Self::columns) is required. Without an overridden
/// [`data_view`](Self::data_view) every request fails with
/// [`DataTablesError::MissingDataSource`].
#[async_trait]
pub trait DataTableEndpoint: Send + Sync {
    /// Store the endpoint reads from
    type View: DataView;

    /// Columns that are searchable, returned, and used as row keys
    fn columns(&self) -> ColumnSpec;

    /// Parsing defaults for this endpoint
    fn config(&self) -> DataTableConfig {
        DataTableConfig::default()
    }

    /// Obtain a fresh, unfiltered view for one request
    ///
    /// # Errors
    /// Defaults to [`DataTablesError::MissingDataSource`]
    async fn data_view(&self) -> Result<Self::View, DataTablesError> {
        Err(DataTablesError::missing_data_source(std::any::type_name::<Self>()))
    }

    /// Hook called with the materialized page before the response is assembled
    ///
    /// # Errors
    /// Return an error to abort the request
    async fn transform_rows(&self, rows: Vec<Row>) -> Result<Vec<Row>, DataTablesError> {
        Ok(rows)
    }

    /// Answer one parsed request
    ///
    /// # Errors
    /// Missing data source, store failures and hook failures are returned unchanged
    async fn handle(
        &self,
        request: &DataTablesRequest,
    ) -> Result<DataTablesResponse, DataTablesError> {
        let view = self.data_view().await?;
        let columns = self.columns();
        let output = execute(request, &columns, view).await?;
        let rows = self.transform_rows(output.rows).await?;

        Ok(DataTablesResponse::assemble(
            request.draw.clone(),
            output.total_records,
            output.total_filtered_records,
            rows,
        ))
    }
}
