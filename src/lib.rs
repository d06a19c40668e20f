//! # serverside-datatable
//!
//! Server-side processing for the DataTables client widget: parse the widget's query string,
//! turn its search, order and paging parameters into a query over a data source, and answer
//! with the `{draw, recordsTotal, recordsFiltered, data}` envelope.
//!
//! ## Main Components
//!
//! - **[`DataTablesRequest`]**: the parsed wire request
//! - **[`DataView`]**: the seam to a store, implemented by [`EntityView`] (sea-orm) and
//!   [`MemoryView`] (JSON rows)
//! - **[`process`]**: filter, count, order, project and paginate one request
//! - **[`DataTableEndpoint`]** and [`datatable_router`]: serve an endpoint over axum
//!
//! ## Usage
//!
//! ```rust,ignore
//! use serverside_datatable::{ColumnSpec, DataTablesRequest, MemoryView, process};
//!
//! let request = DataTablesRequest::parse(
//!     "draw=1&columns[0][data]=name&search[value]=jo&start=0&length=10",
//! )?;
//! let view = MemoryView::from_values(rows);
//! let response = process(&request, &ColumnSpec::new(["name"]), view).await?;
//! ```

pub mod core;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod routes;
pub mod views;

pub use crate::core::{
    DataTableEndpoint, DataView, QueryContext, QueryOutput, Row, execute, process, process_with,
};
pub use errors::{BoxError, DataTablesError};
pub use filtering::{OrderKey, PageLength, PaginationWindow, Predicate};
pub use models::{
    ColumnRequest, ColumnSpec, DataKey, DataTableConfig, DataTablesRequest, DataTablesResponse,
    Direction, OrderRequest, SearchTerm,
};
pub use routes::{datatable_handler, datatable_router};
pub use views::{EntityView, MemoryView};
#[cfg(feature = "sqlite")]
pub use views::connect_sqlite;
