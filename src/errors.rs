//! # Error Handling for DataTables Endpoints
//!
//! Every failure surfaced by this crate is a [`DataTablesError`]. There are exactly three kinds:
//!
//! - **Malformed request**: the client violated the wire protocol (bad bracket nesting,
//!   non-numeric indices, negative `start`, unknown sort direction). Returned as `400`.
//! - **Missing data source**: the endpoint was wired up without a way to obtain a data view.
//!   This is a configuration error, returned as `500` and never retried.
//! - **Data source**: the underlying store failed (connection, timeout, invalid regex). The
//!   original error is kept as the [`std::error::Error::source`] and logged, never sent to
//!   the client.
//!
//! Request columns that cannot be resolved are not errors; they are skipped while building
//! filters and sort keys. A store that does not know one of the endpoint's own columns
//! reports that as a data source error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use serverside_datatable::DataTablesError;
//!
//! async fn my_handler(
//!     request: DataTablesRequest,
//! ) -> Result<Json<DataTablesResponse>, DataTablesError> {
//!     let view = EntityView::new(person::Entity::find(), db.clone());
//!     let response = process(&request, &columns, view).await?;
//!     Ok(Json(response))
//! }
//! ```
//!
//! ## Logging
//!
//! Internal errors are logged with `tracing` when converted into a response. Install a
//! subscriber in the application to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt().with_target(false).compact().init();
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Boxed error produced by a data view implementation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for request parsing and query execution
#[derive(Debug)]
pub enum DataTablesError {
    /// 400 Bad Request - the wire request could not be parsed
    MalformedRequest {
        /// User-facing description of the protocol violation
        message: String,
    },

    /// 500 Internal Server Error - endpoint has no data view configured
    MissingDataSource {
        /// Name of the endpoint that is missing its data source
        endpoint: String,
    },

    /// 500 Internal Server Error - the data view failed (details logged, not exposed)
    DataSource {
        /// User-facing generic message
        message: String,
        /// Error raised by the store
        internal: BoxError,
    },
}

impl DataTablesError {
    /// Create a malformed request error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(DataTablesError::malformed("order[0][column] must be an integer"));
    /// ```
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Create a missing data source error for the named endpoint
    pub fn missing_data_source(endpoint: impl Into<String>) -> Self {
        Self::MissingDataSource {
            endpoint: endpoint.into(),
        }
    }

    /// Wrap a store error. The original error stays reachable through `source()`.
    ///
    /// # Example
    /// ```rust,ignore
    /// let rows = select.all(db).await.map_err(DataTablesError::data_source)?;
    /// ```
    pub fn data_source(err: impl Into<BoxError>) -> Self {
        Self::DataSource {
            message: "A data source error occurred".to_string(),
            internal: err.into(),
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MissingDataSource { .. } | Self::DataSource { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::MalformedRequest { message } => format!("Malformed request: {message}"),
            Self::MissingDataSource { .. } => "Data source is not configured".to_string(),
            Self::DataSource { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to the client)
    fn log_internal(&self) {
        match self {
            Self::MissingDataSource { endpoint } => {
                tracing::error!(
                    endpoint = %endpoint,
                    "Endpoint has no data source: provide a data view or override data_view()"
                );
            }
            Self::DataSource { internal, .. } => {
                tracing::error!(
                    error = %internal,
                    "Data source error occurred"
                );
            }
            Self::MalformedRequest { .. } => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Rejected DataTables request"
                );
            }
        }
    }
}

/// Error body sent to the client. DataTables displays the `error` field as-is.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for DataTablesError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for DataTablesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDataSource { endpoint } => {
                write!(f, "{endpoint} is missing a data source")
            }
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for DataTablesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DataSource { internal, .. } => Some(internal.as_ref()),
            _ => None,
        }
    }
}

/// Every `DbErr` is a store failure from the point of view of the pipeline.
impl From<DbErr> for DataTablesError {
    fn from(err: DbErr) -> Self {
        Self::data_source(err)
    }
}
