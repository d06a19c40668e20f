use axum::{
    Json, Router,
    extract::{FromRequestParts, RawQuery, State},
    http::request::Parts,
    routing::get,
};
use std::sync::Arc;

use crate::core::DataTableEndpoint;
use crate::errors::DataTablesError;
use crate::models::{DataTablesRequest, DataTablesResponse};

/// Extract a request from the query string with the default [`DataTableConfig`].
///
/// [`DataTableConfig`]: crate::models::DataTableConfig
impl<S: Send + Sync> FromRequestParts<S> for DataTablesRequest {
    type Rejection = DataTablesError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::parse(parts.uri.query().unwrap_or_default())
    }
}

/// GET handler serving one endpoint.
///
/// Parse failures answer 400, a missing data source or a store failure answer 500, each with
/// a `{"error": ...}` body.
///
/// # Errors
///
/// See [`DataTablesError`].
pub async fn datatable_handler<T>(
    State(endpoint): State<Arc<T>>,
    RawQuery(query): RawQuery,
) -> Result<Json<DataTablesResponse>, DataTablesError>
where
    T: DataTableEndpoint + 'static,
{
    let request =
        DataTablesRequest::parse_with(query.as_deref().unwrap_or_default(), &endpoint.config())?;
    tracing::debug!(
        draw = request.draw.as_deref(),
        columns = request.columns.len(),
        "Handling DataTables request"
    );

    let response = endpoint.handle(&request).await?;
    Ok(Json(response))
}

/// Router serving `endpoint` with GET at `path`.
pub fn datatable_router<T>(path: &str, endpoint: T) -> Router
where
    T: DataTableEndpoint + 'static,
{
    Router::new()
        .route(path, get(datatable_handler::<T>))
        .with_state(Arc::new(endpoint))
}
