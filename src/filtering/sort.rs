use crate::models::{DataTablesRequest, Direction};

/// One sort key handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    /// The referenced column's `data` key
    pub column: String,
    pub direction: Direction,
}

impl OrderKey {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Build sort keys from the request's `order` entries, keeping client priority.
///
/// Entries are resolved against every column the client declared, not only the endpoint's
/// columns. Entries pointing at unknown or `orderable=false` columns are dropped.
#[must_use]
pub fn build_order(request: &DataTablesRequest) -> Vec<OrderKey> {
    let keys: Vec<OrderKey> = request
        .order
        .iter()
        .filter_map(|entry| {
            let column = request.column(entry.column)?;
            column
                .orderable
                .then(|| OrderKey::new(column.data.as_key(), entry.direction))
        })
        .collect();

    tracing::debug!(keys = ?keys, "Built DataTables sort keys");
    keys
}
