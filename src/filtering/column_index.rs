use std::collections::HashMap;

use crate::models::ColumnRequest;

/// Lookups from a column's `data` key (or `name` alias) to its wire index.
///
/// Columns without a `data` key are indexed under their position, so every column in the
/// request is reachable. When two columns share a key the later one wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    by_data: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    #[must_use]
    pub fn new(columns: &[ColumnRequest]) -> Self {
        let mut index = Self::default();
        for column in columns {
            index
                .by_data
                .insert(column.data.as_key().into_owned(), column.index);
            if let Some(name) = &column.name {
                index.by_name.insert(name.clone(), column.index);
            }
        }
        index
    }

    #[must_use]
    pub fn lookup_index_by_data(&self, data: &str) -> Option<usize> {
        self.by_data.get(data).copied()
    }

    #[must_use]
    pub fn lookup_index_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}
