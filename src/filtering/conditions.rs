use crate::filtering::column_index::ColumnIndex;
use crate::models::{ColumnSpec, DataTablesRequest, SearchTerm};

/// How a clause compares a column against the search value. Both modes are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Substring match
    Contains,
    /// Pattern is handed to the store's regex engine
    Regex,
}

impl MatchMode {
    const fn for_term(term: &SearchTerm) -> Self {
        if term.regex { Self::Regex } else { Self::Contains }
    }
}

/// `column MATCHES value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMatch {
    pub column: String,
    pub value: String,
    pub mode: MatchMode,
}

impl ColumnMatch {
    fn new(column: &str, term: &SearchTerm) -> Self {
        Self {
            column: column.to_string(),
            value: term.value.clone(),
            mode: MatchMode::for_term(term),
        }
    }
}

/// Store-independent filter expression produced from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Match(ColumnMatch),
    /// At least one clause holds
    Any(Vec<Predicate>),
    /// Every clause holds
    All(Vec<Predicate>),
}

impl Predicate {
    /// OR the clauses together; a single clause is returned as-is
    fn any(mut clauses: Vec<Self>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::Any(clauses)),
        }
    }

    /// AND the clauses together; a single clause is returned as-is
    fn all(mut clauses: Vec<Self>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::All(clauses)),
        }
    }

    /// Every column referenced anywhere in the expression, in clause order
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Match(clause) => vec![clause.column.as_str()],
            Self::Any(clauses) | Self::All(clauses) => {
                clauses.iter().flat_map(Self::columns).collect()
            }
        }
    }
}

/// Build the filter for a request, or `None` when nothing should be filtered.
///
/// The global search term is OR-ed across every searchable column of `columns`; each active
/// per-column term is AND-ed; the two groups are AND-ed together. Columns missing from the
/// request or flagged `searchable=false` take part in neither group.
#[must_use]
pub fn build_filter(columns: &ColumnSpec, request: &DataTablesRequest) -> Option<Predicate> {
    build_filter_with_index(columns, request, &request.column_index())
}

/// Same as [`build_filter`], reusing an existing [`ColumnIndex`].
#[must_use]
pub fn build_filter_with_index(
    columns: &ColumnSpec,
    request: &DataTablesRequest,
    index: &ColumnIndex,
) -> Option<Predicate> {
    let mut global_clauses = Vec::new();
    let mut column_clauses = Vec::new();

    for column in columns.iter() {
        let Some(column_request) = index
            .lookup_index_by_data(column)
            .and_then(|i| request.column(i))
        else {
            continue;
        };

        if !column_request.searchable {
            continue;
        }

        if request.search.is_active() {
            global_clauses.push(Predicate::Match(ColumnMatch::new(column, &request.search)));
        }

        if column_request.search.is_active() {
            column_clauses.push(Predicate::Match(ColumnMatch::new(
                column,
                &column_request.search,
            )));
        }
    }

    tracing::debug!(
        global_clauses = global_clauses.len(),
        column_clauses = column_clauses.len(),
        "Built DataTables filter"
    );

    let groups = [Predicate::any(global_clauses), Predicate::all(column_clauses)];
    Predicate::all(groups.into_iter().flatten().collect())
}
