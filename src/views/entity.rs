use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};
use serde_json::Value;
use std::str::FromStr;

use crate::core::{DataView, Row};
use crate::errors::DataTablesError;
use crate::filtering::{ColumnMatch, MatchMode, OrderKey, PageLength, PaginationWindow, Predicate};
use crate::models::{ColumnSpec, Direction};

/// Row limit used when the client asks for every row from a non-zero offset; every backend
/// needs a LIMIT before it accepts an OFFSET.
const UNLIMITED_ROWS: u64 = i64::MAX.unsigned_abs();

/// Escape LIKE wildcards so the search value is matched literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// [`DataView`] over a sea-orm `Select`.
///
/// Every step only extends the `SELECT`; the database is queried by [`DataView::count`] and
/// [`DataView::materialize`]. Column names are resolved against the entity, so a name the
/// entity does not know surfaces as [`DataTablesError::DataSource`].
///
/// Regex search maps to `~*` on PostgreSQL, `REGEXP_LIKE(.., 'i')` on MySQL and `REGEXP` on
/// SQLite. SQLite's `UPPER` folds ASCII only, so a substring search for a non-ASCII term
/// also goes through `REGEXP` there. SQLite only has `REGEXP` when the connection
/// registers it; [`connect_sqlite`] opens such a connection.
pub struct EntityView<E: EntityTrait> {
    select: Select<E>,
    db: DatabaseConnection,
}

impl<E: EntityTrait> EntityView<E> {
    /// Wrap a query. `select` may already carry conditions, e.g. tenant scoping; those count
    /// towards `records_total`.
    #[must_use]
    pub fn new(select: Select<E>, db: DatabaseConnection) -> Self {
        Self { select, db }
    }

    #[must_use]
    pub fn from_entity(db: DatabaseConnection) -> Self {
        Self::new(E::find(), db)
    }
}

/// Open a SQLite database with the `REGEXP` function registered.
///
/// # Errors
///
/// Returns the connection error when the URL is invalid or the database cannot be opened.
#[cfg(feature = "sqlite")]
pub async fn connect_sqlite(url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    use sea_orm::sqlx::sqlite::SqliteConnectOptions;

    let mut options = sea_orm::ConnectOptions::new(url);
    options.map_sqlx_sqlite_opts(SqliteConnectOptions::with_regexp);
    let db = sea_orm::Database::connect(options).await?;
    tracing::debug!(url, "Opened SQLite connection with REGEXP support");
    Ok(db)
}

fn resolve_column<E: EntityTrait>(name: &str) -> Result<E::Column, DataTablesError> {
    E::Column::from_str(name).map_err(|_| {
        DataTablesError::data_source(format!(
            "unknown column `{name}` on `{}`",
            E::default().table_name()
        ))
    })
}

/// Column as text, so numbers and enums can be searched like strings
fn text_of(column: impl ColumnTrait, backend: DatabaseBackend) -> SimpleExpr {
    let text_type = match backend {
        DatabaseBackend::MySql => "CHAR",
        DatabaseBackend::Postgres | DatabaseBackend::Sqlite => "TEXT",
    };
    Expr::cast_as(Expr::col(column), Alias::new(text_type))
}

/// Case-insensitive `REGEXP`, evaluated by the `regex` crate registered on the connection
fn sqlite_regexp(text: SimpleExpr, pattern: &str) -> SimpleExpr {
    Expr::cust_with_exprs(
        "$1 REGEXP $2",
        [text, Expr::val(format!("(?i){pattern}")).into()],
    )
}

fn match_expr(
    column: impl ColumnTrait,
    clause: &ColumnMatch,
    backend: DatabaseBackend,
) -> SimpleExpr {
    let text = text_of(column, backend);
    match (clause.mode, backend) {
        // SQLite's UPPER leaves non-ASCII letters alone
        (MatchMode::Contains, DatabaseBackend::Sqlite) if !clause.value.is_ascii() => {
            sqlite_regexp(text, &regex::escape(&clause.value))
        }
        (MatchMode::Contains, _) => {
            let pattern = format!("%{}%", escape_like_wildcards(&clause.value.to_uppercase()));
            SimpleExpr::FunctionCall(Func::upper(text))
                .like(LikeExpr::new(pattern).escape('\\'))
        }
        (MatchMode::Regex, DatabaseBackend::Postgres) => Expr::cust_with_exprs(
            "$1 ~* $2",
            [text, Expr::val(clause.value.clone()).into()],
        ),
        (MatchMode::Regex, DatabaseBackend::MySql) => Expr::cust_with_exprs(
            "REGEXP_LIKE($1, $2, 'i')",
            [text, Expr::val(clause.value.clone()).into()],
        ),
        (MatchMode::Regex, DatabaseBackend::Sqlite) => sqlite_regexp(text, &clause.value),
    }
}

fn build_condition<E: EntityTrait>(
    predicate: &Predicate,
    backend: DatabaseBackend,
) -> Result<Condition, DataTablesError> {
    match predicate {
        Predicate::Match(clause) => {
            let column = resolve_column::<E>(&clause.column)?;
            Ok(Condition::all().add(match_expr(column, clause, backend)))
        }
        Predicate::Any(clauses) => clauses.iter().try_fold(Condition::any(), |condition, p| {
            Ok(condition.add(build_condition::<E>(p, backend)?))
        }),
        Predicate::All(clauses) => clauses.iter().try_fold(Condition::all(), |condition, p| {
            Ok(condition.add(build_condition::<E>(p, backend)?))
        }),
    }
}

#[async_trait]
impl<E> DataView for EntityView<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    async fn count(&self) -> Result<u64, DataTablesError> {
        Ok(PaginatorTrait::count(self.select.clone(), &self.db).await?)
    }

    fn filter(mut self, predicate: &Predicate) -> Result<Self, DataTablesError> {
        let condition = build_condition::<E>(predicate, self.db.get_database_backend())?;
        self.select = self.select.filter(condition);
        Ok(self)
    }

    fn order_by(mut self, keys: &[OrderKey]) -> Result<Self, DataTablesError> {
        for key in keys {
            let column = resolve_column::<E>(&key.column)?;
            let order = match key.direction {
                Direction::Ascending => Order::Asc,
                Direction::Descending => Order::Desc,
            };
            self.select = self.select.order_by(column, order);
        }
        Ok(self)
    }

    fn project(mut self, columns: &ColumnSpec) -> Result<Self, DataTablesError> {
        let mut select = self.select.select_only();
        for name in columns.iter() {
            select = select.column_as(resolve_column::<E>(name)?, name);
        }
        self.select = select;
        Ok(self)
    }

    fn slice(mut self, window: &PaginationWindow) -> Result<Self, DataTablesError> {
        let limit = match window.length {
            PageLength::Rows(n) => n,
            PageLength::All => UNLIMITED_ROWS,
        };
        self.select = self.select.offset(window.start).limit(limit);
        Ok(self)
    }

    async fn materialize(self) -> Result<Vec<Row>, DataTablesError> {
        let values = self.select.into_json().all(&self.db).await?;
        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(DataTablesError::data_source(format!(
                    "expected a JSON object per row, got {other}"
                ))),
            })
            .collect()
    }
}
