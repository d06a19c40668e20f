//! # Request Translation
//!
//! Turns a DataTables server-side processing request into store-independent query parts.
//!
//! ## Main Components
//!
//! - **[`query_parser`]**: bracketed wire keys to a typed
//!   [`DataTablesRequest`](crate::models::DataTablesRequest)
//! - **[`column_index`]**: `data` key and `name` lookups into the request's columns
//! - **[`build_filter`]**: global OR-search and per-column AND-search as a [`Predicate`]
//! - **[`build_order`]**: multi-key sort from `order[j]` entries
//! - **[`PaginationWindow`]**: `start`/`length` with the `length=-1` sentinel
//!
//! ## Filter Semantics
//!
//! ```text
//! search[value]=jo, columns[2][search][value]=smith, columns[3][search][value]=2
//!
//! (id ~ "jo" OR first_name ~ "jo" OR last_name ~ "jo")
//!     AND last_name ~ "smith"
//!     AND internal_id ~ "2"
//! ```
//!
//! `~` is a case-insensitive substring match, or a case-insensitive regex match when the
//! term's `regex` flag is `true`. Only columns that the endpoint declares, that the client
//! sent, and that are `searchable` take part.

pub mod column_index;
pub mod conditions;
pub mod pagination;
pub mod query_parser;
pub mod sort;

pub use column_index::ColumnIndex;
pub use conditions::{ColumnMatch, MatchMode, Predicate, build_filter, build_filter_with_index};
pub use pagination::{PageLength, PaginationWindow};
pub use sort::{OrderKey, build_order};
