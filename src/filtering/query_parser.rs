//! Decoding of the flat DataTables wire format.
//!
//! The client sends bracketed keys (`columns[0][search][value]=x`). Parsing happens in two
//! steps: the flat pairs are folded into a nested JSON tree, then the tree is deserialized
//! into typed structs, with `serde_with` turning the string-encoded integers and booleans
//! into real values. Anything that does not fit is a [`DataTablesError::MalformedRequest`].

use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, serde_as};

use crate::errors::DataTablesError;
use crate::filtering::pagination::PaginationWindow;
use crate::models::{
    ColumnRequest, DataKey, DataTableConfig, DataTablesRequest, Direction, OrderRequest,
    SearchTerm,
};

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRequest {
    draw: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    start: Option<i64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    length: Option<i64>,
    search: RawSearch,
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSearch {
    value: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    regex: Option<bool>,
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawColumn {
    data: Option<String>,
    name: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    searchable: Option<bool>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    orderable: Option<bool>,
    search: RawSearch,
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOrder {
    #[serde_as(as = "Option<DisplayFromStr>")]
    column: Option<usize>,
    dir: Option<Direction>,
}

impl From<RawSearch> for SearchTerm {
    fn from(raw: RawSearch) -> Self {
        Self {
            value: raw.value.unwrap_or_default(),
            regex: raw.regex.unwrap_or(false),
        }
    }
}

/// Split `root[a][b]` into `("root", ["a", "b"])`
fn split_key(key: &str) -> Result<(&str, Vec<&str>), DataTablesError> {
    let Some(open) = key.find('[') else {
        if key.contains(']') {
            return Err(DataTablesError::malformed(format!(
                "unbalanced ']' in key '{key}'"
            )));
        }
        return Ok((key, Vec::new()));
    };

    let root = &key[..open];
    if root.is_empty() {
        return Err(DataTablesError::malformed(format!(
            "key '{key}' has no name before '['"
        )));
    }

    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(DataTablesError::malformed(format!(
                "unexpected text after ']' in key '{key}'"
            )));
        };
        let Some(close) = inner.find(']') else {
            return Err(DataTablesError::malformed(format!(
                "unterminated '[' in key '{key}'"
            )));
        };
        let segment = &inner[..close];
        if segment.contains('[') {
            return Err(DataTablesError::malformed(format!(
                "nested '[' in key '{key}'"
            )));
        }
        segments.push(segment);
        rest = &inner[close + 1..];
    }

    Ok((root, segments))
}

/// Insert one leaf, creating intermediate groups. A key may not be both a value and a group.
fn insert_leaf(
    tree: &mut Map<String, Value>,
    key: &str,
    path: &[&str],
    value: String,
) -> Result<(), DataTablesError> {
    let conflict = || {
        DataTablesError::malformed(format!(
            "key '{key}' is used both as a value and as a nested group"
        ))
    };

    let Some((leaf, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut node = tree;
    for segment in parents {
        let entry = node
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(group) = entry else {
            return Err(conflict());
        };
        node = group;
    }

    if matches!(node.get(*leaf), Some(Value::Object(_))) {
        return Err(conflict());
    }
    node.insert((*leaf).to_string(), Value::String(value));
    Ok(())
}

/// Fold flat key/value pairs into a nested tree
fn build_tree<I, K, V>(pairs: I) -> Result<Map<String, Value>, DataTablesError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut tree = Map::new();
    for (key, value) in pairs {
        let key = key.as_ref();
        let (root, segments) = split_key(key)?;
        let mut path = Vec::with_capacity(segments.len() + 1);
        path.push(root);
        path.extend(segments);
        insert_leaf(&mut tree, key, &path, value.into())?;
    }
    Ok(tree)
}

/// Remove an array-like group (`columns`, `order`) and return its entries sorted by index
fn take_indexed(
    tree: &mut Map<String, Value>,
    root: &str,
) -> Result<Vec<(usize, Value)>, DataTablesError> {
    let group = match tree.remove(root) {
        None => return Ok(Vec::new()),
        Some(Value::Object(group)) => group,
        Some(_) => {
            return Err(DataTablesError::malformed(format!(
                "'{root}' must be indexed, e.g. {root}[0]"
            )));
        }
    };

    let mut entries = group
        .into_iter()
        .map(|(index, value)| {
            index.parse::<usize>().map(|i| (i, value)).map_err(|_| {
                DataTablesError::malformed(format!(
                    "{root}[{index}]: index must be a non-negative integer"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|(index, _)| *index);
    Ok(entries)
}

fn decode<T>(value: Value, context: &str) -> Result<T, DataTablesError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(value)
        .map_err(|e| DataTablesError::malformed(format!("{context}: {e}")))
}

fn column_from_raw(index: usize, raw: RawColumn) -> ColumnRequest {
    let data = match raw.data.filter(|data| !data.is_empty()) {
        None => DataKey::Index(index),
        Some(data) => data
            .parse::<usize>()
            .map_or(DataKey::Named(data), DataKey::Index),
    };

    ColumnRequest {
        index,
        data,
        name: raw.name.filter(|name| !name.is_empty()),
        searchable: raw.searchable.unwrap_or(true),
        orderable: raw.orderable.unwrap_or(true),
        search: raw.search.into(),
    }
}

fn order_from_raw(index: usize, raw: RawOrder) -> Result<OrderRequest, DataTablesError> {
    let column = raw.column.ok_or_else(|| {
        DataTablesError::malformed(format!("order[{index}][column] is required"))
    })?;
    Ok(OrderRequest {
        column,
        direction: raw.dir.unwrap_or_default(),
    })
}

/// Parse already-decoded key/value pairs into a typed request.
///
/// # Errors
///
/// Returns [`DataTablesError::MalformedRequest`] on inconsistent bracket nesting, non-numeric
/// indices, unparseable numbers or booleans, unknown sort directions and invalid windows.
pub fn parse_pairs<I, K, V>(
    pairs: I,
    config: &DataTableConfig,
) -> Result<DataTablesRequest, DataTablesError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut tree = build_tree(pairs)?;

    let columns = take_indexed(&mut tree, "columns")?
        .into_iter()
        .map(|(index, value)| {
            decode::<RawColumn>(value, &format!("columns[{index}]"))
                .map(|raw| column_from_raw(index, raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let order = take_indexed(&mut tree, "order")?
        .into_iter()
        .map(|(index, value)| {
            decode::<RawOrder>(value, &format!("order[{index}]"))
                .and_then(|raw| order_from_raw(index, raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let raw: RawRequest = decode(Value::Object(tree), "request")?;
    let window = PaginationWindow::from_wire(
        raw.start.unwrap_or(0),
        raw.length.unwrap_or(config.default_length),
    )?;

    let request = DataTablesRequest {
        draw: raw.draw,
        columns,
        order,
        search: raw.search.into(),
        window,
    };

    tracing::trace!(
        columns = request.columns.len(),
        order = request.order.len(),
        global_search = request.search.is_active(),
        start = request.window.start,
        "Parsed DataTables request"
    );

    Ok(request)
}

/// Parse a raw form-urlencoded query string (`draw=1&columns%5B0%5D%5Bdata%5D=id&...`).
///
/// # Errors
///
/// See [`parse_pairs`].
pub fn parse_query(
    query: &str,
    config: &DataTableConfig,
) -> Result<DataTablesRequest, DataTablesError> {
    parse_pairs(url::form_urlencoded::parse(query.as_bytes()), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::pagination::PageLength;

    fn parse(pairs: &[(&str, &str)]) -> Result<DataTablesRequest, DataTablesError> {
        parse_pairs(pairs.iter().copied(), &DataTableConfig::default())
    }

    fn assert_malformed(result: Result<DataTablesRequest, DataTablesError>) {
        assert!(
            matches!(result, Err(DataTablesError::MalformedRequest { .. })),
            "expected a malformed request error, got {result:?}"
        );
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("draw").unwrap(), ("draw", vec![]));
        assert_eq!(
            split_key("columns[0][search][value]").unwrap(),
            ("columns", vec!["0", "search", "value"])
        );
        assert!(split_key("columns[0").is_err());
        assert!(split_key("columns]0[").is_err());
        assert!(split_key("[0]").is_err());
        assert!(split_key("columns[0]x[1]").is_err());
        assert!(split_key("columns[[0]]").is_err());
    }

    #[test]
    fn test_full_request() {
        let request = parse(&[
            ("draw", "7"),
            ("columns[0][data]", "id"),
            ("columns[0][name]", "name_of_id"),
            ("columns[0][searchable]", "true"),
            ("columns[0][orderable]", "false"),
            ("columns[0][search][value]", "12"),
            ("columns[0][search][regex]", "true"),
            ("columns[1][data]", "first_name"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "desc"),
            ("start", "20"),
            ("length", "25"),
            ("search[value]", "john"),
            ("search[regex]", "false"),
        ])
        .unwrap();

        assert_eq!(request.draw.as_deref(), Some("7"));
        assert_eq!(request.columns.len(), 2);

        let id = &request.columns[0];
        assert_eq!(id.data, DataKey::Named("id".into()));
        assert_eq!(id.name.as_deref(), Some("name_of_id"));
        assert!(id.searchable);
        assert!(!id.orderable);
        assert_eq!(id.search, SearchTerm::new("12", true));

        assert_eq!(
            request.order,
            vec![OrderRequest { column: 1, direction: Direction::Descending }]
        );
        assert_eq!(request.window, PaginationWindow::new(20, PageLength::Rows(25)));
        assert_eq!(request.search, SearchTerm::new("john", false));
    }

    #[test]
    fn test_defaults_when_keys_absent() {
        let request = parse(&[]).unwrap();
        assert_eq!(request.draw, None);
        assert!(request.columns.is_empty());
        assert!(request.order.is_empty());
        assert_eq!(request.window, PaginationWindow::new(0, PageLength::Rows(10)));
        assert!(!request.search.is_active());
    }

    #[test]
    fn test_configured_default_length() {
        let config = DataTableConfig { default_length: 50 };
        let request = parse_pairs(std::iter::empty::<(&str, &str)>(), &config).unwrap();
        assert_eq!(request.window.limit(), Some(50));
    }

    #[test]
    fn test_column_flag_defaults() {
        let request = parse(&[("columns[0][data]", "id")]).unwrap();
        let column = &request.columns[0];
        assert!(column.searchable);
        assert!(column.orderable);
        assert_eq!(column.search, SearchTerm::default());
        assert_eq!(column.name, None);
    }

    #[test]
    fn test_data_falls_back_to_position() {
        let request = parse(&[
            ("columns[0][data]", ""),
            ("columns[1][name]", "actions"),
            ("columns[2][data]", "5"),
        ])
        .unwrap();
        assert_eq!(request.columns[0].data, DataKey::Index(0));
        assert_eq!(request.columns[1].data, DataKey::Index(1));
        assert_eq!(request.columns[2].data, DataKey::Index(5));
    }

    #[test]
    fn test_empty_name_is_absent() {
        let request = parse(&[("columns[0][data]", "id"), ("columns[0][name]", "")]).unwrap();
        assert_eq!(request.columns[0].name, None);
    }

    #[test]
    fn test_columns_sorted_by_index_and_sparse() {
        let request = parse(&[
            ("columns[10][data]", "c"),
            ("columns[2][data]", "b"),
            ("columns[0][data]", "a"),
        ])
        .unwrap();
        let indices: Vec<_> = request.columns.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 10]);
        assert!(request.column(10).is_some());
    }

    #[test]
    fn test_order_priority_follows_index() {
        let request = parse(&[
            ("order[1][column]", "0"),
            ("order[1][dir]", "asc"),
            ("order[0][column]", "2"),
            ("order[0][dir]", "desc"),
        ])
        .unwrap();
        assert_eq!(
            request.order,
            vec![
                OrderRequest { column: 2, direction: Direction::Descending },
                OrderRequest { column: 0, direction: Direction::Ascending },
            ]
        );
    }

    #[test]
    fn test_order_direction_defaults_to_ascending() {
        let request = parse(&[("order[0][column]", "3")]).unwrap();
        assert_eq!(request.order[0].direction, Direction::Ascending);
    }

    #[test]
    fn test_unlimited_length() {
        let request = parse(&[("start", "0"), ("length", "-1")]).unwrap();
        assert_eq!(request.window.length, PageLength::All);
    }

    #[test]
    fn test_non_numeric_column_index_is_malformed() {
        assert_malformed(parse(&[("columns[x][data]", "id")]));
        assert_malformed(parse(&[("order[first][column]", "0")]));
    }

    #[test]
    fn test_non_numeric_order_column_is_malformed() {
        assert_malformed(parse(&[("order[0][column]", "id")]));
        assert_malformed(parse(&[("order[0][column]", "-1")]));
    }

    #[test]
    fn test_missing_order_column_is_malformed() {
        assert_malformed(parse(&[("order[0][dir]", "asc")]));
    }

    #[test]
    fn test_unknown_direction_is_malformed() {
        assert_malformed(parse(&[("order[0][column]", "0"), ("order[0][dir]", "up")]));
    }

    #[test]
    fn test_bad_numbers_are_malformed() {
        assert_malformed(parse(&[("start", "abc")]));
        assert_malformed(parse(&[("length", "ten")]));
        assert_malformed(parse(&[("start", "-5")]));
        assert_malformed(parse(&[("length", "-3")]));
    }

    #[test]
    fn test_bad_booleans_are_malformed() {
        assert_malformed(parse(&[("columns[0][searchable]", "yes")]));
        assert_malformed(parse(&[("search[regex]", "1")]));
    }

    #[test]
    fn test_scalar_and_group_conflict_is_malformed() {
        assert_malformed(parse(&[("search", "x"), ("search[value]", "y")]));
        assert_malformed(parse(&[("search[value]", "y"), ("search", "x")]));
        assert_malformed(parse(&[("columns", "x")]));
        assert_malformed(parse(&[("columns[0]", "id")]));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let request = parse(&[("_", "1700000000"), ("extra[nested]", "1")]).unwrap();
        assert!(request.columns.is_empty());
    }

    #[test]
    fn test_parse_query_decodes_urlencoding() {
        let request = parse_query(
            concat!(
                "draw=2&columns%5B0%5D%5Bdata%5D=first_name",
                "&search%5Bvalue%5D=mary+ann&start=0&length=-1",
            ),
            &DataTableConfig::default(),
        )
        .unwrap();
        assert_eq!(request.draw.as_deref(), Some("2"));
        assert_eq!(request.columns[0].data, DataKey::Named("first_name".into()));
        assert_eq!(request.search.value, "mary ann");
        assert_eq!(request.window.length, PageLength::All);
    }

    #[test]
    fn test_draw_is_kept_verbatim() {
        let request = parse(&[("draw", "not-a-number")]).unwrap();
        assert_eq!(request.draw.as_deref(), Some("not-a-number"));
    }
}
