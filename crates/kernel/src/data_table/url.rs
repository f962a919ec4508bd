//! URL query parameter encoding of `QueryState`.
//!
//! Mirrors the table UI's link format so server-rendered links and API
//! calls agree with what the browser writes into the address bar:
//!
//! | key               | value                                         |
//! |-------------------|-----------------------------------------------|
//! | `{prefix}pg-i`    | page index, default 0                         |
//! | `{prefix}pg-s`    | page size, clamped to [`PAGE_SIZES`]          |
//! | `{prefix}col-s`   | `;`-separated `{"id":..,"desc":..}` records   |
//! | `{prefix}fil-glo` | global filter text                            |
//! | `{prefix}filter`  | `;`-separated column filter JSON records      |
//!
//! The UI keeps column filters in component state; `filter` is what lets
//! them travel in a link. A `;` inside a record is written as `%3B`.
//!
//! Anything malformed falls back to its default rather than failing.

use serde::de::DeserializeOwned;

use super::types::{ColumnFilter, DEFAULT_PAGE_SIZE, Pagination, QueryState, SortEntry};

/// Page sizes the table UI offers.
pub const PAGE_SIZES: [u32; 10] = [1, 2, 3, 5, 10, 20, 30, 40, 50, 100];

const LIST_SEPARATOR: char = ';';
const ESCAPED_SEPARATOR: &str = "%3B";

/// Parameter names for one table on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateKeys {
    pub page_index: String,
    pub page_size: String,
    pub sort: String,
    pub search: String,
    pub filter: String,
}

impl StateKeys {
    /// Keys for a table whose parameters carry `prefix`. Use `""` for none.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            page_index: format!("{prefix}pg-i"),
            page_size: format!("{prefix}pg-s"),
            sort: format!("{prefix}col-s"),
            search: format!("{prefix}fil-glo"),
            filter: format!("{prefix}filter"),
        }
    }
}

impl Default for StateKeys {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

/// Snap a requested page size onto [`PAGE_SIZES`]: the smallest allowed
/// size not below the request, else the largest.
pub fn clamp_page_size(requested: u32) -> u32 {
    PAGE_SIZES
        .iter()
        .copied()
        .find(|size| *size >= requested)
        .unwrap_or(PAGE_SIZES[PAGE_SIZES.len() - 1])
}

/// Decode a `QueryState` from query pairs. Later duplicates win.
pub fn decode_state(pairs: &[(String, String)], keys: &StateKeys) -> QueryState {
    let lookup = |key: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let page_index = lookup(&keys.page_index)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let page_size = lookup(&keys.page_size)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .map(clamp_page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    QueryState {
        pagination: Pagination::new(page_index, page_size),
        sorting: lookup(&keys.sort)
            .map(decode_list::<SortEntry>)
            .unwrap_or_default(),
        global_filter: lookup(&keys.search).unwrap_or_default().to_string(),
        column_filters: lookup(&keys.filter)
            .map(decode_list::<ColumnFilter>)
            .unwrap_or_default(),
    }
}

/// Encode a `QueryState` as query pairs, omitting defaults.
pub fn encode_state(state: &QueryState, keys: &StateKeys) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if state.pagination.page_index != 0 {
        pairs.push((keys.page_index.clone(), state.pagination.page_index.to_string()));
    }
    if state.pagination.page_size != DEFAULT_PAGE_SIZE {
        pairs.push((keys.page_size.clone(), state.pagination.page_size.to_string()));
    }
    if !state.sorting.is_empty() {
        pairs.push((keys.sort.clone(), encode_list(&state.sorting)));
    }
    if !state.global_filter.is_empty() {
        pairs.push((keys.search.clone(), state.global_filter.clone()));
    }
    if !state.column_filters.is_empty() {
        pairs.push((keys.filter.clone(), encode_list(&state.column_filters)));
    }

    pairs
}

/// Parse each `;`-separated JSON record, skipping the ones that don't parse.
fn decode_list<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.replace(ESCAPED_SEPARATOR, ";"))
        .filter_map(|item| match serde_json::from_str(&item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(item = %item, error = %e, "ignoring malformed table state item");
                None
            }
        })
        .collect()
}

fn encode_list<T: serde::Serialize>(items: &[T]) -> String {
    items
        .iter()
        .filter_map(|item| serde_json::to_string(item).ok())
        .map(|item| item.replace(LIST_SEPARATOR, ESCAPED_SEPARATOR))
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::data_table::types::{FilterOperator, RawValue};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_query_gives_defaults() {
        let state = decode_state(&[], &StateKeys::default());
        assert_eq!(state, QueryState::default());
    }

    #[test]
    fn decodes_all_parts() {
        let query = pairs(&[
            ("pg-i", "2"),
            ("pg-s", "10"),
            ("col-s", r#"{"id":"name","desc":true};{"id":"email","desc":false}"#),
            ("fil-glo", "ana"),
            (
                "filter",
                r#"{"id":"role","value":{"operator":"is any of","values":["admin","user"]}}"#,
            ),
        ]);
        let state = decode_state(&query, &StateKeys::default());

        assert_eq!(state.pagination, Pagination::new(2, 10));
        assert_eq!(
            state.sorting,
            vec![SortEntry::desc("name"), SortEntry::asc("email")]
        );
        assert_eq!(state.global_filter, "ana");
        assert_eq!(state.column_filters.len(), 1);
        assert_eq!(state.column_filters[0].operator(), &FilterOperator::IsAnyOf);
    }

    #[test]
    fn prefix_scopes_keys() {
        let query = pairs(&[("users-pg-i", "4"), ("pg-i", "9")]);
        let state = decode_state(&query, &StateKeys::with_prefix("users-"));
        assert_eq!(state.pagination.page_index, 4);
    }

    #[test]
    fn malformed_parts_fall_back() {
        let query = pairs(&[
            ("pg-i", "-1"),
            ("pg-s", "lots"),
            ("col-s", r#"{"id":"name"};not json;{"desc":true}"#),
        ]);
        let state = decode_state(&query, &StateKeys::default());

        assert_eq!(state.pagination, Pagination::default());
        assert_eq!(state.sorting, vec![SortEntry::asc("name")]);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(10), 10);
        assert_eq!(clamp_page_size(11), 20);
        assert_eq!(clamp_page_size(500), 100);
    }

    #[test]
    fn encode_then_decode() {
        let state = QueryState {
            pagination: Pagination::new(3, 20),
            sorting: vec![SortEntry::desc("createdAt")],
            global_filter: "ana".to_string(),
            column_filters: vec![ColumnFilter::new(
                "age",
                FilterOperator::IsBetween,
                vec![RawValue::from(18i64), RawValue::from("65")],
            )],
        };
        let keys = StateKeys::with_prefix("t-");
        let encoded = encode_state(&state, &keys);

        assert_eq!(decode_state(&encoded, &keys), state);
    }

    #[test]
    fn uses_table_ui_keys() {
        let keys = StateKeys::with_prefix("users-");
        assert_eq!(keys.page_index, "users-pg-i");
        assert_eq!(keys.page_size, "users-pg-s");
        assert_eq!(keys.sort, "users-col-s");
        assert_eq!(keys.search, "users-fil-glo");
    }

    #[test]
    fn separator_inside_a_value_survives() {
        let state = QueryState {
            sorting: vec![SortEntry::asc("a;b")],
            column_filters: vec![
                ColumnFilter::new("role", FilterOperator::IsAnyOf, vec![RawValue::from("a;b")]),
                ColumnFilter::new("name", FilterOperator::Contains, vec![RawValue::from("c")]),
            ],
            ..Default::default()
        };
        let keys = StateKeys::default();
        let encoded = encode_state(&state, &keys);

        let filter = &encoded.iter().find(|(k, _)| k == "filter").unwrap().1;
        assert_eq!(filter.matches(';').count(), 1, "{filter}");
        assert!(filter.contains("a%3Bb"), "{filter}");

        assert_eq!(decode_state(&encoded, &keys), state);
    }

    #[test]
    fn encode_omits_defaults() {
        assert!(encode_state(&QueryState::default(), &StateKeys::default()).is_empty());
    }
}
