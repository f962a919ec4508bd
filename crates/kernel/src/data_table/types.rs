//! Data table query state types.
//!
//! Provides the serializable snapshot a table UI produces:
//! - QueryState: pagination, sorting, global search, column filters
//! - FilterOperator: the closed set of column filter operators
//! - Stage: the four independently toggleable compilation steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size used when the state does not carry one.
pub const DEFAULT_PAGE_SIZE: u32 = 2;

/// Snapshot of a table's pagination, sort, and filter state.
///
/// Rebuilt per request (usually from URL parameters) and never mutated by
/// the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    #[serde(default)]
    pub pagination: Pagination,

    /// Sort keys, primary first. Empty means no explicit sort.
    #[serde(default)]
    pub sorting: Vec<SortEntry>,

    /// Free-text search. Empty means no search.
    #[serde(default)]
    pub global_filter: String,

    #[serde(default)]
    pub column_filters: Vec<ColumnFilter>,
}

/// Zero-based page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page_index: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Rows per page, as a LIMIT.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Rows to skip, as an OFFSET.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index).saturating_mul(u64::from(self.page_size))
    }
}

/// One sort key as the table UI reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    /// Column identifier.
    pub id: String,

    /// Descending when true.
    #[serde(default)]
    pub desc: bool,
}

impl SortEntry {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// A structured constraint on one column.
///
/// Wire shape is `{ "id": ..., "value": { "operator": ..., "values": [...] } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: FilterValue,
}

/// Operator and raw operands of a column filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterValue {
    pub operator: FilterOperator,

    #[serde(default)]
    pub values: Vec<RawValue>,
}

impl ColumnFilter {
    pub fn new(id: impl Into<String>, operator: FilterOperator, values: Vec<RawValue>) -> Self {
        Self {
            id: id.into(),
            value: FilterValue { operator, values },
        }
    }

    pub fn column_id(&self) -> &str {
        &self.id
    }

    pub fn operator(&self) -> &FilterOperator {
        &self.value.operator
    }

    pub fn values(&self) -> &[RawValue] {
        &self.value.values
    }
}

/// Uncoerced filter operand. Dates travel as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

/// Column filter operators.
///
/// Serialized as the exact operator phrase the table UI emits. Phrases this
/// build does not know deserialize to `Unknown` and compile to no predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Contains,
    DoesNotContain,
    Is,
    IsNot,
    IsLessThan,
    IsBefore,
    IsLessThanOrEqualTo,
    IsOnOrBefore,
    IsGreaterThan,
    IsAfter,
    IsGreaterThanOrEqualTo,
    IsOnOrAfter,
    IsBetween,
    IsNotBetween,
    IsAnyOf,
    IsNoneOf,
    Include,
    IncludeAnyOf,
    Exclude,
    ExcludeIfAnyOf,
    IncludeAllOf,
    ExcludeIfAll,
    Unknown(String),
}

/// Predicate shape an operator compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Contains,
    NotContains,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    Overlaps,
    NotOverlaps,
    ContainsAll,
    NotContainsAll,
}

/// How many coerced operands a predicate consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Only the first value.
    Single,
    /// The first two values; fewer drops the filter.
    Pair,
    /// The whole list.
    List,
}

impl PredicateKind {
    pub fn arity(self) -> Arity {
        match self {
            PredicateKind::Contains
            | PredicateKind::NotContains
            | PredicateKind::Equal
            | PredicateKind::NotEqual
            | PredicateKind::Less
            | PredicateKind::LessOrEqual
            | PredicateKind::Greater
            | PredicateKind::GreaterOrEqual => Arity::Single,
            PredicateKind::Between | PredicateKind::NotBetween => Arity::Pair,
            PredicateKind::In
            | PredicateKind::NotIn
            | PredicateKind::Overlaps
            | PredicateKind::NotOverlaps
            | PredicateKind::ContainsAll
            | PredicateKind::NotContainsAll => Arity::List,
        }
    }
}

impl FilterOperator {
    /// All known operators, in display order.
    pub const ALL: [FilterOperator; 22] = [
        FilterOperator::Contains,
        FilterOperator::DoesNotContain,
        FilterOperator::Is,
        FilterOperator::IsNot,
        FilterOperator::IsLessThan,
        FilterOperator::IsBefore,
        FilterOperator::IsLessThanOrEqualTo,
        FilterOperator::IsOnOrBefore,
        FilterOperator::IsGreaterThan,
        FilterOperator::IsAfter,
        FilterOperator::IsGreaterThanOrEqualTo,
        FilterOperator::IsOnOrAfter,
        FilterOperator::IsBetween,
        FilterOperator::IsNotBetween,
        FilterOperator::IsAnyOf,
        FilterOperator::IsNoneOf,
        FilterOperator::Include,
        FilterOperator::IncludeAnyOf,
        FilterOperator::Exclude,
        FilterOperator::ExcludeIfAnyOf,
        FilterOperator::IncludeAllOf,
        FilterOperator::ExcludeIfAll,
    ];

    /// Parse an operator phrase. Matching ignores case and surrounding spaces.
    pub fn parse(phrase: &str) -> Self {
        let normalized = phrase.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .unwrap_or_else(|| FilterOperator::Unknown(phrase.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::DoesNotContain => "does not contain",
            FilterOperator::Is => "is",
            FilterOperator::IsNot => "is not",
            FilterOperator::IsLessThan => "is less than",
            FilterOperator::IsBefore => "is before",
            FilterOperator::IsLessThanOrEqualTo => "is less than or equal to",
            FilterOperator::IsOnOrBefore => "is on or before",
            FilterOperator::IsGreaterThan => "is greater than",
            FilterOperator::IsAfter => "is after",
            FilterOperator::IsGreaterThanOrEqualTo => "is greater than or equal to",
            FilterOperator::IsOnOrAfter => "is on or after",
            FilterOperator::IsBetween => "is between",
            FilterOperator::IsNotBetween => "is not between",
            FilterOperator::IsAnyOf => "is any of",
            FilterOperator::IsNoneOf => "is none of",
            FilterOperator::Include => "include",
            FilterOperator::IncludeAnyOf => "include any of",
            FilterOperator::Exclude => "exclude",
            FilterOperator::ExcludeIfAnyOf => "exclude if any of",
            FilterOperator::IncludeAllOf => "include all of",
            FilterOperator::ExcludeIfAll => "exclude if all",
            FilterOperator::Unknown(phrase) => phrase,
        }
    }

    /// Predicate shape for this operator, `None` when unrecognized.
    pub fn kind(&self) -> Option<PredicateKind> {
        let kind = match self {
            FilterOperator::Contains => PredicateKind::Contains,
            FilterOperator::DoesNotContain => PredicateKind::NotContains,
            FilterOperator::Is => PredicateKind::Equal,
            FilterOperator::IsNot => PredicateKind::NotEqual,
            FilterOperator::IsLessThan | FilterOperator::IsBefore => PredicateKind::Less,
            FilterOperator::IsLessThanOrEqualTo | FilterOperator::IsOnOrBefore => {
                PredicateKind::LessOrEqual
            }
            FilterOperator::IsGreaterThan | FilterOperator::IsAfter => PredicateKind::Greater,
            FilterOperator::IsGreaterThanOrEqualTo | FilterOperator::IsOnOrAfter => {
                PredicateKind::GreaterOrEqual
            }
            FilterOperator::IsBetween => PredicateKind::Between,
            FilterOperator::IsNotBetween => PredicateKind::NotBetween,
            FilterOperator::IsAnyOf => PredicateKind::In,
            FilterOperator::IsNoneOf => PredicateKind::NotIn,
            FilterOperator::Include | FilterOperator::IncludeAnyOf => PredicateKind::Overlaps,
            FilterOperator::Exclude | FilterOperator::ExcludeIfAnyOf => {
                PredicateKind::NotOverlaps
            }
            FilterOperator::IncludeAllOf => PredicateKind::ContainsAll,
            FilterOperator::ExcludeIfAll => PredicateKind::NotContainsAll,
            FilterOperator::Unknown(_) => return None,
        };
        Some(kind)
    }
}

impl From<String> for FilterOperator {
    fn from(phrase: String) -> Self {
        FilterOperator::parse(&phrase)
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        match op {
            FilterOperator::Unknown(phrase) => phrase,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compilation step that a table config may switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    GlobalFilter,
    ColumnFilters,
    Sorting,
    Pagination,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn query_state_defaults() {
        let state = QueryState::default();
        assert_eq!(state.pagination.page_index, 0);
        assert_eq!(state.pagination.page_size, DEFAULT_PAGE_SIZE);
        assert!(state.sorting.is_empty());
        assert!(state.global_filter.is_empty());
        assert!(state.column_filters.is_empty());
    }

    #[test]
    fn query_state_from_ui_json() {
        let json = r#"{
            "pagination": {"pageIndex": 2, "pageSize": 10},
            "sorting": [{"id": "name", "desc": true}],
            "globalFilter": "ana",
            "columnFilters": [
                {"id": "role", "value": {"operator": "is any of", "values": ["admin", "user"]}},
                {"id": "age", "value": {"operator": "is between", "values": [18, "65"]}}
            ]
        }"#;

        let state: QueryState = serde_json::from_str(json).unwrap();
        assert_eq!(state.pagination, Pagination::new(2, 10));
        assert_eq!(state.sorting, vec![SortEntry::desc("name")]);
        assert_eq!(state.global_filter, "ana");
        assert_eq!(state.column_filters[0].operator(), &FilterOperator::IsAnyOf);
        assert_eq!(
            state.column_filters[1].values(),
            &[RawValue::Number(18.0), RawValue::Text("65".to_string())]
        );
    }

    #[test]
    fn missing_fields_use_defaults() {
        let state: QueryState = serde_json::from_str(r#"{"pagination": {"pageIndex": 3}}"#).unwrap();
        assert_eq!(state.pagination.page_index, 3);
        assert_eq!(state.pagination.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn pagination_offset() {
        let p = Pagination::new(2, 10);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 20);
        assert_eq!(Pagination::new(0, 50).offset(), 0);
        assert_eq!(
            Pagination::new(u32::MAX, 2).offset(),
            u64::from(u32::MAX) * 2
        );
    }

    #[test]
    fn operator_phrases_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(FilterOperator::parse(op.as_str()), op);
            assert!(op.kind().is_some(), "{op} should map to a predicate");
        }
    }

    #[test]
    fn operator_parse_is_lenient_about_case() {
        assert_eq!(FilterOperator::parse("  Is Any Of "), FilterOperator::IsAnyOf);
    }

    #[test]
    fn unknown_operator_deserializes() {
        let filter: ColumnFilter =
            serde_json::from_str(r#"{"id": "x", "value": {"operator": "sounds like", "values": ["a"]}}"#)
                .unwrap();
        assert_eq!(
            filter.operator(),
            &FilterOperator::Unknown("sounds like".to_string())
        );
        assert!(filter.operator().kind().is_none());

        let json = serde_json::to_string(filter.operator()).unwrap();
        assert_eq!(json, "\"sounds like\"");
    }

    #[test]
    fn date_aliases_share_comparison_kinds() {
        assert_eq!(FilterOperator::IsBefore.kind(), FilterOperator::IsLessThan.kind());
        assert_eq!(
            FilterOperator::IsOnOrAfter.kind(),
            FilterOperator::IsGreaterThanOrEqualTo.kind()
        );
        assert_eq!(FilterOperator::Include.kind(), Some(PredicateKind::Overlaps));
        assert_eq!(FilterOperator::ExcludeIfAll.kind(), Some(PredicateKind::NotContainsAll));
    }

    #[test]
    fn arity_by_kind() {
        assert_eq!(PredicateKind::Equal.arity(), Arity::Single);
        assert_eq!(PredicateKind::NotBetween.arity(), Arity::Pair);
        assert_eq!(PredicateKind::In.arity(), Arity::List);
    }

    #[test]
    fn stage_serialization() {
        let json = serde_json::to_string(&Stage::ColumnFilters).unwrap();
        assert_eq!(json, "\"columnFilters\"");
    }
}
