//! Query assembler.
//!
//! Applies a `QueryState` to a caller-built sea-query `SelectStatement` in
//! four stages, in this order:
//! 1. global filter (OR of ILIKE over the searchable columns)
//! 2. column filters (AND of per-column predicates)
//! 3. sorting (requested keys, else the table's default order)
//! 4. pagination (LIMIT/OFFSET)
//!
//! Each stage can be switched off per table config. The assembler is pure:
//! it consumes the statement and returns it with clauses appended.

use sea_query::{Order, PostgresQueryBuilder, SelectStatement};

use super::config::TableConfig;
use super::predicate::{column_filters_condition, global_filter_condition};
use super::types::{QueryState, SortEntry, Stage};

/// Apply all enabled stages of `config` to `query`.
pub fn apply_data_table(
    mut query: SelectStatement,
    state: &QueryState,
    config: &TableConfig,
) -> SelectStatement {
    if config.is_enabled(Stage::GlobalFilter)
        && let Some(cond) = global_filter_condition(config, &state.global_filter)
    {
        query.cond_where(cond);
    }

    if config.is_enabled(Stage::ColumnFilters)
        && let Some(cond) = column_filters_condition(config, &state.column_filters)
    {
        query.cond_where(cond);
    }

    if config.is_enabled(Stage::Sorting) {
        add_sorts(&mut query, state, config);
    }

    if config.is_enabled(Stage::Pagination) {
        query
            .limit(state.pagination.limit())
            .offset(state.pagination.offset());
    }

    query
}

/// Apply the filter stages only, for a COUNT over the same rows.
pub fn count_query(
    query: SelectStatement,
    state: &QueryState,
    config: &TableConfig,
) -> SelectStatement {
    let config = config.with_disabled([Stage::Sorting, Stage::Pagination]);
    apply_data_table(query, state, &config)
}

/// Render a statement for Postgres with values inlined.
pub fn to_sql(query: &SelectStatement) -> String {
    query.to_string(PostgresQueryBuilder)
}

/// Add ORDER BY clauses.
///
/// Requested keys are applied in order, unknown ids skipped. When none
/// survive, the configured default order applies.
fn add_sorts(query: &mut SelectStatement, state: &QueryState, config: &TableConfig) {
    let mut applied = 0usize;

    for sort in &state.sorting {
        if add_sort(query, sort, config) {
            applied += 1;
        } else {
            tracing::debug!(column = %sort.id, "sort references unknown column; skipping");
        }
    }

    if applied == 0
        && let Some(default) = config.default_order()
    {
        add_sort(query, default, config);
    }
}

fn add_sort(query: &mut SelectStatement, sort: &SortEntry, config: &TableConfig) -> bool {
    let Some(def) = config.column(&sort.id) else {
        return false;
    };
    let order = if sort.desc { Order::Desc } else { Order::Asc };
    query.order_by_expr(def.column.expr().into(), order);
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::data_table::types::{ColumnFilter, FilterOperator, Pagination, RawValue};
    use sea_query::{Alias, Asterisk, Expr, Query};

    fn config() -> TableConfig {
        TableConfig::builder()
            .column("name", (Alias::new("user"), Alias::new("name")))
            .column("email", (Alias::new("user"), Alias::new("email")))
            .column("role", (Alias::new("user"), Alias::new("role")))
            .date_column("createdAt", (Alias::new("user"), Alias::new("created_at")))
            .global_filter(["name", "email"])
            .default_order("createdAt", true)
            .build()
            .unwrap()
    }

    fn base() -> SelectStatement {
        Query::select()
            .column(Asterisk)
            .from(Alias::new("user"))
            .to_owned()
    }

    fn build(state: &QueryState, config: &TableConfig) -> String {
        to_sql(&apply_data_table(base(), state, config))
    }

    #[test]
    fn empty_state_uses_default_order_and_pagination() {
        let state = QueryState {
            pagination: Pagination::new(0, 10),
            ..Default::default()
        };
        let sql = build(&state, &config());

        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "user"."created_at" DESC"#),
            "default order should apply: {sql}"
        );
        assert!(sql.contains("LIMIT 10 OFFSET 0"), "{sql}");
    }

    #[test]
    fn no_default_order_means_unordered() {
        let config = TableConfig::builder()
            .column("name", Alias::new("name"))
            .build()
            .unwrap();
        let sql = build(&QueryState::default(), &config);
        assert!(!sql.contains("ORDER BY"), "{sql}");
    }

    #[test]
    fn pagination_offset() {
        let state = QueryState {
            pagination: Pagination::new(2, 10),
            ..Default::default()
        };
        let sql = build(&state, &config());
        assert!(sql.contains("LIMIT 10 OFFSET 20"), "{sql}");
    }

    #[test]
    fn multi_column_sort_preserves_order() {
        let state = QueryState {
            sorting: vec![SortEntry::desc("name"), SortEntry::asc("email")],
            ..Default::default()
        };
        let sql = build(&state, &config());
        assert!(
            sql.contains(r#"ORDER BY "user"."name" DESC, "user"."email" ASC"#),
            "{sql}"
        );
        assert!(!sql.contains("created_at"), "default order is not a tie-break: {sql}");
    }

    #[test]
    fn unknown_sort_ids_fall_back_to_default() {
        let state = QueryState {
            sorting: vec![SortEntry::asc("nope")],
            ..Default::default()
        };
        let sql = build(&state, &config());
        assert!(sql.contains(r#"ORDER BY "user"."created_at" DESC"#), "{sql}");
    }

    #[test]
    fn unknown_sort_id_dropped_individually() {
        let state = QueryState {
            sorting: vec![SortEntry::asc("nope"), SortEntry::asc("email")],
            ..Default::default()
        };
        let sql = build(&state, &config());
        assert!(sql.contains(r#"ORDER BY "user"."email" ASC"#), "{sql}");
        assert!(!sql.contains("created_at"), "{sql}");
    }

    #[test]
    fn filters_come_before_order_and_limit() {
        let state = QueryState {
            pagination: Pagination::new(1, 5),
            global_filter: "ana".to_string(),
            column_filters: vec![ColumnFilter::new(
                "role",
                FilterOperator::IsAnyOf,
                vec![RawValue::from("admin"), RawValue::from("user")],
            )],
            sorting: vec![SortEntry::asc("name")],
        };
        let sql = build(&state, &config());

        let where_at = sql.find("WHERE").unwrap();
        let order_at = sql.find("ORDER BY").unwrap();
        let limit_at = sql.find("LIMIT").unwrap();
        assert!(where_at < order_at && order_at < limit_at, "{sql}");
        assert!(sql.contains(r#""user"."name" ILIKE '%ana%'"#), "{sql}");
        assert!(sql.contains(r#""user"."role" IN ('admin', 'user')"#), "{sql}");
        assert!(sql.contains("LIMIT 5 OFFSET 5"), "{sql}");
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let config = config()
            .with_disabled([Stage::GlobalFilter, Stage::Pagination]);
        let state = QueryState {
            global_filter: "ana".to_string(),
            ..Default::default()
        };
        let sql = build(&state, &config);
        assert!(!sql.contains("ILIKE"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(sql.contains("ORDER BY"), "{sql}");
    }

    #[test]
    fn count_query_keeps_filters_only() {
        let state = QueryState {
            pagination: Pagination::new(3, 20),
            global_filter: "ana".to_string(),
            sorting: vec![SortEntry::asc("name")],
            ..Default::default()
        };
        let count_base = Query::select()
            .expr(Expr::col(Asterisk).count())
            .from(Alias::new("user"))
            .to_owned();
        let sql = to_sql(&count_query(count_base, &state, &config()));

        assert!(sql.contains("COUNT(*)"), "{sql}");
        assert!(sql.contains("ILIKE '%ana%'"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
    }

    #[test]
    fn noop_filter_entry_is_same_as_omitting_it() {
        let mut state = QueryState {
            global_filter: "ana".to_string(),
            ..Default::default()
        };
        let without = build(&state, &config());

        state.column_filters.push(ColumnFilter::new(
            "createdAt",
            FilterOperator::IsBefore,
            vec![RawValue::from("not a date")],
        ));
        let with = build(&state, &config());

        assert_eq!(with, without);
    }

    #[test]
    fn state_and_config_are_untouched() {
        let state = QueryState {
            sorting: vec![SortEntry::asc("name")],
            ..Default::default()
        };
        let config = config();
        let before = state.clone();

        let first = build(&state, &config);
        let second = build(&state, &config);

        assert_eq!(state, before);
        assert_eq!(first, second);
    }
}
