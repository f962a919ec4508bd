//! Predicate compiler.
//!
//! Turns the global search string and the column filter entries of a
//! `QueryState` into sea-query conditions. Entries that cannot be compiled
//! (unknown column, unknown operator, no usable values) are skipped and
//! logged at debug level; they never fail the request.

use sea_query::extension::postgres::{PgBinOper, PgExpr};
use sea_query::{ArrayType, BinOper, Cond, Condition, Expr, SimpleExpr, UnOper, Value};

use super::coerce::{FilterScalar, coerce_values};
use super::config::{ColumnType, TableConfig};
use super::types::{Arity, ColumnFilter, PredicateKind};

/// OR of case-insensitive substring matches over the global filter columns.
///
/// `None` when the search text is empty or no configured column resolves.
pub fn global_filter_condition(config: &TableConfig, text: &str) -> Option<Condition> {
    if text.is_empty() {
        return None;
    }

    let pattern = contains_pattern(text);
    let mut cond = Cond::any();
    let mut matched = 0usize;

    for id in config.global_filter_columns() {
        let Some(def) = config.column(id) else {
            tracing::debug!(column = %id, "global filter column not configured; skipping");
            continue;
        };
        cond = cond.add(def.column.expr().ilike(pattern.clone()));
        matched += 1;
    }

    (matched > 0).then_some(cond)
}

/// AND of every column filter that compiles.
///
/// Filters naming the same column are all kept and AND-combined.
pub fn column_filters_condition(
    config: &TableConfig,
    filters: &[ColumnFilter],
) -> Option<Condition> {
    let mut cond = Cond::all();
    let mut matched = 0usize;

    for filter in filters {
        if let Some(expr) = compile_column_filter(config, filter) {
            cond = cond.add(expr);
            matched += 1;
        }
    }

    (matched > 0).then_some(cond)
}

/// Compile a single column filter, or `None` if it contributes no constraint.
pub fn compile_column_filter(config: &TableConfig, filter: &ColumnFilter) -> Option<SimpleExpr> {
    let column_id = filter.column_id();
    let operator = filter.operator();

    let Some(def) = config.column(column_id) else {
        tracing::debug!(column = %column_id, "filter references unknown column; skipping");
        return None;
    };

    let Some(kind) = operator.kind() else {
        tracing::debug!(column = %column_id, operator = %operator, "unrecognized filter operator; skipping");
        return None;
    };

    if matches!(kind, PredicateKind::Contains | PredicateKind::NotContains)
        && def.ty != ColumnType::Text
    {
        tracing::debug!(
            column = %column_id,
            operator = %operator,
            column_type = ?def.ty,
            "substring match on non-text column; skipping"
        );
        return None;
    }

    if filter.values().is_empty() {
        return None;
    }

    let Ok(values) = coerce_values(def.ty, def.bool_parser, filter.values()) else {
        tracing::debug!(
            column = %column_id,
            operator = %operator,
            "no filter value survived coercion; skipping"
        );
        return None;
    };

    if kind.arity() == Arity::Pair && values.len() < 2 {
        tracing::debug!(
            column = %column_id,
            operator = %operator,
            "range filter needs two values; skipping"
        );
        return None;
    }

    build_predicate(def.column.expr(), kind, values)
}

/// Build the predicate for an operator kind.
fn build_predicate(col: Expr, kind: PredicateKind, values: Vec<FilterScalar>) -> Option<SimpleExpr> {
    let mut rest = values.into_iter();
    let first = rest.next()?;

    let expr = match kind {
        PredicateKind::Contains => col.ilike(contains_pattern(&first.to_string())),
        PredicateKind::NotContains => col.not_ilike(contains_pattern(&first.to_string())),
        PredicateKind::Equal => col.eq(Value::from(first)),
        PredicateKind::NotEqual => col.ne(Value::from(first)),
        PredicateKind::Less => col.lt(Value::from(first)),
        PredicateKind::LessOrEqual => col.lte(Value::from(first)),
        PredicateKind::Greater => col.gt(Value::from(first)),
        PredicateKind::GreaterOrEqual => col.gte(Value::from(first)),
        PredicateKind::Between => col.between(Value::from(first), Value::from(rest.next()?)),
        PredicateKind::NotBetween => {
            col.not_between(Value::from(first), Value::from(rest.next()?))
        }
        PredicateKind::In => col.is_in(std::iter::once(first).chain(rest).map(Value::from)),
        PredicateKind::NotIn => col.is_not_in(std::iter::once(first).chain(rest).map(Value::from)),
        PredicateKind::Overlaps => array_op(col, PgBinOper::Overlap, first, rest),
        PredicateKind::NotOverlaps => negate(array_op(col, PgBinOper::Overlap, first, rest)),
        PredicateKind::ContainsAll => array_op(col, PgBinOper::Contains, first, rest),
        PredicateKind::NotContainsAll => negate(array_op(col, PgBinOper::Contains, first, rest)),
    };

    Some(expr)
}

/// `col <op> ARRAY[...]` for array-valued columns.
fn array_op(
    col: Expr,
    op: PgBinOper,
    first: FilterScalar,
    rest: impl Iterator<Item = FilterScalar>,
) -> SimpleExpr {
    let values: Vec<FilterScalar> = std::iter::once(first).chain(rest).collect();
    SimpleExpr::Binary(
        Box::new(col.into()),
        BinOper::PgOperator(op),
        Box::new(array_literal(values)),
    )
}

/// A typed array value. Coercion yields one scalar type per column, so the
/// first element decides the element type.
fn array_literal(values: Vec<FilterScalar>) -> SimpleExpr {
    let ty = match values.first() {
        Some(FilterScalar::Number(_)) => ArrayType::Double,
        Some(FilterScalar::Boolean(_)) => ArrayType::Bool,
        Some(FilterScalar::Date(_)) => ArrayType::ChronoDateTimeUtc,
        Some(FilterScalar::Text(_)) | None => ArrayType::String,
    };
    let items: Vec<Value> = values.into_iter().map(Value::from).collect();
    SimpleExpr::Value(Value::Array(ty, Some(Box::new(items))))
}

fn negate(expr: SimpleExpr) -> SimpleExpr {
    SimpleExpr::Unary(UnOper::Not, Box::new(expr))
}

/// `%value%` with LIKE wildcards in the value escaped.
fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like_wildcards(value))
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
