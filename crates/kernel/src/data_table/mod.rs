//! Server-driven data table engine.
//!
//! This module provides:
//! - TableConfig: per-table column registry with validated cross-references
//! - Predicate compiler: global search and column filters as sea-query conditions
//! - Query assembler: filters, sorting, and pagination applied to a SelectStatement
//! - URL codec: QueryState to and from query parameters
//! - DataTableService: concurrent row + count execution on PostgreSQL

mod assembler;
mod coerce;
mod config;
mod predicate;
mod service;
pub mod types;
pub mod url;

pub use assembler::{apply_data_table, count_query, to_sql};
pub use coerce::{Dropped, FilterScalar, coerce_values};
pub use config::{
    BooleanParser, ColumnDef, ColumnType, ConfigError, TableColumn, TableConfig,
    TableConfigBuilder,
};
pub use predicate::{column_filters_condition, compile_column_filter, global_filter_condition};
pub use service::{ActionResponse, DataTableService, TableResult};
pub use types::{
    Arity, ColumnFilter, FilterOperator, FilterValue, Pagination, PredicateKind, QueryState,
    RawValue, SortEntry, Stage,
};
pub use url::{StateKeys, decode_state, encode_state};
