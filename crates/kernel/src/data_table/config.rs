//! Table configuration: which columns a table exposes and how.
//!
//! A `TableConfig` is built once per table (typically at startup) and is
//! read-only afterwards. Cross-references are validated when it is built so
//! a broken table definition fails before the first request.

use sea_query::{ColumnRef, Expr, IntoColumnRef};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::types::{RawValue, SortEntry, Stage};

/// Custom coercion for boolean filter values. `None` drops the value.
pub type BooleanParser = fn(&RawValue) -> Option<bool>;

/// Errors raised while building a table configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("column '{0}' is defined more than once")]
    DuplicateColumn(String),

    #[error("global filter references unknown column '{0}'")]
    UnknownGlobalFilterColumn(String),

    #[error("global filter column '{0}' is not a text column")]
    GlobalFilterNotText(String),

    #[error("default order references unknown column '{0}'")]
    UnknownDefaultOrderColumn(String),
}

/// Handle to a data-source column.
#[derive(Debug, Clone)]
pub struct TableColumn(ColumnRef);

impl TableColumn {
    /// Wrap any sea-query column reference, e.g. `(User::Table, User::Name)`.
    pub fn new<C: IntoColumnRef>(column: C) -> Self {
        Self(column.into_column_ref())
    }

    /// Column expression for use in predicates and ORDER BY.
    pub fn expr(&self) -> Expr {
        Expr::col(self.0.clone())
    }
}

/// How raw filter values for a column are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    /// Values pass through as text.
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

/// A configured column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub column: TableColumn,
    pub ty: ColumnType,
    pub bool_parser: Option<BooleanParser>,
}

/// Static description of one server-driven table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    columns: HashMap<String, ColumnDef>,
    global_filter: Vec<String>,
    default_order: Option<SortEntry>,
    disabled: HashSet<Stage>,
}

impl TableConfig {
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::default()
    }

    /// Look up a column by id.
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.get(id)
    }

    /// Column ids searched by the global filter, in declaration order.
    pub fn global_filter_columns(&self) -> &[String] {
        &self.global_filter
    }

    pub fn default_order(&self) -> Option<&SortEntry> {
        self.default_order.as_ref()
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        !self.disabled.contains(&stage)
    }

    /// Copy of this config with additional stages switched off.
    ///
    /// Used for count queries: same predicates, no ORDER BY or LIMIT.
    pub fn with_disabled(&self, stages: impl IntoIterator<Item = Stage>) -> Self {
        let mut config = self.clone();
        config.disabled.extend(stages);
        config
    }
}

/// Builder for [`TableConfig`].
#[derive(Debug, Default)]
pub struct TableConfigBuilder {
    columns: HashMap<String, ColumnDef>,
    duplicates: Vec<String>,
    global_filter: Vec<String>,
    default_order: Option<SortEntry>,
    disabled: HashSet<Stage>,
}

impl TableConfigBuilder {
    /// Add a text column.
    pub fn column<C: IntoColumnRef>(self, id: &str, column: C) -> Self {
        self.typed_column(id, column, ColumnType::Text)
    }

    pub fn number_column<C: IntoColumnRef>(self, id: &str, column: C) -> Self {
        self.typed_column(id, column, ColumnType::Number)
    }

    pub fn date_column<C: IntoColumnRef>(self, id: &str, column: C) -> Self {
        self.typed_column(id, column, ColumnType::Date)
    }

    /// Add a boolean column using the built-in `true/false/1/0` coercion.
    pub fn boolean_column<C: IntoColumnRef>(self, id: &str, column: C) -> Self {
        self.typed_column(id, column, ColumnType::Boolean)
    }

    /// Add a boolean column with a custom coercion.
    pub fn boolean_column_with<C: IntoColumnRef>(
        self,
        id: &str,
        column: C,
        parser: BooleanParser,
    ) -> Self {
        self.insert(
            id,
            ColumnDef {
                column: TableColumn::new(column),
                ty: ColumnType::Boolean,
                bool_parser: Some(parser),
            },
        )
    }

    pub fn typed_column<C: IntoColumnRef>(self, id: &str, column: C, ty: ColumnType) -> Self {
        self.insert(
            id,
            ColumnDef {
                column: TableColumn::new(column),
                ty,
                bool_parser: None,
            },
        )
    }

    /// Columns searched by the global filter. Must all be text columns.
    pub fn global_filter<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_filter = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Ordering applied when the state requests none.
    pub fn default_order(mut self, id: &str, desc: bool) -> Self {
        self.default_order = Some(SortEntry {
            id: id.to_string(),
            desc,
        });
        self
    }

    pub fn disable(mut self, stage: Stage) -> Self {
        self.disabled.insert(stage);
        self
    }

    /// Validate cross-references and produce the config.
    pub fn build(self) -> Result<TableConfig, ConfigError> {
        if let Some(id) = self.duplicates.into_iter().next() {
            return Err(ConfigError::DuplicateColumn(id));
        }

        for id in &self.global_filter {
            match self.columns.get(id) {
                None => return Err(ConfigError::UnknownGlobalFilterColumn(id.clone())),
                Some(def) if def.ty != ColumnType::Text => {
                    return Err(ConfigError::GlobalFilterNotText(id.clone()));
                }
                Some(_) => {}
            }
        }

        if let Some(order) = &self.default_order
            && !self.columns.contains_key(&order.id)
        {
            return Err(ConfigError::UnknownDefaultOrderColumn(order.id.clone()));
        }

        Ok(TableConfig {
            columns: self.columns,
            global_filter: self.global_filter,
            default_order: self.default_order,
            disabled: self.disabled,
        })
    }

    fn insert(mut self, id: &str, def: ColumnDef) -> Self {
        if self.columns.insert(id.to_string(), def).is_some() {
            self.duplicates.push(id.to_string());
        }
        self
    }
}
