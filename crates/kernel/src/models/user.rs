//! User model and the user listing table.

use chrono::{DateTime, Utc};
use sea_query::{Alias, Asterisk, Expr, Iden, Query, SelectStatement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data_table::{ActionResponse, ConfigError, DataTableService, QueryState, TableConfig};

/// Columns of the `user` table.
#[derive(Iden)]
pub enum User {
    Table,
    Id,
    Name,
    Email,
    Image,
    Role,
    Banned,
    CreatedAt,
    UpdatedAt,
}

/// Role names stored in `user.role`.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A row of the user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub banned: Option<bool>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

/// Totals over the filtered user set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub total: i64,
    pub user: i64,
    pub admin: i64,
    pub banned: i64,
    pub active: i64,
}

/// Table configuration for the user listing.
///
/// Column ids are the ones the UI uses; `status` filters on `banned`.
pub fn user_table_config() -> Result<TableConfig, ConfigError> {
    TableConfig::builder()
        .column("name", (User::Table, User::Name))
        .column("email", (User::Table, User::Email))
        .boolean_column("status", (User::Table, User::Banned))
        .column("role", (User::Table, User::Role))
        .date_column("updatedAt", (User::Table, User::UpdatedAt))
        .date_column("createdAt", (User::Table, User::CreatedAt))
        .global_filter(["name", "email"])
        .default_order("createdAt", true)
        .build()
}

/// Base statement for the listed rows.
pub fn user_rows_query() -> SelectStatement {
    Query::select()
        .columns([
            (User::Table, User::Id),
            (User::Table, User::Name),
            (User::Table, User::Email),
            (User::Table, User::Image),
            (User::Table, User::Role),
            (User::Table, User::Banned),
            (User::Table, User::CreatedAt),
            (User::Table, User::UpdatedAt),
        ])
        .from(User::Table)
        .to_owned()
}

/// Base statement for the per-role and per-status totals.
pub fn user_counts_query() -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(Asterisk).count(), Alias::new("total"))
        .expr_as(
            Expr::cust(format!(
                r#"COUNT(*) FILTER (WHERE "user"."role" = '{ROLE_USER}')"#
            )),
            Alias::new("user"),
        )
        .expr_as(
            Expr::cust(format!(
                r#"COUNT(*) FILTER (WHERE "user"."role" = '{ROLE_ADMIN}')"#
            )),
            Alias::new("admin"),
        )
        .expr_as(
            Expr::cust(r#"COUNT(*) FILTER (WHERE "user"."banned" = TRUE)"#),
            Alias::new("banned"),
        )
        .expr_as(
            Expr::cust(r#"COUNT(*) FILTER (WHERE "user"."banned" = FALSE)"#),
            Alias::new("active"),
        )
        .from(User::Table)
        .to_owned()
}

/// Lists users through the data table engine.
pub struct UserDirectory {
    tables: Arc<DataTableService>,
    config: TableConfig,
}

impl UserDirectory {
    /// Build the directory, validating the table configuration.
    pub fn new(tables: Arc<DataTableService>) -> Result<Self, ConfigError> {
        Ok(Self {
            tables,
            config: user_table_config()?,
        })
    }

    /// One page of users plus totals, or a failure message for the UI.
    pub async fn list(&self, state: &QueryState) -> ActionResponse<Vec<UserRow>, UserCounts> {
        match self
            .tables
            .list(user_rows_query(), user_counts_query(), state, &self.config)
            .await
        {
            Ok(result) => result.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to list users");
                ActionResponse::failure("failed to load users")
            }
        }
    }
}
