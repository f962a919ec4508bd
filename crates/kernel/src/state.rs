//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::data_table::DataTableService;
use crate::db;
use crate::models::UserDirectory;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Data table execution service.
    tables: Arc<DataTableService>,

    /// User listing.
    users: Arc<UserDirectory>,
}

impl AppState {
    /// Connect to PostgreSQL and build the services.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config).await?;
        info!("connected to PostgreSQL");
        Self::with_pool(db, config)
    }

    /// Build the services on an existing pool.
    pub fn with_pool(db: PgPool, config: &Config) -> Result<Self> {
        let tables = DataTableService::new(db.clone(), config.query_timeout);
        let users = Arc::new(
            UserDirectory::new(tables.clone()).context("invalid user table configuration")?,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { db, tables, users }),
        })
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the data table service.
    pub fn tables(&self) -> &Arc<DataTableService> {
        &self.inner.tables
    }

    /// Get the user listing.
    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.inner.users
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
