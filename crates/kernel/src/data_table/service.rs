//! Data table execution service.
//!
//! Runs a compiled data table against PostgreSQL:
//! - the paged row query and the unpaged count query run concurrently
//! - each runs in its own transaction with a statement timeout
//! - rows come back through `row_to_json` and deserialize into `T`

use anyhow::{Context, Result};
use sea_query::SelectStatement;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::assembler::{apply_data_table, count_query, to_sql};
use super::config::TableConfig;
use super::types::QueryState;

/// One page of rows plus the counts for the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult<T, C> {
    pub data: Vec<T>,
    pub count: C,
}

/// Outcome reported to the table UI.
///
/// Serializes as `{"success": true, "data": [...], "count": {...}}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResponse<T, C> {
    Success { data: T, count: C },
    Failure { error: String },
}

impl<T, C> ActionResponse<T, C> {
    pub fn failure(error: impl Into<String>) -> Self {
        ActionResponse::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResponse::Success { .. })
    }
}

impl<T, C> From<TableResult<T, C>> for ActionResponse<Vec<T>, C> {
    fn from(result: TableResult<T, C>) -> Self {
        ActionResponse::Success {
            data: result.data,
            count: result.count,
        }
    }
}

impl<T: Serialize, C: Serialize> Serialize for ActionResponse<T, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ActionResponse::Success { data, count } => {
                let mut s = serializer.serialize_struct("ActionResponse", 3)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
                s.serialize_field("count", count)?;
                s.end()
            }
            ActionResponse::Failure { error } => {
                let mut s = serializer.serialize_struct("ActionResponse", 2)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
                s.end()
            }
        }
    }
}

/// Service for executing data table queries.
pub struct DataTableService {
    pool: PgPool,
    statement_timeout: Duration,
}

impl DataTableService {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            pool,
            statement_timeout,
        })
    }

    /// Fetch one page of `rows` and the aggregate row of `counts`.
    ///
    /// `rows` and `counts` are base statements (SELECT ... FROM ...); the
    /// table state is applied to both, with sorting and pagination skipped
    /// for the count.
    pub async fn list<T, C>(
        &self,
        rows: SelectStatement,
        counts: SelectStatement,
        state: &QueryState,
        config: &TableConfig,
    ) -> Result<TableResult<T, C>>
    where
        T: DeserializeOwned,
        C: DeserializeOwned,
    {
        let rows_sql = to_sql(&apply_data_table(rows, state, config));
        let count_sql = to_sql(&count_query(counts, state, config));

        tracing::debug!(sql = %rows_sql, "data table rows query");
        tracing::debug!(sql = %count_sql, "data table count query");

        let (rows, count) = tokio::try_join!(
            self.fetch_json(&rows_sql),
            self.fetch_json(&count_sql)
        )?;

        let data = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .context("failed to decode data table rows")?;

        let count = count
            .into_iter()
            .next()
            .context("count query returned no row")?;
        let count = serde_json::from_value(count).context("failed to decode data table counts")?;

        Ok(TableResult { data, count })
    }

    /// Run `sql` and return each row as a JSON object.
    async fn fetch_json(&self, sql: &str) -> Result<Vec<serde_json::Value>> {
        // SET LOCAL needs a transaction and resets on commit/rollback.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .context("failed to set statement timeout")?;

        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar(&format!("SELECT row_to_json(t) FROM ({sql}) t"))
                .fetch_all(&mut *tx)
                .await
                .context("failed to execute data table query")?;

        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_flag() {
        let response: ActionResponse<Vec<i32>, serde_json::Value> = TableResult {
            data: vec![1, 2],
            count: json!({"total": 2}),
        }
        .into();

        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "data": [1, 2], "count": {"total": 2}})
        );
    }

    #[test]
    fn failure_serializes_with_error() {
        let response: ActionResponse<Vec<i32>, ()> = ActionResponse::failure("forbidden");

        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": false, "error": "forbidden"})
        );
    }
}
