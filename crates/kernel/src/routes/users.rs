//! User listing API.
//!
//! `GET /api/users` reads the table state from the same query parameters
//! the table UI writes into its address bar (`pg-i`, `pg-s`, `col-s`,
//! `fil-glo`, plus `filter` for column filters) and answers with an action
//! response.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::data_table::{ActionResponse, StateKeys, decode_state};
use crate::error::{AppError, AppResult};
use crate::models::{UserCounts, UserRow};
use crate::state::AppState;

/// Create the user listing router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/users", get(list_users))
}

async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<ActionResponse<Vec<UserRow>, UserCounts>>> {
    let Query(pairs) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let table_state = decode_state(&pairs, &StateKeys::default());

    tracing::debug!(
        page = table_state.pagination.page_index,
        size = table_state.pagination.page_size,
        filters = table_state.column_filters.len(),
        "listing users"
    );

    Ok(Json(state.users().list(&table_state).await))
}
