//! HTTP route handlers.

pub mod health;
pub mod users;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Build the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(users::router())
        .fallback(|| async { AppError::NotFound })
}
