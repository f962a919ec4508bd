//! Tabula Kernel Library
//!
//! Server-driven data tables over PostgreSQL, plus the HTTP surface that
//! serves them. The main entry point for running the server is the
//! `tabula` binary.

pub mod config;
pub mod data_table;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
