use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use sqlx::SqlitePool;

use crate::Config;

mod alerts;
mod auth;
mod dashboard;
mod export;
mod health;
mod ingest;
mod nodes;

// ---

pub fn router(pool: SqlitePool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(dashboard::router())
        .merge(alerts::router())
        .merge(export::router())
        .merge(auth::router())
        .merge(nodes::router())
        .merge(health::router())
        .with_state((pool, config))
}

/// Shape a persistence failure as the API's 500 response, logging it first.
/// The raw driver message goes straight into the body; there is no retry.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> Response {
    // ---
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}
