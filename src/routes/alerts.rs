//! Alert acknowledgement and listing.
//!
//! Acknowledging flips the `acknowledged` flag and nothing else; the row is
//! otherwise immutable. The update is idempotent, and an unknown id still
//! reports success, matching what the dashboard expects when two operators
//! race on the same alert.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{Alert, Config};

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new()
        .route("/api/alerts", get(list_handler))
        .route("/api/alerts/{id}/acknowledge", post(acknowledge_handler))
}

async fn acknowledge_handler(
    Path(id): Path<i64>,
    State((pool, _config)): State<(SqlitePool, Config)>,
) -> Response {
    // ---
    info!("POST /api/alerts/{}/acknowledge", id);

    match acknowledge(&pool, id).await {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => super::db_error("Failed to acknowledge alert", e),
    }
}

/// Recent alert feed, acknowledged or not. Newest first, capped at 200.
async fn list_handler(State((pool, _config)): State<(SqlitePool, Config)>) -> Response {
    // ---
    info!("GET /api/alerts");

    match sqlx::query_as::<_, Alert>("SELECT * FROM alerts ORDER BY created_at DESC LIMIT 200")
        .fetch_all(&pool)
        .await
    {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => super::db_error("Failed to list alerts", e),
    }
}

// ---

async fn acknowledge(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query("UPDATE alerts SET acknowledged = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
