//! Dashboard aggregation endpoint (`GET /api/dashboard`).
//!
//! Assembles the single payload the browser dashboard polls every 30
//! seconds: the latest reading, the trailing 24-hour history, the open
//! alerts, and the node roster. The four reads are independent; there is
//! no transaction across them, and the first failure short-circuits the
//! whole response as a 500.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::{Alert, Config, NodeRow, NodeStatus, Reading};

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new().route("/api/dashboard", get(handler))
}

async fn handler(State((pool, config)): State<(SqlitePool, Config)>) -> Response {
    // ---
    info!("GET /api/dashboard");

    let latest = match fetch_latest(&pool).await {
        Ok(latest) => latest,
        Err(e) => return super::db_error("Failed to load latest reading", e),
    };

    let cutoff = Utc::now() - Duration::hours(24);
    let history = match fetch_history(&pool, cutoff).await {
        Ok(history) => history,
        Err(e) => return super::db_error("Failed to load reading history", e),
    };

    let alerts = match fetch_open_alerts(&pool).await {
        Ok(alerts) => alerts,
        Err(e) => return super::db_error("Failed to load alerts", e),
    };

    let now = Utc::now();
    let nodes = match fetch_nodes(&pool).await {
        Ok(rows) => rows
            .into_iter()
            .map(|row| row.into_status(now, config.node_active_window_min))
            .collect::<Vec<NodeStatus>>(),
        Err(e) => return super::db_error("Failed to load nodes", e),
    };

    Json(serde_json::json!({
        "latest": latest,
        "history": history,
        "alerts": alerts,
        "nodes": nodes,
        "updatedAt": now.to_rfc3339(),
    }))
    .into_response()
}

// ---

async fn fetch_latest(pool: &SqlitePool) -> Result<Option<Reading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Reading>("SELECT * FROM readings ORDER BY created_at DESC LIMIT 1")
        .fetch_optional(pool)
        .await
}

/// Readings newer than `cutoff`, oldest first, ready for charting.
/// The cutoff is bound as a parameter so it shares the stored text encoding.
async fn fetch_history(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Reading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Reading>(
        "SELECT * FROM readings WHERE created_at > ? ORDER BY created_at",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Up to 10 unacknowledged alerts, newest first.
async fn fetch_open_alerts(pool: &SqlitePool) -> Result<Vec<Alert>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Alert>(
        "SELECT * FROM alerts WHERE acknowledged = 0 ORDER BY created_at DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await
}

async fn fetch_nodes(pool: &SqlitePool) -> Result<Vec<NodeRow>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, NodeRow>("SELECT * FROM nodes")
        .fetch_all(pool)
        .await
}
