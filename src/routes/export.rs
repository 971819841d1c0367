//! CSV export of all stored readings (`GET /api/export`).

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{Config, Reading};

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new().route("/api/export", get(handler))
}

async fn handler(State((pool, _config)): State<(SqlitePool, Config)>) -> Response {
    // ---
    info!("GET /api/export");

    let readings = match sqlx::query_as::<_, Reading>(
        "SELECT * FROM readings ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await
    {
        Ok(readings) => readings,
        Err(e) => return super::db_error("Failed to export readings", e),
    };

    info!("GET /api/export - {} rows", readings.len());

    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sewer_data.csv\"",
            ),
        ],
        render_csv(&readings),
    )
        .into_response()
}

// ---

/// Render readings as CSV, one line per reading, no header row. The column
/// order is part of the export contract:
/// id, node_id, mq135, mq7, mq4, water_level, temperature, humidity,
/// health_score, created_at.
fn render_csv(readings: &[Reading]) -> String {
    // ---
    readings
        .iter()
        .map(|r| {
            format!(
                "{},{},{},{},{},{},{},{},{},{}",
                r.id,
                r.node_id,
                r.mq135,
                r.mq7,
                r.mq4,
                r.water_level,
                r.temperature,
                r.humidity,
                r.health_score,
                r.timestamp.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
