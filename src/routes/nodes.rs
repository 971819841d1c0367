//! Node registration (`POST /api/nodes`).
//!
//! Ingestion creates node rows on the fly; this route lets an operator
//! attach a location and install date, before or after the node first
//! reports. Re-posting updates the description without touching
//! `last_seen`.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::Config;

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new().route("/api/nodes", post(handler))
}

#[derive(Debug, Deserialize)]
struct NodePayload {
    id: String,
    location: Option<String>,
    install_date: Option<String>,
}

async fn handler(
    State((pool, _config)): State<(SqlitePool, Config)>,
    Json(payload): Json<NodePayload>,
) -> Response {
    // ---
    info!("POST /api/nodes - {}", payload.id);

    match sqlx::query(
        r#"
        INSERT INTO nodes (node_id, location, install_date) VALUES (?, ?, ?)
        ON CONFLICT(node_id) DO UPDATE SET
            location = excluded.location,
            install_date = excluded.install_date
        "#,
    )
    .bind(&payload.id)
    .bind(&payload.location)
    .bind(&payload.install_date)
    .execute(&pool)
    .await
    {
        Ok(_) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => super::db_error("Failed to register node", e),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_state() -> (SqlitePool, Config) {
        // ---
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::schema::create_schema(&pool).await.unwrap();

        let config = Config {
            db_url: "sqlite::memory:".to_string(),
            db_pool_max: 1,
            port: 0,
            node_active_window_min: 10,
        };
        (pool, config)
    }

    #[tokio::test]
    async fn test_reregistering_preserves_last_seen() {
        // ---
        let (pool, config) = test_state().await;

        sqlx::query("INSERT INTO nodes (node_id, last_seen) VALUES ('NODE_1', ?)")
            .bind(Utc::now())
            .execute(&pool)
            .await
            .unwrap();

        let response = handler(
            State((pool.clone(), config)),
            Json(NodePayload {
                id: "NODE_1".to_string(),
                location: Some("Manhole 12, Elm St".to_string()),
                install_date: Some("2025-11-02".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let (location, last_seen): (Option<String>, Option<String>) =
            sqlx::query_as("SELECT location, last_seen FROM nodes WHERE node_id = 'NODE_1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(location.as_deref(), Some("Manhole 12, Elm St"));
        assert!(last_seen.is_some(), "registration must not clear last_seen");
    }
}
