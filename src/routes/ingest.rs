//! Ingestion endpoint for sensor readings (`POST /api/data`).
//!
//! A monitoring node posts one reading per interval; this route scores it,
//! persists it, refreshes the node's `last_seen`, and stores whatever
//! alerts the engine classifies. The computed score is echoed back so the
//! node firmware can display it locally.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{generate_alerts, health_score, AlertEvent, Config, ReadingPayload, SensorSample};

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new().route("/api/data", post(handler))
}

async fn handler(
    State((pool, _config)): State<(SqlitePool, Config)>,
    Json(payload): Json<ReadingPayload>,
) -> Response {
    // ---
    info!("POST /api/data - Reading from node {}", payload.node_id);

    let sample = SensorSample {
        mq135: payload.mq135,
        mq7: payload.mq7,
        mq4: payload.mq4,
        water_level: payload.water_level,
    };
    let score = health_score(&sample);
    debug!("POST /api/data - Health score {}", score);

    // One clock for the reading, the node refresh, and any alerts.
    let now = Utc::now();

    if let Err(e) = store_reading(&pool, &payload, score, now).await {
        return super::db_error("Failed to store reading", e);
    }

    if let Err(e) = touch_node(&pool, &payload.node_id, now).await {
        return super::db_error("Failed to update node last_seen", e);
    }

    let events = generate_alerts(&sample, score);
    if !events.is_empty() {
        info!(
            "POST /api/data - {} alert(s) raised for node {}",
            events.len(),
            payload.node_id
        );
    }

    if let Err(e) = insert_alerts(&pool, &payload.node_id, &events, now).await {
        return super::db_error("Failed to store alerts", e);
    }

    Json(serde_json::json!({ "success": true, "healthScore": score })).into_response()
}

// ---

/// Insert one reading row with the server-side timestamp.
async fn store_reading(
    pool: &SqlitePool,
    payload: &ReadingPayload,
    score: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO readings (
            node_id, mq135, mq7, mq4, water_level,
            temperature, humidity, health_score, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.node_id)
    .bind(payload.mq135)
    .bind(payload.mq7)
    .bind(payload.mq4)
    .bind(payload.water_level)
    .bind(payload.temperature)
    .bind(payload.humidity)
    .bind(score)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Upsert the node's `last_seen`, preserving location and install date
/// if an operator registered the node earlier.
async fn touch_node(
    pool: &SqlitePool,
    node_id: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO nodes (node_id, last_seen) VALUES (?, ?)
        ON CONFLICT(node_id) DO UPDATE SET last_seen = excluded.last_seen
        "#,
    )
    .bind(node_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the engine's alert events, unacknowledged.
async fn insert_alerts(
    pool: &SqlitePool,
    node_id: &str,
    events: &[AlertEvent],
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    // ---
    for event in events {
        sqlx::query(
            r#"
            INSERT INTO alerts (node_id, alert_type, message, severity, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(node_id)
        .bind(event.alert_type)
        .bind(&event.message)
        .bind(event.severity.as_str())
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::http::StatusCode;
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

    fn payload(node_id: &str, mq7: f64) -> ReadingPayload {
        // ---
        ReadingPayload {
            node_id: node_id.to_string(),
            mq135: 20.0,
            mq7,
            mq4: 50.0,
            water_level: 10.0,
            temperature: 24.5,
            humidity: 61.0,
        }
    }

    #[test]
    fn test_missing_sensor_fields_default_to_zero() {
        // ---
        let parsed: ReadingPayload = serde_json::from_str(r#"{"node_id": "NODE_3"}"#).unwrap();

        assert_eq!(parsed.node_id, "NODE_3");
        assert_eq!(parsed.mq135, 0.0);
        assert_eq!(parsed.water_level, 0.0);
        assert_eq!(parsed.humidity, 0.0);
    }

    #[tokio::test]
    async fn test_safe_reading_is_stored_without_alerts() {
        // ---
        let (pool, config) = test_state().await;

        let response = handler(State((pool.clone(), config)), Json(payload("NODE_1", 2.0))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let readings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM readings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(readings, 1);

        let score: i64 = sqlx::query_scalar("SELECT health_score FROM readings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(score, 100);

        let alerts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(alerts, 0);
    }

    #[tokio::test]
    async fn test_dangerous_reading_stores_a_danger_alert() {
        // ---
        let (pool, config) = test_state().await;

        // mq7 at 45 is past its danger threshold of 30.
        let response = handler(State((pool.clone(), config)), Json(payload("NODE_2", 45.0))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let (alert_type, severity, acknowledged): (String, String, bool) =
            sqlx::query_as("SELECT alert_type, severity, acknowledged FROM alerts")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(alert_type, "CO");
        assert_eq!(severity, "danger");
        assert!(!acknowledged);
    }

    #[tokio::test]
    async fn test_ingest_upserts_node_last_seen() {
        // ---
        let (pool, config) = test_state().await;

        // Pre-registered node keeps its location across ingests.
        sqlx::query("INSERT INTO nodes (node_id, location) VALUES ('NODE_1', 'Pump station A')")
            .execute(&pool)
            .await
            .unwrap();

        handler(
            State((pool.clone(), config.clone())),
            Json(payload("NODE_1", 2.0)),
        )
        .await;
        handler(State((pool.clone(), config)), Json(payload("NODE_1", 2.0))).await;

        let (count, location, last_seen): (i64, Option<String>, Option<String>) = sqlx::query_as(
            "SELECT COUNT(*), location, last_seen FROM nodes WHERE node_id = 'NODE_1'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(location.as_deref(), Some("Pump station A"));
        assert!(last_seen.is_some());
    }
}
