//! Database schema management for `sewerflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::SqlitePool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings`, `alerts`, `nodes`, and `users` tables plus the
/// indexes behind the dashboard queries, then seeds a default admin login
/// if the `users` table is empty. Safe to call on every startup; no-op if
/// objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Readings are append-only; timestamps are bound from the server clock
    // rather than defaulted in SQL so stored values and bound query cutoffs
    // share one text encoding.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id      TEXT    NOT NULL,
            mq135        REAL    NOT NULL DEFAULT 0,
            mq7          REAL    NOT NULL DEFAULT 0,
            mq4          REAL    NOT NULL DEFAULT 0,
            water_level  REAL    NOT NULL DEFAULT 0,
            temperature  REAL    NOT NULL DEFAULT 0,
            humidity     REAL    NOT NULL DEFAULT 0,
            health_score INTEGER NOT NULL,
            created_at   TEXT    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Alerts reference node_id without a foreign key; orphaned alerts are
    // tolerated.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id      TEXT    NOT NULL,
            alert_type   TEXT    NOT NULL,
            message      TEXT    NOT NULL,
            severity     TEXT    NOT NULL,
            acknowledged INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Node status (active/offline) is derived from last_seen, not stored.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS nodes (
            node_id      TEXT PRIMARY KEY,
            location     TEXT,
            install_date TEXT,
            last_seen    TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role          TEXT NOT NULL DEFAULT 'staff'
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_node_id
            ON readings (node_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_created_at
            ON readings (created_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_acknowledged
            ON alerts (acknowledged);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    seed_default_admin(pool).await?;

    Ok(())
}

// ---

/// Insert the default `admin` login when no users exist yet, so a fresh
/// deployment can reach the dashboard. The password is `admin123`; change
/// it immediately outside development.
async fn seed_default_admin(pool: &SqlitePool) -> Result<()> {
    // ---
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count == 0 {
        let hash = crate::auth::hash_password("admin123")?;
        sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, 'admin')")
            .bind("admin")
            .bind(hash)
            .execute(pool)
            .await?;
        tracing::warn!("Seeded default admin account (username 'admin'); change its password");
    }

    Ok(())
}
