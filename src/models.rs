//! Data models for readings, alerts, nodes, and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Incoming sensor payload posted by a monitoring node (`POST /api/data`).
///
/// Nodes in the field occasionally drop fields from the payload, so every
/// sensor value defaults to 0 when absent; only `node_id` is required.
#[derive(Debug, Deserialize)]
pub struct ReadingPayload {
    // ---
    pub node_id: String,
    #[serde(default)]
    pub mq135: f64,
    #[serde(default)]
    pub mq7: f64,
    #[serde(default)]
    pub mq4: f64,
    #[serde(default)]
    pub water_level: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
}

/// A stored sensor reading. Immutable once inserted.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub id: i64,
    pub node_id: String,
    pub mq135: f64,
    pub mq7: f64,
    pub mq4: f64,
    pub water_level: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub health_score: i64,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
}

/// A stored alert row. Only `acknowledged` ever changes after insert.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Alert {
    // ---
    pub id: i64,
    pub node_id: String,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub acknowledged: bool,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
}

/// A node row as stored; `status` is derived at query time, not stored.
#[derive(Debug, sqlx::FromRow)]
pub struct NodeRow {
    // ---
    pub node_id: String,
    pub location: Option<String>,
    pub install_date: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// A node as reported to the dashboard, with its derived status.
#[derive(Debug, Serialize)]
pub struct NodeStatus {
    // ---
    pub id: String,
    pub location: Option<String>,
    pub install_date: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub status: &'static str,
}

impl NodeRow {
    // ---
    /// Derive `active`/`offline` from `last_seen` recency: a node is active
    /// iff it reported within the last `window_min` minutes.
    pub fn into_status(self, now: DateTime<Utc>, window_min: u32) -> NodeStatus {
        // ---
        let status = match self.last_seen {
            Some(seen) if now - seen <= chrono::Duration::minutes(window_min as i64) => "active",
            _ => "offline",
        };

        NodeStatus {
            id: self.node_id,
            location: self.location,
            install_date: self.install_date,
            last_seen: self.last_seen,
            status,
        }
    }
}

/// A login account. `password_hash` is an argon2 PHC string.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    // ---
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
