//! Login and registration endpoints.
//!
//! Credentials are checked against argon2 hashes in the `users` table. The
//! token returned on login is an opaque UUID the dashboard stashes client
//! side; nothing re-validates it, which is deliberate for this deployment.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::{Config, User};

// ---

pub fn router() -> Router<(SqlitePool, Config)> {
    // ---
    Router::new()
        .route("/api/login", post(login_handler))
        .route("/api/register", post(register_handler))
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: String,
    password: String,
    role: Option<String>,
}

// ---

async fn login_handler(
    State((pool, _config)): State<(SqlitePool, Config)>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    // ---
    info!("POST /api/login - {}", payload.username);

    let user = match sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_optional(&pool)
        .await
    {
        Ok(user) => user,
        Err(e) => return super::db_error("Failed to look up user", e),
    };

    // Unknown user and wrong password produce the same response.
    let Some(user) = user else {
        warn!("POST /api/login - unknown user {}", payload.username);
        return invalid_credentials();
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            info!(
                "POST /api/login - user {} ({}) authenticated with role {}",
                user.id, user.username, user.role
            );
            Json(serde_json::json!({
                "success": true,
                "token": Uuid::new_v4().to_string(),
                "role": user.role,
            }))
            .into_response()
        }
        Ok(false) => {
            warn!("POST /api/login - bad password for {}", payload.username);
            invalid_credentials()
        }
        Err(e) => {
            error!("Password verification failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn invalid_credentials() -> Response {
    // ---
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Invalid credentials" })),
    )
        .into_response()
}

async fn register_handler(
    State((pool, _config)): State<(SqlitePool, Config)>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    // ---
    info!("POST /api/register - {}", payload.username);

    let hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let role = payload.role.unwrap_or_else(|| "staff".to_string());

    match sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
        .bind(&payload.username)
        .bind(&hash)
        .bind(&role)
        .execute(&pool)
        .await
    {
        Ok(result) => Json(serde_json::json!({
            "success": true,
            "id": result.last_insert_rowid(),
        }))
        .into_response(),
        // UNIQUE violations surface here too; duplicate usernames are a 500
        // just like any other persistence failure.
        Err(e) => super::db_error("Failed to create user", e),
    }
}
