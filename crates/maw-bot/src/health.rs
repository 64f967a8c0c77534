//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

use crate::engine::Readiness;
use crate::recovery::LastSweep;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub bot_username: Option<String>,
    pub uptime_secs: u64,
    /// Completion time of the most recent recovery sweep
    pub last_sweep: Option<DateTime<Utc>>,
}

/// Shared application state for health checks
#[derive(Clone)]
pub struct AppState {
    pub start_time: SystemTime,
    pub bot_username: Arc<RwLock<Option<String>>>,
    pub readiness: Readiness,
    pub last_sweep: LastSweep,
}

impl AppState {
    pub fn new(readiness: Readiness, last_sweep: LastSweep) -> Self {
        Self {
            start_time: SystemTime::now(),
            bot_username: Arc::new(RwLock::new(None)),
            readiness,
            last_sweep,
        }
    }

    pub async fn set_bot_username(&self, username: String) {
        let mut guard = self.bot_username.write().await;
        *guard = Some(username);
    }
}

impl TypeMapKey for AppState {
    type Value = AppState;
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time.elapsed().unwrap_or_default().as_secs();
    let bot_username = state.bot_username.read().await.clone();
    let last_sweep = *state.last_sweep.read().await;
    let (code, status) = if state.readiness.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            bot_username,
            uptime_secs: uptime,
            last_sweep,
        }),
    )
}

async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Create the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Start the health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health check server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state() -> AppState {
        AppState::new(Readiness::new(), LastSweep::default())
    }

    #[tokio::test]
    async fn test_set_bot_username() {
        let state = state();
        assert!(state.bot_username.read().await.is_none());
        state.set_bot_username("maw".to_string()).await;
        assert_eq!(*state.bot_username.read().await, Some("maw".to_string()));
    }

    #[tokio::test]
    async fn test_health_unavailable_until_ready() {
        let state = state();
        let (code, Json(body)) = health_handler(State(state.clone())).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "starting");

        state.readiness.mark_store_ready();
        state.readiness.mark_gateway_ready();
        let (code, Json(body)) = health_handler(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_reports_last_sweep() {
        let state = state();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        *state.last_sweep.write().await = Some(at);
        let (_, Json(body)) = health_handler(State(state)).await;
        assert_eq!(body.last_sweep, Some(at));
    }

    #[tokio::test]
    async fn test_live_always_ok() {
        assert_eq!(live_handler().await, StatusCode::OK);
    }
}
