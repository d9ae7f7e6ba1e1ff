//! REST API handlers
//!
//! Thin wrappers over [`Dashboard`](crate::dashboard::Dashboard): no input
//! parameters, JSON out, stamped with the time the poll was served.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::AppState;
use crate::logs::{serialize_iso, ActivityFeed, AgentStatusView};
use crate::memory::MemoryDigest;
use crate::snapshot::BusinessSnapshot;
use crate::system::SystemHealth;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("{context}: {e}"))),
    )
}

/// A payload plus the time it was produced
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamped<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(serialize_with = "serialize_iso")]
    pub updated_at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    fn now(body: T) -> Json<Self> {
        Json(Self {
            body,
            updated_at: Utc::now(),
        })
    }
}

/// Status list response
#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentStatusView>,
}

/// Health check response: service liveness plus host stats
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agents: usize,
    pub version: String,
    #[serde(flatten)]
    pub system: SystemHealth,
}

/// Aggregated activity feed
pub async fn get_activity(State(state): State<AppState>) -> Json<Stamped<ActivityFeed>> {
    Stamped::now(state.dashboard.activity().await)
}

/// Per-agent liveness
pub async fn get_agents(State(state): State<AppState>) -> Json<Stamped<AgentsResponse>> {
    let agents = state.dashboard.agent_statuses().await;
    Stamped::now(AgentsResponse { agents })
}

/// Business counters
pub async fn get_snapshot(
    State(state): State<AppState>,
) -> Result<Json<Stamped<BusinessSnapshot>>, ApiError> {
    match state.dashboard.snapshot().await {
        Ok(snapshot) => Ok(Stamped::now(snapshot)),
        Err(e) => Err(internal_error("Failed to build snapshot", e)),
    }
}

/// Memory digest
pub async fn get_memory(
    State(state): State<AppState>,
) -> Result<Json<Stamped<MemoryDigest>>, ApiError> {
    match state.dashboard.memory().await {
        Ok(digest) => Ok(Stamped::now(digest)),
        Err(e) => Err(internal_error("Failed to read memory", e)),
    }
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Stamped<HealthResponse>>, ApiError> {
    match state.dashboard.system_health().await {
        Ok(system) => Ok(Stamped::now(HealthResponse {
            status: "ok".to_string(),
            agents: state.dashboard.roster().len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            system,
        })),
        Err(e) => Err(internal_error("Failed to sample system health", e)),
    }
}
