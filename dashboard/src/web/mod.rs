//! Web server module for the dashboard
//!
//! Serves the engine's views as JSON for a polling frontend.

pub mod api;
pub mod auth;
pub mod state;

use anyhow::Result;
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dashboard::Dashboard;
pub use state::AppState;

/// Configuration for the web server
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
}

/// Start the web server
pub async fn serve(config: WebConfig, dashboard: Dashboard) -> Result<()> {
    tracing::info!(
        "Watching {} agents: {}",
        dashboard.roster().len(),
        dashboard
            .roster()
            .iter()
            .map(|a| a.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if dashboard.roster().is_empty() {
        tracing::warn!("No agents configured, status and activity views will be empty");
    }

    let state = AppState::new(dashboard, config.api_token);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting web server on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/activity", get(api::get_activity))
        .route("/agents", get(api::get_agents))
        .route("/snapshot", get(api::get_snapshot))
        .route("/memory", get(api::get_memory))
        .route("/health", get(api::health_check))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{ActivityOptions, StatusOptions};
    use crate::memory::MemorySources;
    use crate::roster::{Agent, Roster};
    use crate::snapshot::SnapshotSources;
    use crate::system::ServiceTarget;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt; // for `collect`
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::tempdir;
    use tower::ServiceExt; // for `oneshot`

    fn dashboard(root: &Path) -> Dashboard {
        let roster = Roster::new(vec![
            Agent::new("jarvis", "Jarvis", "#63D866", root.join("jarvis")),
            Agent::new("codebot", "CodeBot", "#3A7BC8", root.join("codebot")),
        ]);
        Dashboard::new(
            roster,
            ActivityOptions::default(),
            StatusOptions::default(),
            SnapshotSources::from_workspaces(root, root),
            MemorySources::from_workspace(root),
        )
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_activity_endpoint() {
        let dir = tempdir().unwrap();
        let sessions = dir.path().join("jarvis");
        std::fs::create_dir(&sessions).unwrap();
        let line = json!({
            "type": "message",
            "id": "abc",
            "timestamp": "2026-01-17T10:00:00.000Z",
            "message": { "role": "assistant", "content": "Deployed the dashboard" }
        });
        std::fs::write(sessions.join("s.jsonl"), format!("{line}\nnot json\n")).unwrap();

        let app = create_router(AppState::new(dashboard(dir.path()), None));
        let (status, body) = get_json(app, "/api/activity").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["activity"][0]["id"], "jarvis-abc");
        assert_eq!(body["activity"][0]["agentName"], "Jarvis");
        assert!(body["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_agents_endpoint_lists_roster_in_order() {
        let dir = tempdir().unwrap();
        let app = create_router(AppState::new(dashboard(dir.path()), None));
        let (status, body) = get_json(app, "/api/agents").await;

        assert_eq!(status, StatusCode::OK);
        let agents = body["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0]["id"], "jarvis");
        assert_eq!(agents[1]["id"], "codebot");
        assert_eq!(agents[0]["status"], "offline");
        assert!(agents[0]["lastActiveAt"].is_null());
        assert!(agents[0]["sessionFile"].is_null());
    }

    #[tokio::test]
    async fn test_snapshot_endpoint() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("leads.md"), "Total Leads Found: 37\n## Lead A\n").unwrap();
        let app = create_router(AppState::new(dashboard(dir.path()), None));
        let (status, body) = get_json(app, "/api/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["leads"], 37);
        assert_eq!(body["properties"], 0);
        assert!(body["lastLogEntry"].is_null());
    }

    #[tokio::test]
    async fn test_memory_endpoint() {
        let dir = tempdir().unwrap();
        let app = create_router(AppState::new(dashboard(dir.path()), None));
        let (status, body) = get_json(app, "/api/memory").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["today"]["exists"], false);
        assert!(body["overnightLog"]["mtime"].is_null());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempdir().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let up = listener.local_addr().unwrap().to_string();
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let down = closed.local_addr().unwrap().to_string();
        drop(closed);

        let dashboard = dashboard(dir.path()).with_health(
            vec![
                ServiceTarget::new("gateway", up),
                ServiceTarget::new("ollama", down),
            ],
            PathBuf::from("/"),
            Duration::from_secs(2),
        );
        let app = create_router(AppState::new(dashboard, None));
        let (status, body) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["agents"], 2);
        assert!(body["uptime"]["seconds"].is_u64());
        assert!(body["uptime"]["human"].is_string());
        assert!(body.get("disk").is_some());
        assert!(body.get("memory").is_some());
        assert!(body["updatedAt"].is_string());

        let services = body["services"].as_array().unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0]["name"], "gateway");
        assert_eq!(services[0]["reachable"], true);
        assert_eq!(services[1]["name"], "ollama");
        assert_eq!(services[1]["reachable"], false);
    }

    #[tokio::test]
    async fn test_token_required_when_configured() {
        let dir = tempdir().unwrap();
        let app = create_router(AppState::new(dashboard(dir.path()), Some("s3cret".to_string())));

        let (status, _) = get_json(app.clone(), "/api/health").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::AUTHORIZATION, "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let dir = tempdir().unwrap();
        let app = create_router(AppState::new(dashboard(dir.path()), None));
        let (status, _) = get_json(app, "/api/leads").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
