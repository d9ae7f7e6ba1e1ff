//! Authentication middleware for the web server
//!
//! Provides bearer token authentication for API endpoints.
//! Auth is optional - if no token is configured, all requests are allowed.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use super::state::AppState;

/// Authentication middleware
///
/// If an API token is configured, validates the Authorization header.
/// If not, allows all requests.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_token) = state.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let path = request.uri().path().to_string();
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").map(str::to_string));

    match provided {
        Some(Some(token)) if token == expected_token => Ok(next.run(request).await),
        Some(Some(_)) => {
            tracing::warn!("Invalid bearer token provided for {}", path);
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(None) => {
            tracing::warn!("Invalid Authorization header format for {}", path);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header for {}", path);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
