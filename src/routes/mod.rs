// ABOUTME: HTTP route assembly and shared request helpers
// ABOUTME: Builds the axum router and extracts bearer tokens from request headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! HTTP routes for the Symptohexe server
//!
//! Routes are grouped by feature: account management under `/api/auth` and
//! the AI doctor under `/api/doctor`. All handlers receive the shared
//! [`ServerResources`] through axum state.

pub mod auth;
pub mod doctor;

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let health = Router::new()
        .route("/api/health", get(health_check))
        .with_state(resources.clone());

    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(doctor::DoctorRoutes::routes(resources))
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Extract a bearer token from the authorization header
///
/// # Errors
///
/// Returns an auth error when the header is missing or not a bearer scheme
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::auth_invalid("Authorization header must use the Bearer scheme"))
}

/// Liveness endpoint with a database connectivity check
async fn health_check(State(resources): State<Arc<ServerResources>>) -> Response {
    match resources.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database": "connected",
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Health check database ping failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "database": "unreachable",
                })),
            )
                .into_response()
        }
    }
}
