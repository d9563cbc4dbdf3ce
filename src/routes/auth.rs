// ABOUTME: Account route handlers for registration, login, and password reset
// ABOUTME: Implements the anti-enumeration reset flow with single-use hashed tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! Authentication routes for account management
//!
//! This module handles user registration, login, and the two-phase password
//! reset flow. The reset-request endpoint deliberately answers with the same
//! generic success message whether or not the account exists, so the API
//! cannot be used to enumerate registered emails.

use crate::auth::{generate_reset_token, hash_password, hash_reset_token, verify_password};
use crate::constants::limits::{MIN_PASSWORD_LENGTH, RESET_TOKEN_EXPIRY_HOURS};
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::models::{User, UserRole};
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// User registration request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub user_type: UserRole,
}

/// User login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserRole,
}

/// Account payload returned on successful registration or login
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountData {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserRole,
    pub token: String,
}

/// Envelope for successful account operations
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub success: bool,
    pub data: AccountData,
}

/// Password reset request phase payload
///
/// Fields are optional so missing values map to an explicit 400 instead of a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub user_type: Option<String>,
}

/// Password reset request phase response
#[derive(Debug, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
    /// Echoed only outside production for testability
    #[serde(rename = "resetUrl", skip_serializing_if = "Option::is_none")]
    pub reset_url: Option<String>,
}

/// Password reset consume phase payload
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Generic success message response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Generic reset-request acknowledgement, returned whether or not the
/// account exists
const RESET_REQUESTED_MESSAGE: &str =
    "If your email is registered, you will receive a password reset link";

// ============================================================================
// Auth Routes
// ============================================================================

/// Account routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/forgot-password", post(Self::forgot_password))
            .route("/api/auth/reset-password", post(Self::reset_password))
            .with_state(resources)
    }

    /// Register a new patient account
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        // Only patient self-registration is allowed; staff accounts are
        // provisioned separately
        if request.user_type != UserRole::Patient {
            return Err(AppError::permission_denied(
                "Only patient registration is allowed",
            ));
        }

        if request.first_name.trim().is_empty() {
            return Err(AppError::missing_field("First name"));
        }
        if request.last_name.trim().is_empty() {
            return Err(AppError::missing_field("Last name"));
        }
        if request.email.trim().is_empty() {
            return Err(AppError::missing_field("Email"));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let password_hash = hash_password(request.password).await?;
        let user = User::new(
            request.email,
            password_hash,
            request.first_name,
            request.last_name,
            request.user_type,
        );

        resources.database.create_user(&user).await?;
        let token = resources.auth_manager.generate_token(&user)?;

        AppLogger::log_auth_event(&user.email, "register", true, None);

        let response = AccountResponse {
            success: true,
            data: AccountData {
                id: user.id.to_string(),
                email: user.email,
                name: format!("{} {}", user.first_name, user.last_name),
                user_type: user.role,
                token,
            },
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Log in to an existing account
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .get_user_by_email(&request.email)
            .await?;

        // A role mismatch is indistinguishable from bad credentials
        let Some(user) = user.filter(|u| u.role == request.user_type) else {
            AppLogger::log_auth_event(&request.email, "login", false, Some("unknown user or role"));
            return Err(AppError::auth_invalid("Invalid credentials"));
        };

        if !verify_password(request.password, user.password_hash.clone()).await {
            AppLogger::log_auth_event(&user.email, "login", false, Some("bad password"));
            return Err(AppError::auth_invalid("Invalid credentials"));
        }

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.email, "login", true, None);

        let response = AccountResponse {
            success: true,
            data: AccountData {
                id: user.id.to_string(),
                email: user.email,
                name: format!("{} {}", user.first_name, user.last_name),
                user_type: user.role,
                token,
            },
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Request phase of the password reset flow
    ///
    /// Always acknowledges with the same generic message so the endpoint
    /// cannot confirm whether an email is registered.
    async fn forgot_password(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ForgotPasswordRequest>,
    ) -> Result<Response, AppError> {
        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("Email"))?;
        let user_type = request
            .user_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("User type"))?;
        let role: UserRole = user_type.parse()?;

        info!("Password reset requested for: {email} ({role})");

        let user = resources
            .database
            .get_user_by_email_and_role(&email, role)
            .await?;

        let Some(user) = user else {
            info!("User not found for reset password: {email} ({role})");
            return Ok((
                StatusCode::OK,
                Json(ForgotPasswordResponse {
                    success: true,
                    message: RESET_REQUESTED_MESSAGE.to_owned(),
                    reset_url: None,
                }),
            )
                .into_response());
        };

        let (raw_token, token_hash) = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_EXPIRY_HOURS);

        resources
            .database
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        let reset_url = format!(
            "{}/reset-password?token={raw_token}&email={}",
            resources.config.app_behavior.site_url,
            urlencoding::encode(&user.email),
        );

        // Delivery is out-of-band (emailed link); the raw token is never
        // persisted. The log line stands in for the mail integration.
        info!("Password reset link for {}: {reset_url}", user.email);

        let echo_url = !resources.config.app_behavior.environment.is_production();
        let response = ForgotPasswordResponse {
            success: true,
            message: RESET_REQUESTED_MESSAGE.to_owned(),
            reset_url: echo_url.then_some(reset_url),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Consume phase of the password reset flow
    async fn reset_password(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ResetPasswordRequest>,
    ) -> Result<Response, AppError> {
        let token = request
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("Token"))?;
        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("Email"))?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("Password"))?;

        // Rejected before any database mutation
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        let token_hash = hash_reset_token(&token);
        let password_hash = hash_password(password).await?;

        // Single conditional update: password rotation and token clearing
        // land together or not at all, and a consumed token matches nothing
        let consumed = resources
            .database
            .consume_reset_token(&email, &token_hash, &password_hash)
            .await?;

        if !consumed {
            warn!("Invalid or expired token for reset password: {email}");
            return Err(AppError::invalid_input("Invalid or expired token"));
        }

        AppLogger::log_auth_event(&email, "password_reset", true, None);

        let response = SuccessResponse {
            success: true,
            message: "Password has been reset successfully. Please log in with your new password."
                .to_owned(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
