// ABOUTME: Integration tests for account routes and the password reset flow
// ABOUTME: Covers registration, login, anti-enumeration, and reset token consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{create_test_resources, create_test_resources_in, create_test_user};
use helpers::axum_test::AxumTestRequest;
use symptohexe_server::config::environment::Environment;
use symptohexe_server::routes::auth::{AccountResponse, ForgotPasswordResponse, SuccessResponse};
use symptohexe_server::routes::router;

use axum::http::StatusCode;
use serde_json::json;

/// Pull the raw reset token out of a development-mode reset URL
fn token_from_reset_url(reset_url: &str) -> String {
    reset_url
        .split("token=")
        .nth(1)
        .expect("reset URL has token param")
        .split('&')
        .next()
        .expect("token param terminated")
        .to_owned()
}

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_register_patient() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "Ada@Example.com",
            "password": "correct-horse",
            "userType": "patient"
        }))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: AccountResponse = response.json();
    assert!(body.success);
    assert_eq!(body.data.email, "ada@example.com");
    assert_eq!(body.data.name, "Ada Lovelace");
    assert!(!body.data.token.is_empty());
}

#[tokio::test]
async fn test_register_rejects_non_patients_and_duplicates() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "firstName": "Greg",
            "lastName": "House",
            "email": "house@example.com",
            "password": "diagnostics",
            "userType": "doctor"
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let first = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "dup@example.com",
            "password": "correct-horse",
            "userType": "patient"
        }))
        .send(app.clone())
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "DUP@example.com",
            "password": "correct-horse",
            "userType": "patient"
        }))
        .send(app)
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "short@example.com",
            "password": "short",
            "userType": "patient"
        }))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_roundtrip() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (_id, user) = create_test_user(&resources.database, "hunter2hunter2")
        .await
        .unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({
            "email": user.email,
            "password": "hunter2hunter2",
            "userType": "patient"
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AccountResponse = response.json();
    assert_eq!(body.data.email, user.email);

    // Wrong password and wrong role fail identically
    let bad_password = AxumTestRequest::post("/api/auth/login")
        .json(&json!({
            "email": user.email,
            "password": "not-the-password",
            "userType": "patient"
        }))
        .send(app.clone())
        .await;
    assert_eq!(bad_password.status_code(), StatusCode::UNAUTHORIZED);

    let wrong_role = AxumTestRequest::post("/api/auth/login")
        .json(&json!({
            "email": user.email,
            "password": "hunter2hunter2",
            "userType": "doctor"
        }))
        .send(app)
        .await;
    assert_eq!(wrong_role.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Password Reset: Request Phase
// ============================================================================

#[tokio::test]
async fn test_forgot_password_known_and_unknown_users_answer_identically() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (_id, user) = create_test_user(&resources.database, "hunter2hunter2")
        .await
        .unwrap();
    let app = router(resources);

    let known = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": user.email, "userType": "patient"}))
        .send(app.clone())
        .await;
    assert_eq!(known.status_code(), StatusCode::OK);
    let known: ForgotPasswordResponse = known.json();

    let unknown = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": "absent@x.com", "userType": "patient"}))
        .send(app)
        .await;
    assert_eq!(unknown.status_code(), StatusCode::OK);
    let unknown: ForgotPasswordResponse = unknown.json();

    // Same acknowledgement either way; only the dev-mode URL differs
    assert!(known.success && unknown.success);
    assert_eq!(known.message, unknown.message);
    assert!(known.reset_url.is_some());
    assert!(unknown.reset_url.is_none());
}

#[tokio::test]
async fn test_forgot_password_empty_store() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": "absent@x.com", "userType": "patient"}))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ForgotPasswordResponse = response.json();
    assert!(body.success);
    assert!(body.reset_url.is_none());
}

#[tokio::test]
async fn test_forgot_password_production_never_echoes_url() {
    let (resources, _mock) = create_test_resources_in("unused", Environment::Production)
        .await
        .unwrap();
    let (_id, user) = create_test_user(&resources.database, "hunter2hunter2")
        .await
        .unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": user.email, "userType": "patient"}))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ForgotPasswordResponse = response.json();
    assert!(body.success);
    assert!(body.reset_url.is_none());
}

#[tokio::test]
async fn test_forgot_password_missing_fields() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let app = router(resources);

    let response = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": "someone@example.com"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"userType": "patient"}))
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Password Reset: Consume Phase
// ============================================================================

#[tokio::test]
async fn test_reset_password_happy_path_and_single_use() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (_id, user) = create_test_user(&resources.database, "old-password-1")
        .await
        .unwrap();
    let app = router(resources);

    let requested = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": user.email, "userType": "patient"}))
        .send(app.clone())
        .await;
    let requested: ForgotPasswordResponse = requested.json();
    let raw_token = token_from_reset_url(&requested.reset_url.unwrap());

    let reset = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": raw_token,
            "email": user.email,
            "password": "new-password-99"
        }))
        .send(app.clone())
        .await;
    assert_eq!(reset.status_code(), StatusCode::OK);
    let reset: SuccessResponse = reset.json();
    assert!(reset.success);

    // The new password logs in, the old one does not
    let login = AxumTestRequest::post("/api/auth/login")
        .json(&json!({
            "email": user.email,
            "password": "new-password-99",
            "userType": "patient"
        }))
        .send(app.clone())
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);

    let stale_login = AxumTestRequest::post("/api/auth/login")
        .json(&json!({
            "email": user.email,
            "password": "old-password-1",
            "userType": "patient"
        }))
        .send(app.clone())
        .await;
    assert_eq!(stale_login.status_code(), StatusCode::UNAUTHORIZED);

    // Second consumption attempt fails: the hash no longer matches anything
    let replay = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": raw_token,
            "email": user.email,
            "password": "another-password"
        }))
        .send(app)
        .await;
    assert_eq!(replay.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_password_short_password_rejected_before_consumption() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (_id, user) = create_test_user(&resources.database, "old-password-1")
        .await
        .unwrap();
    let app = router(resources);

    let requested = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": user.email, "userType": "patient"}))
        .send(app.clone())
        .await;
    let requested: ForgotPasswordResponse = requested.json();
    let raw_token = token_from_reset_url(&requested.reset_url.unwrap());

    let short = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": raw_token,
            "email": user.email,
            "password": "tiny"
        }))
        .send(app.clone())
        .await;
    assert_eq!(short.status_code(), StatusCode::BAD_REQUEST);

    // The rejected attempt mutated nothing: the token still consumes
    let valid = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": raw_token,
            "email": user.email,
            "password": "long-enough-now"
        }))
        .send(app)
        .await;
    assert_eq!(valid.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_reset_password_expired_token_rejected() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (user_id, user) = create_test_user(&resources.database, "old-password-1")
        .await
        .unwrap();

    // Plant a token whose expiry has already passed; the hash matches but
    // consumption must still fail
    let raw_token = "aaaabbbbccccdddd";
    let token_hash = symptohexe_server::auth::hash_reset_token(raw_token);
    let expired_at = chrono::Utc::now() - chrono::Duration::hours(2);
    resources
        .database
        .set_reset_token(user_id, &token_hash, expired_at)
        .await
        .unwrap();

    let app = router(resources);
    let response = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": raw_token,
            "email": user.email,
            "password": "new-password-99"
        }))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_password_wrong_token_rejected() {
    let (resources, _mock) = create_test_resources("unused").await.unwrap();
    let (_id, user) = create_test_user(&resources.database, "old-password-1")
        .await
        .unwrap();
    let app = router(resources);

    // Request a real token, then present a different one
    let _requested = AxumTestRequest::post("/api/auth/forgot-password")
        .json(&json!({"email": user.email, "userType": "patient"}))
        .send(app.clone())
        .await;

    let response = AxumTestRequest::post("/api/auth/reset-password")
        .json(&json!({
            "token": "ffffffffffffffff",
            "email": user.email,
            "password": "new-password-99"
        }))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
