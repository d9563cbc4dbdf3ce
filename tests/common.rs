// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, resource, mock provider, and user creation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared test utilities for `symptohexe_server`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};
use symptohexe_server::{
    auth::AuthManager,
    config::environment::{
        AppBehaviorConfig, AuthConfig, DatabaseConfig, DatabaseUrl, Environment,
        ExternalServicesConfig, GeminiConfig, LogLevel, ServerConfig,
    },
    database::Database,
    errors::AppError,
    llm::{ChatRequest, ChatResponse, LlmProvider},
    models::{User, UserRole},
    resources::ServerResources,
};
use uuid::Uuid;

/// Shared JWT secret so tests can mint their own tokens
pub const TEST_JWT_SECRET: &[u8] = b"symptohexe-test-jwt-secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Mock completion service recording every request it receives
pub struct MockLlmProvider {
    reply: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlmProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion calls performed
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Snapshot of every request the orchestrator sent
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["mock-model"]
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(ChatResponse {
            content: self.reply.clone(),
            model: "mock-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Mock completion service that always fails upstream
pub struct FailingLlmProvider;

#[async_trait]
impl LlmProvider for FailingLlmProvider {
    fn name(&self) -> &'static str {
        "failing-mock"
    }

    fn display_name(&self) -> &'static str {
        "Failing Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["mock-model"]
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Err(AppError::external_service("mock", "simulated outage"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Test configuration with an in-memory database
pub fn create_test_config(environment: Environment) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        log_level: LogLevel::Warn,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
            auto_migrate: true,
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_vec(),
            jwt_expiry_hours: 24,
        },
        external_services: ExternalServicesConfig {
            gemini: GeminiConfig {
                api_key: None,
                base_url: "http://localhost:0".to_owned(),
                model: "mock-model".to_owned(),
            },
        },
        app_behavior: AppBehaviorConfig {
            site_url: "http://localhost:3000".to_owned(),
            environment,
            server_name: "symptohexe-server".to_owned(),
            server_version: env!("CARGO_PKG_VERSION").to_owned(),
        },
    }
}

/// Standard test database setup
pub async fn create_test_database() -> anyhow::Result<Database> {
    init_test_logging();
    Database::new("sqlite::memory:").await
}

/// Standard test resources with a mock completion service
///
/// Returns the resources plus a handle to the mock so tests can inspect the
/// requests the orchestrator sent.
pub async fn create_test_resources(
    reply: &str,
) -> anyhow::Result<(Arc<ServerResources>, Arc<MockLlmProvider>)> {
    create_test_resources_in(reply, Environment::Testing).await
}

/// Test resources with a mock completion service and explicit environment
pub async fn create_test_resources_in(
    reply: &str,
    environment: Environment,
) -> anyhow::Result<(Arc<ServerResources>, Arc<MockLlmProvider>)> {
    let database = create_test_database().await?;
    let mock = Arc::new(MockLlmProvider::new(reply));
    let resources = Arc::new(ServerResources::new(
        database,
        AuthManager::new(TEST_JWT_SECRET.to_vec(), 24),
        mock.clone(),
        Arc::new(create_test_config(environment)),
    ));
    Ok((resources, mock))
}

/// Test resources whose completion service always fails
pub async fn create_failing_resources() -> anyhow::Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        database,
        AuthManager::new(TEST_JWT_SECRET.to_vec(), 24),
        Arc::new(FailingLlmProvider),
        Arc::new(create_test_config(Environment::Testing)),
    )))
}

/// Create a patient account with a known password, hashed at reduced cost
/// for test speed
pub async fn create_test_user(database: &Database, password: &str) -> anyhow::Result<(Uuid, User)> {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    create_test_user_with_email(database, &email, password).await
}

/// Create a patient account with a specific email
pub async fn create_test_user_with_email(
    database: &Database,
    email: &str,
    password: &str,
) -> anyhow::Result<(Uuid, User)> {
    let password_hash = bcrypt::hash(password, 4)?;
    let user = User::new(email, password_hash, "Test", "Patient", UserRole::Patient);
    let user_id = user.id;

    database.create_user(&user).await?;
    Ok((user_id, user))
}
