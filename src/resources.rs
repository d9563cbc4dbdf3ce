// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: Manages shared resources like the database pool, auth manager, and LLM provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # Server Resources Module
//!
//! Centralized resource container for dependency injection. Expensive shared
//! resources are constructed once at startup and shared across request
//! handlers through axum state, instead of being recreated per request or
//! memoized in globals.

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::llm::LlmProvider;
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Database handle owning the connection pool
    pub database: Arc<Database>,
    /// JWT authentication manager
    pub auth_manager: Arc<AuthManager>,
    /// Completion service provider (trait object so tests can inject a mock)
    pub llm: Arc<dyn LlmProvider>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create new server resources with proper Arc sharing
    #[must_use]
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        llm: Arc<dyn LlmProvider>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            llm,
            config,
        }
    }
}
