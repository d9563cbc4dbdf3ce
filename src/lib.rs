// ABOUTME: Main library entry point for the Symptohexe healthcare portal API
// ABOUTME: Provides REST endpoints for accounts, password reset, and AI doctor chat
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

#![deny(unsafe_code)]

//! # Symptohexe Server
//!
//! HTTP API backend for the Symptohexe healthcare portal. The server exposes
//! account management (registration, login, password reset) and the AI doctor
//! chat feature, backed by a SQLite document store and Google's Gemini
//! generative-text API.
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Auth**: JWT issuing and verification for account and chat sessions
//! - **Database**: user records, health profiles, and conversation history
//! - **LLM**: provider abstraction over the external completion service
//! - **Routes**: axum handlers wiring the above together
//! - **Config**: environment-driven configuration management
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use symptohexe_server::config::environment::ServerConfig;
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Symptohexe server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Authentication and session token management
pub mod auth;

/// Configuration management and environment parsing
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Database management for users, health profiles, and chat history
pub mod database;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction for the AI doctor chat integration
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Common data models for users and health profiles
pub mod models;

/// Centralized resource container for dependency injection
pub mod resources;

/// HTTP routes for account management and the AI doctor
pub mod routes;
