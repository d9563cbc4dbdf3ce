// ABOUTME: Configuration module grouping environment-driven server settings
// ABOUTME: Re-exports the ServerConfig loaded from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! Configuration management

/// Environment-based configuration for deployment-specific settings
pub mod environment;

pub use environment::{Environment, ServerConfig};
