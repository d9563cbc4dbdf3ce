// ABOUTME: Application constants and configuration values shared across modules
// ABOUTME: Centralizes limits and service identifiers to avoid magic numbers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! Application-wide constants

/// Limits and expiry windows
pub mod limits {
    /// Default expiry for account session tokens in hours
    pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

    /// Expiry for AI doctor session tokens in hours
    pub const DOCTOR_SESSION_EXPIRY_HOURS: i64 = 1;

    /// Expiry for password reset tokens in hours
    pub const RESET_TOKEN_EXPIRY_HOURS: i64 = 1;

    /// Minimum accepted password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Number of prior conversation turns replayed to the completion service
    pub const CHAT_CONTEXT_MESSAGES: i64 = 10;

    /// Request timeout for the external completion service in seconds
    pub const COMPLETION_TIMEOUT_SECS: u64 = 30;

    /// Number of random bytes in a raw password reset token
    pub const RESET_TOKEN_BYTES: usize = 32;
}

/// Service identifiers used in logging and token claims
pub mod service_names {
    /// Canonical service name
    pub const SYMPTOHEXE_SERVER: &str = "symptohexe-server";
}
