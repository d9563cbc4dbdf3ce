// ABOUTME: JWT-based authentication for account sessions and scoped AI doctor sessions
// ABOUTME: Handles token generation, validation, password hashing, and reset token material
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # Authentication and Session Management
//!
//! This module provides JWT-based authentication for the Symptohexe server.
//! Tokens are signed with a process-wide shared secret (HS256) and verified
//! statelessly: signature plus expiry check only, no server-side session
//! table and therefore no revocation list. The short TTLs bound token
//! lifetime instead.

use crate::constants::limits::{DOCTOR_SESSION_EXPIRY_HOURS, RESET_TOKEN_BYTES};
use crate::errors::{AppError, AppResult};
use crate::models::{DoctorMode, User, UserRole};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// JWT validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper JWT format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let expired_for = current_time.signed_duration_since(*expired_at);
                write!(
                    f,
                    "JWT token expired {} minutes ago at {}",
                    expired_for.num_minutes(),
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match error {
            JwtValidationError::TokenExpired { .. } => Self::auth_expired(),
            JwtValidationError::TokenInvalid { reason } => Self::auth_invalid(reason),
            JwtValidationError::TokenMalformed { details } => Self::auth_malformed(details),
        }
    }
}

/// JWT claims for an account session
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (canonical identity claim)
    pub sub: String,
    /// User email
    pub email: String,
    /// Account role
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// JWT claims for a scoped AI doctor session
///
/// The identity is optional: a general session, or a personal session started
/// without an identity, carries no subject and operates statelessly.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID the session is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Operating mode encoded in the token
    pub mode: DoctorMode,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication manager for JWT tokens and password material
pub struct AuthManager {
    jwt_secret: Vec<u8>,
    token_expiry_hours: i64,
    /// Monotonic counter to ensure unique issued-at times for tokens
    token_counter: AtomicU64,
}

impl Clone for AuthManager {
    fn clone(&self) -> Self {
        Self {
            jwt_secret: self.jwt_secret.clone(),
            token_expiry_hours: self.token_expiry_hours,
            // Fresh counter for the cloned instance; each instance maintains
            // uniqueness independently
            token_counter: AtomicU64::new(0),
        }
    }
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub const fn new(jwt_secret: Vec<u8>, token_expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            token_expiry_hours,
            token_counter: AtomicU64::new(0),
        }
    }

    /// Unique issued-at timestamp in milliseconds
    fn unique_iat(&self) -> i64 {
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        Utc::now().timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0))
    }

    /// Generate an account session token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let expiry = Utc::now() + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: self.unique_iat(),
            exp: expiry.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
    }

    /// Generate a scoped AI doctor session token
    ///
    /// The token encodes the requested mode and, if present, the identity.
    /// TTL is fixed at one hour.
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_session_token(
        &self,
        mode: DoctorMode,
        user_id: Option<&str>,
    ) -> AppResult<String> {
        let expiry = Utc::now() + Duration::hours(DOCTOR_SESSION_EXPIRY_HOURS);

        let claims = SessionClaims {
            sub: user_id.map(ToOwned::to_owned),
            mode,
            iat: self.unique_iat(),
            exp: expiry.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
    }

    /// Validate an account session token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the signature is invalid, the
    /// token has expired, or the token is malformed
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims: Claims = self.decode_claims(token)?;
        Self::check_expiry(claims.exp)?;
        tracing::debug!("JWT token validation successful for user: {}", claims.sub);
        Ok(claims)
    }

    /// Validate a scoped AI doctor session token
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the signature is invalid, the
    /// token has expired, or the token is malformed
    pub fn validate_session_token(
        &self,
        token: &str,
    ) -> Result<SessionClaims, JwtValidationError> {
        let claims: SessionClaims = self.decode_claims(token)?;
        Self::check_expiry(claims.exp)?;
        Ok(claims)
    }

    /// Decode claims without expiration validation
    ///
    /// Verification is side-effect-free: signature check here, expiry check
    /// separately so expired tokens produce a distinct error.
    fn decode_claims<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<T, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<T>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Check expiration against the current time
    fn check_expiry(exp: i64) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        if current_time.timestamp() > exp {
            let expired_at = DateTime::from_timestamp(exp, 0).unwrap_or_else(Utc::now);
            tracing::warn!(
                "JWT token expired at {}",
                expired_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }
        Ok(())
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("JWT token validation failed: {:?}", e);

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }

}

/// Hash a password with bcrypt on a blocking thread
///
/// Bcrypt is CPU-bound, so the work is moved off the async executor.
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task is cancelled
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against a bcrypt hash on a blocking thread
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Generate a password reset token pair: the raw high-entropy value handed to
/// the user out-of-band, and the SHA-256 hash that is persisted
///
/// The raw value is never stored; consumption re-hashes the presented token
/// and matches against the stored hash.
#[must_use]
pub fn generate_reset_token() -> (String, String) {
    use rand::RngCore;

    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    let hash = hash_reset_token(&raw);
    (raw, hash)
}

/// One-way hash of a raw reset token
#[must_use]
pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Generate a random JWT secret for development use
///
/// Production deployments configure `JWT_SECRET` explicitly so tokens
/// survive restarts.
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    use rand::RngCore;

    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}
