// ABOUTME: Core data models for the Symptohexe healthcare portal
// ABOUTME: Defines User, UserRole, DoctorMode, and health profile structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # Data Models
//!
//! This module contains the core data structures used throughout the
//! Symptohexe server.
//!
//! ## Design Principles
//!
//! - **Serializable**: All models support JSON serialization for the REST API
//! - **Type Safe**: Strong typing prevents common data handling errors
//! - **Extensible**: Optional fields accommodate partial profiles
//!
//! ## Core Models
//!
//! - `User`: A portal account (patient, doctor, or admin)
//! - `UserRole`: Account role enumeration
//! - `DoctorMode`: Operating mode of an AI doctor session
//! - `HealthData`: Self-reported health profile used for chat personalization

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Account role for a portal user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Patient account
    Patient,
    /// Doctor account
    Doctor,
    /// Administrator account
    Admin,
}

impl UserRole {
    /// String representation as stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Admin => "admin",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "patient" => Ok(Self::Patient),
            "doctor" => Ok(Self::Doctor),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!(
                "Unknown user role: {other}"
            ))),
        }
    }
}

/// Operating mode of an AI doctor session
///
/// `Personal` sessions persist and reuse a health profile and conversation
/// history per identity. `General` sessions are stateless across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorMode {
    /// Personalized session with persisted profile and history
    Personal,
    /// Stateless session with no memory between calls
    General,
}

impl DoctorMode {
    /// String representation used in token claims and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::General => "general",
        }
    }
}

impl Display for DoctorMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DoctorMode {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "personal" => Ok(Self::Personal),
            "general" => Ok(Self::General),
            _ => Err(AppError::invalid_input(
                "Valid doctor type required (personal or general)",
            )),
        }
    }
}

/// A portal user account
///
/// Emails are stored lowercased so uniqueness is case-insensitive. The
/// password is only ever held as a bcrypt hash; reset tokens are stored as a
/// SHA-256 hash plus expiry and cleared atomically on consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Email address (unique, lowercased)
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    pub role: UserRole,
    /// Bcrypt password hash
    pub password_hash: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Date of birth as entered by the user
    pub date_of_birth: Option<String>,
    /// Self-reported gender
    pub gender: Option<String>,
    /// Blood type
    pub blood_type: Option<String>,
    /// Known allergies (free text)
    pub allergies: Option<String>,
    /// Known medical conditions (free text)
    pub medical_conditions: Option<String>,
    /// Current medications (free text)
    pub medications: Option<String>,
    /// Doctor specialty (doctor accounts only)
    pub specialty: Option<String>,
    /// Years of experience (doctor accounts only)
    pub experience: Option<String>,
    /// Education summary (doctor accounts only)
    pub education: Option<String>,
    /// SHA-256 hash of an outstanding password reset token
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    /// Expiry of the outstanding reset token
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last account update time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the minimum required fields
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_lowercase(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            password_hash: password_hash.into(),
            phone: None,
            date_of_birth: None,
            gender: None,
            blood_type: None,
            allergies: None,
            medical_conditions: None,
            medications: None,
            specialty: None,
            experience: None,
            education: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name combining first and last names
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Self-reported health profile attached to a personal AI doctor session
///
/// All fields are optional; absent fields are simply omitted from the
/// personalization block sent to the completion service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthData {
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Self-reported gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Known medical conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    /// Current medications
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    /// Known allergies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,
}

impl HealthData {
    /// Whether no health information has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.gender.is_none()
            && self.conditions.is_empty()
            && self.medications.is_empty()
            && self.allergies.is_empty()
    }
}

/// A stored AI doctor profile: identity plus health data
///
/// Created empty when a personal session is first initialized; the
/// conversation history lives in its own table keyed by the same identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    /// Identity the profile belongs to
    pub user_id: String,
    /// Health profile used for chat personalization
    pub health_data: HealthData,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_email_normalized() {
        let user = User::new(
            "  Alice@Example.COM ",
            "hash",
            "Alice",
            "Smith",
            UserRole::Patient,
        );
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.full_name(), "Alice Smith");
    }

    #[test]
    fn test_doctor_mode_parsing() {
        assert_eq!("personal".parse::<DoctorMode>().unwrap(), DoctorMode::Personal);
        assert_eq!("general".parse::<DoctorMode>().unwrap(), DoctorMode::General);
        assert!("surgeon".parse::<DoctorMode>().is_err());
    }

    #[test]
    fn test_health_data_empty() {
        assert!(HealthData::default().is_empty());
        let data = HealthData {
            age: Some(42),
            ..HealthData::default()
        };
        assert!(!data.is_empty());
    }
}
