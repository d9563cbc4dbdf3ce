// ABOUTME: User management database operations
// ABOUTME: Handles accounts, health profiles, and password reset token storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{DoctorProfile, HealthData, User, UserRole};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

impl Database {
    /// Create users and doctor profile tables
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'patient' CHECK (role IN ('patient', 'doctor', 'admin')),
                password_hash TEXT NOT NULL,
                phone TEXT,
                date_of_birth TEXT,
                gender TEXT,
                blood_type TEXT,
                allergies TEXT,
                medical_conditions TEXT,
                medications TEXT,
                specialty TEXT,
                experience TEXT,
                education TEXT,
                reset_token_hash TEXT,
                reset_token_expires_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(self.pool())
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_reset_token ON users(reset_token_hash)",
        )
        .execute(self.pool())
        .await?;

        // Profiles for personal AI doctor sessions. Health data is a JSON
        // document; history lives in chat_messages keyed by the same id.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS doctor_profiles (
                user_id TEXT PRIMARY KEY,
                health_data TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Create a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use or the insert fails
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::already_exists("Email already registered"));
        }

        sqlx::query(
            r"
            INSERT INTO users (
                id, email, first_name, last_name, role, password_hash,
                phone, date_of_birth, gender, blood_type,
                allergies, medical_conditions, medications,
                specialty, experience, education,
                reset_token_hash, reset_token_expires_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.date_of_birth)
        .bind(&user.gender)
        .bind(&user.blood_type)
        .bind(&user.allergies)
        .bind(&user.medical_conditions)
        .bind(&user.medications)
        .bind(&user.specialty)
        .bind(&user.experience)
        .bind(&user.education)
        .bind(&user.reset_token_hash)
        .bind(user.reset_token_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", &email.trim().to_lowercase())
            .await
    }

    /// Get a user matching both email and role
    ///
    /// Password reset requests and logins match on the exact pair; a role
    /// mismatch behaves identically to an unknown email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email_and_role(
        &self,
        email: &str,
        role: UserRole,
    ) -> AppResult<Option<User>> {
        Ok(self
            .get_user_by_email(email)
            .await?
            .filter(|user| user.role == role))
    }

    /// Internal implementation for getting a user
    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, first_name, last_name, role, password_hash,
                   phone, date_of_birth, gender, blood_type,
                   allergies, medical_conditions, medications,
                   specialty, experience, education,
                   reset_token_hash, reset_token_expires_at,
                   created_at, updated_at
            FROM users WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Convert a database row to a User struct
    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> AppResult<User> {
        let id: String = row.get("id");
        let role: String = row.get("role");

        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt user id: {e}")))?,
            email: row.get("email"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            role: UserRole::from_str(&role)?,
            password_hash: row.get("password_hash"),
            phone: row.get("phone"),
            date_of_birth: row.get("date_of_birth"),
            gender: row.get("gender"),
            blood_type: row.get("blood_type"),
            allergies: row.get("allergies"),
            medical_conditions: row.get("medical_conditions"),
            medications: row.get("medications"),
            specialty: row.get("specialty"),
            experience: row.get("experience"),
            education: row.get("education"),
            reset_token_hash: row.get("reset_token_hash"),
            reset_token_expires_at: row.get("reset_token_expires_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    // ========================================================================
    // Password Reset Operations
    // ========================================================================

    /// Store a reset token hash and expiry on a user record
    ///
    /// Only the one-way hash is persisted; the raw token travels out-of-band.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE users
            SET reset_token_hash = $1, reset_token_expires_at = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to store reset token: {e}")))?;

        Ok(())
    }

    /// Consume a reset token and rotate the password in one conditional update
    ///
    /// The new password hash is written and both token fields are cleared in
    /// a single `UPDATE ... WHERE` matching email, token hash, and a live
    /// expiry. Consumption succeeds only if the row still matches, which
    /// closes the double-consumption window between two concurrent attempts:
    /// whichever write lands first clears the hash, and the other matches
    /// nothing.
    ///
    /// Returns `true` if a token was consumed, `false` if no matching,
    /// unexpired token exists (including a second attempt after consumption).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn consume_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        new_password_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $1,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $2
            WHERE email = $3
              AND reset_token_hash = $4
              AND reset_token_expires_at > $2
            ",
        )
        .bind(new_password_hash)
        .bind(Utc::now())
        .bind(email.trim().to_lowercase())
        .bind(token_hash)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to consume reset token: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Doctor Profile Operations
    // ========================================================================

    /// Ensure a doctor profile exists for an identity, creating an empty one
    /// (no health data, no history) if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn ensure_doctor_profile(&self, user_id: &str) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO doctor_profiles (user_id, health_data, created_at, updated_at)
            VALUES ($1, '{}', $2, $2)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create doctor profile: {e}")))?;

        Ok(())
    }

    /// Get a doctor profile by identity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored health data is corrupt
    pub async fn get_doctor_profile(&self, user_id: &str) -> AppResult<Option<DoctorProfile>> {
        let row = sqlx::query(
            r"
            SELECT user_id, health_data, created_at
            FROM doctor_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get doctor profile: {e}")))?;

        row.map(|r| {
            let health_json: String = r.get("health_data");
            let health_data: HealthData = serde_json::from_str(&health_json)
                .map_err(|e| AppError::database(format!("Corrupt health data: {e}")))?;
            Ok(DoctorProfile {
                user_id: r.get("user_id"),
                health_data,
                created_at: r.get("created_at"),
            })
        })
        .transpose()
    }

    /// Update or insert health data for an identity
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the upsert fails
    pub async fn upsert_health_data(
        &self,
        user_id: &str,
        health_data: &HealthData,
    ) -> AppResult<()> {
        let health_json = serde_json::to_string(health_data)
            .map_err(|e| AppError::internal(format!("Failed to serialize health data: {e}")))?;
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO doctor_profiles (user_id, health_data, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT(user_id) DO UPDATE SET
                health_data = $2,
                updated_at = $3
            ",
        )
        .bind(user_id)
        .bind(health_json)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update health data: {e}")))?;

        Ok(())
    }
}
