// ABOUTME: Database operations for AI doctor conversation history
// ABOUTME: Handles appending exchanges, windowed context reads, and bulk clearing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Database representation of a stored conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonic row id defining insertion order
    pub id: i64,
    /// Identity the turn belongs to
    pub user_id: String,
    /// Role of the turn author (user or assistant)
    pub role: String,
    /// Turn content
    pub content: String,
    /// When the turn was recorded (ISO 8601)
    pub created_at: String,
}

/// Chat history database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a completed exchange: the user turn followed by the assistant
    /// turn, each individually timestamped
    ///
    /// Turns are only persisted after a successful completion call, so a
    /// failed exchange leaves no partial history.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails
    pub async fn append_exchange(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_reply: &str,
    ) -> AppResult<()> {
        self.add_message(user_id, MessageRole::User, user_message)
            .await?;
        self.add_message(user_id, MessageRole::Assistant, assistant_reply)
            .await?;
        Ok(())
    }

    /// Add a single turn to an identity's history
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn add_message(
        &self,
        user_id: &str,
        role: MessageRole,
        content: &str,
    ) -> AppResult<HistoryRecord> {
        let now = Utc::now().to_rfc3339();
        let role_str = role.as_str();

        let result = sqlx::query(
            r"
            INSERT INTO chat_messages (user_id, role, content, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(role_str)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

        Ok(HistoryRecord {
            id: result.last_insert_rowid(),
            user_id: user_id.to_owned(),
            role: role_str.to_owned(),
            content: content.to_owned(),
            created_at: now,
        })
    }

    /// Get all turns for an identity in chronological insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_messages(&self, user_id: &str) -> AppResult<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, role, content, created_at
            FROM chat_messages
            WHERE user_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    /// Get the last N turns for an identity (for the context window)
    ///
    /// The result is the tail of the ordered history, oldest of the window
    /// first, ready to replay to the completion service.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_recent_messages(
        &self,
        user_id: &str,
        limit: i64,
    ) -> AppResult<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, role, content, created_at
            FROM chat_messages
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        // Reverse to get chronological order
        let mut messages: Vec<HistoryRecord> = rows.iter().map(Self::row_to_record).collect();
        messages.reverse();

        Ok(messages)
    }

    /// Get the number of stored turns for an identity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn message_count(&self, user_id: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM chat_messages WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count messages: {e}")))?;

        Ok(row.get("count"))
    }

    /// Clear all history for an identity, leaving the health profile intact
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn clear_history(&self, user_id: &str) -> AppResult<i64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear history: {e}")))?;

        #[allow(clippy::cast_possible_wrap)]
        Ok(result.rows_affected() as i64)
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> HistoryRecord {
        HistoryRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            role: row.get("role"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        }
    }
}
