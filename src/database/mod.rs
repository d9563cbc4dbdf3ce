// ABOUTME: Database management for users, health profiles, and chat history
// ABOUTME: Owns the SQLite pool lifecycle and schema migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # Database Management
//!
//! This module provides persistence for the Symptohexe server. The
//! [`Database`] handle is constructed explicitly at startup, injected through
//! [`crate::resources::ServerResources`], and closed at shutdown - there is
//! no lazily-memoized global connection.

mod chat;
mod users;

pub use chat::{ChatManager, HistoryRecord};

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for user and chat history storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_chat().await?;
        Ok(())
    }

    /// Close the connection pool for graceful shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Verify connectivity with a trivial query
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create chat history tables
    async fn migrate_chat(&self) -> Result<()> {
        // Integer rowid keys give a stable insertion order for history replay
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_user_id ON chat_messages(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
