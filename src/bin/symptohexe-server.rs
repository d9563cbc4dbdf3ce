// ABOUTME: Server binary for the Symptohexe healthcare portal API
// ABOUTME: Loads configuration, connects the database, and serves the HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # Symptohexe API Server Binary
//!
//! Starts the healthcare portal API with account management, password reset,
//! and the AI doctor chat feature.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use symptohexe_server::{
    auth::AuthManager, config::environment::ServerConfig, database::Database,
    llm::GeminiProvider, logging, resources::ServerResources, routes,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "symptohexe-server")]
#[command(about = "Symptohexe healthcare portal API server")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Symptohexe API server");
    info!("{}", config.summary());

    // Initialize database: pool constructed here, injected everywhere,
    // closed on shutdown
    let database_url = args
        .database_url
        .unwrap_or_else(|| config.database.url.to_connection_string());
    let database = Database::new(&database_url).await?;
    info!("Database initialized: {database_url}");

    // Initialize authentication manager with the process-wide shared secret
    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiry_hours,
    );
    info!("Authentication manager initialized");

    // Completion service provider
    let gemini = &config.external_services.gemini;
    let llm = GeminiProvider::new(gemini.api_key.clone().unwrap_or_default())
        .with_base_url(gemini.base_url.clone())
        .with_default_model(gemini.model.clone());

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(llm),
        config.clone(),
    ));

    let app = routes::router(resources.clone());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Drain the pool before exit so in-flight writes land
    resources.database.close().await;
    info!("Database connections closed, shutting down");

    if let Err(e) = serve_result {
        error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}

/// Resolve when a shutdown signal is received
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown signal handler: {e}");
    }
    info!("Shutdown signal received");
}
