// ABOUTME: AI doctor route handlers for session init, chat, health data, and history
// ABOUTME: Orchestrates profile-conditioned prompt construction and history persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! AI doctor routes
//!
//! This module handles the AI doctor session lifecycle: issuing scoped
//! session tokens, relaying chat messages to the completion service, and
//! managing the health profile and conversation history of personal
//! sessions. All handlers except init require a bearer session token.
//!
//! Context building deliberately degrades instead of failing: if the profile
//! or history lookup errors, the chat proceeds with empty context and the
//! failure is only logged. Persistence failures after a successful
//! completion likewise never cost the user their reply.

use super::bearer_token;
use crate::auth::SessionClaims;
use crate::constants::limits::CHAT_CONTEXT_MESSAGES;
use crate::database::{ChatManager, HistoryRecord};
use crate::errors::AppError;
use crate::llm::{prompts, ChatMessage, ChatRequest, MessageRole};
use crate::models::{DoctorMode, HealthData};
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to initialize an AI doctor session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSessionRequest {
    /// Requested mode; must be "personal" or "general"
    pub doctor_type: Option<String>,
    /// Identity for personal sessions
    pub user_id: Option<String>,
}

/// Response for session initialization
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSessionResponse {
    /// Scoped session token (TTL one hour)
    pub token: String,
    /// Mode encoded in the token
    pub doctor_type: DoctorMode,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    /// The user's message
    pub message: Option<String>,
}

/// Response with the assistant's reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    /// Generated reply text
    pub message: String,
}

/// A conversation turn as exposed by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnView {
    /// Turn author (user or assistant)
    pub role: String,
    /// Turn content
    pub content: String,
    /// When the turn was recorded (ISO 8601)
    pub timestamp: String,
}

impl From<HistoryRecord> for TurnView {
    fn from(record: HistoryRecord) -> Self {
        Self {
            role: record.role,
            content: record.content,
            timestamp: record.created_at,
        }
    }
}

/// Health profile and history for a personal session
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDataResponse {
    /// Stored health profile
    pub health_data: HealthData,
    /// Full conversation history in insertion order
    pub chat_history: Vec<TurnView>,
}

/// Request to replace the stored health profile
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHealthDataRequest {
    /// New health profile
    pub health_data: Option<HealthData>,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Doctor Routes
// ============================================================================

/// AI doctor routes handler
pub struct DoctorRoutes;

impl DoctorRoutes {
    /// Create all AI doctor routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/doctor/init", post(Self::init_session))
            .route("/api/doctor/chat", post(Self::chat))
            .route("/api/doctor/health-data", get(Self::get_health_data))
            .route("/api/doctor/health-data", post(Self::update_health_data))
            .route("/api/doctor/history", delete(Self::clear_history))
            .with_state(resources)
    }

    /// Authenticate a scoped session token from the request headers
    fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<SessionClaims, AppError> {
        let token = bearer_token(headers)?;
        resources
            .auth_manager
            .validate_session_token(&token)
            .map_err(AppError::from)
    }

    /// Require a personal-mode session, returning 403 otherwise
    fn require_personal(claims: &SessionClaims) -> Result<(), AppError> {
        if claims.mode != DoctorMode::Personal {
            return Err(AppError::permission_denied(
                "This endpoint is only for the Personal AI Doctor",
            ));
        }
        Ok(())
    }

    /// Initialize an AI doctor session and issue a scoped token
    async fn init_session(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<InitSessionRequest>,
    ) -> Result<Response, AppError> {
        let mode = request
            .doctor_type
            .as_deref()
            .ok_or_else(|| {
                AppError::invalid_input("Valid doctor type required (personal or general)")
            })
            .and_then(DoctorMode::from_str)?;

        // For a personal session with an identity, make sure a profile
        // record exists. A storage failure here only degrades the session to
        // stateless operation; the token is issued regardless.
        if mode == DoctorMode::Personal {
            if let Some(user_id) = request.user_id.as_deref() {
                if let Err(e) = resources.database.ensure_doctor_profile(user_id).await {
                    error!("Failed to ensure doctor profile for {user_id}: {e}");
                }
            }
        }

        let token = resources
            .auth_manager
            .generate_session_token(mode, request.user_id.as_deref())?;

        info!("Initialized {mode} AI doctor session");

        let response = InitSessionResponse {
            token,
            doctor_type: mode,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle a chat turn: build context, call the completion service once,
    /// and persist the exchange for personal sessions
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatMessageRequest>,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, &resources)?;

        let message = request
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("Message"))?;

        let (health_block, prior_turns) = Self::load_personal_context(&claims, &resources).await;

        // One completion call, no retry. The user sees a generic message on
        // failure; the details go to the logs.
        let llm_request =
            Self::build_llm_request(&resources, &claims, &health_block, &prior_turns, &message);
        let reply = match resources.llm.complete(&llm_request).await {
            Ok(response) => response.content,
            Err(e) => {
                error!("Completion service error: {e}");
                return Err(AppError::upstream());
            }
        };

        // Persist the exchange for personal sessions. The reply is already
        // in hand, so a storage failure is logged and swallowed.
        if claims.mode == DoctorMode::Personal {
            if let Some(user_id) = claims.sub.as_deref() {
                let chat = ChatManager::new(resources.database.pool().clone());
                if let Err(e) = chat.append_exchange(user_id, &message, &reply).await {
                    error!("Failed to save chat history for {user_id}: {e}");
                }
            }
        }

        Ok((StatusCode::OK, Json(ChatMessageResponse { message: reply })).into_response())
    }

    /// Load the health block and recent turns for a personal session
    ///
    /// Every failure path degrades to empty context: the chat must proceed
    /// even when the store is unavailable.
    async fn load_personal_context(
        claims: &SessionClaims,
        resources: &Arc<ServerResources>,
    ) -> (Option<String>, Vec<HistoryRecord>) {
        if claims.mode != DoctorMode::Personal {
            return (None, Vec::new());
        }
        let Some(user_id) = claims.sub.as_deref() else {
            return (None, Vec::new());
        };

        let health_block = match resources.database.get_doctor_profile(user_id).await {
            Ok(profile) => profile.and_then(|p| prompts::format_health_block(&p.health_data)),
            Err(e) => {
                warn!("Failed to load health profile for {user_id}: {e}");
                None
            }
        };

        let chat = ChatManager::new(resources.database.pool().clone());
        let prior_turns = match chat.get_recent_messages(user_id, CHAT_CONTEXT_MESSAGES).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!("Failed to load chat history for {user_id}: {e}");
                Vec::new()
            }
        };

        (health_block, prior_turns)
    }

    /// Assemble the completion request: persona system message, prior turns
    /// oldest-first, then the constructed prompt as the final user message
    fn build_llm_request(
        resources: &Arc<ServerResources>,
        claims: &SessionClaims,
        health_block: &Option<String>,
        prior_turns: &[HistoryRecord],
        message: &str,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(prior_turns.len() + 2);
        messages.push(ChatMessage::system(prompts::get_doctor_system_prompt()));

        for turn in prior_turns {
            let role = if turn.role == MessageRole::Assistant.as_str() {
                MessageRole::Assistant
            } else {
                MessageRole::User
            };
            messages.push(ChatMessage::new(role, &turn.content));
        }

        let prompt = prompts::build_chat_prompt(claims.mode, health_block.as_deref(), message);
        messages.push(ChatMessage::user(prompt));

        ChatRequest::new(messages)
            .with_model(&resources.config.external_services.gemini.model)
    }

    /// Return the stored health profile and full history of a personal session
    async fn get_health_data(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, &resources)?;
        Self::require_personal(&claims)?;

        let user_id = claims
            .sub
            .as_deref()
            .ok_or_else(|| AppError::not_found("User"))?;

        let profile = resources
            .database
            .get_doctor_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let chat = ChatManager::new(resources.database.pool().clone());
        let history = chat.get_messages(user_id).await?;

        let response = HealthDataResponse {
            health_data: profile.health_data,
            chat_history: history.into_iter().map(TurnView::from).collect(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Replace the stored health profile of a personal session
    async fn update_health_data(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateHealthDataRequest>,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, &resources)?;
        Self::require_personal(&claims)?;

        let user_id = claims
            .sub
            .as_deref()
            .ok_or_else(|| AppError::not_found("User"))?;

        let health_data = request
            .health_data
            .ok_or_else(|| AppError::missing_field("Health data"))?;

        resources
            .database
            .upsert_health_data(user_id, &health_data)
            .await?;

        let response = MessageResponse {
            message: "Health data updated successfully".to_owned(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Clear the conversation history of a personal session
    ///
    /// The health profile is left untouched; history reduces to an empty
    /// ordered sequence.
    async fn clear_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = Self::authenticate(&headers, &resources)?;
        Self::require_personal(&claims)?;

        if let Some(user_id) = claims.sub.as_deref() {
            let chat = ChatManager::new(resources.database.pool().clone());
            let cleared = chat.clear_history(user_id).await?;
            info!("Cleared {cleared} chat messages for {user_id}");
        }

        let response = MessageResponse {
            message: "Chat history cleared successfully".to_owned(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
