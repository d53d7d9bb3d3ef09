//! Chat API endpoints
//!
//! Handles HTTP requests for listing, reading, writing and deleting chats.

use crate::chat::{list_chats as list_all_chats, Chat, ChatListing, ChatMessage};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request to create or replace a chat
#[derive(Debug, Default, Deserialize)]
pub struct SaveChatRequest {
    /// New title; keeps the stored title when omitted
    pub title: Option<String>,
    /// New message list; keeps the stored messages when omitted
    pub messages: Option<Vec<ChatMessage>>,
}

/// Response to a deletion
#[derive(Debug, Serialize)]
pub struct DeleteChatResponse {
    /// Human-readable message
    pub message: String,
    /// ID of the deleted chat
    pub id: String,
}

/// GET /api/chats - List every chat id with its title
pub async fn list_chats(State(state): State<AppState>) -> Result<Json<ChatListing>, AppError> {
    let listing = list_all_chats(&state.chats, state.list_concurrency).await?;
    Ok(Json(listing))
}

/// GET /api/chats/:id - Get a chat with its messages
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Chat>, AppError> {
    let chat = state
        .chats
        .get_chat(&id)
        .await?
        .ok_or_else(|| AppError::ChatNotFound(id.clone()))?;

    Ok(Json(chat))
}

/// PUT /api/chats/:id - Create or update a chat
///
/// Fields of the stored record that are not part of the request are kept.
pub async fn save_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveChatRequest>,
) -> Result<Json<Chat>, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::InvalidChat("Chat id cannot be empty".to_string()));
    }
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::InvalidChat("Title cannot be empty".to_string()));
        }
    }

    let SaveChatRequest { title, messages } = request;
    let chat = state
        .chats
        .update_chat(&id, move |chat| {
            if let Some(title) = title {
                chat.title = Some(title);
            }
            if let Some(messages) = messages {
                chat.messages = messages;
            }
        })
        .await?;

    info!(chat_id = %id, "Saved chat");
    Ok(Json(chat))
}

/// DELETE /api/chats/:id - Delete a chat
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteChatResponse>, AppError> {
    if !state.chats.delete_chat(&id).await? {
        return Err(AppError::ChatNotFound(id));
    }

    Ok(Json(DeleteChatResponse {
        message: "Chat deleted successfully".to_string(),
        id,
    }))
}
