use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::db::models::{Chat, ChatMessage, ProfileUpdate, UserProfile};
use crate::db::UserRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: Option<String>,
    pub first_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateChatResponse {
    pub chat_id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatsResponse {
    pub chats: Vec<Chat>,
    pub active_chat: Option<Chat>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
    pub active_chat: Option<Chat>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Option<UserProfile>,
}

/// GET /api/chat/chats (requires session)
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ChatsResponse>, AppError> {
    let chats = state.advisor.list_chats(&user.user_id).await?;
    let active_chat = state.advisor.get_active_chat(&user.user_id).await?;

    Ok(Json(ChatsResponse { chats, active_chat }))
}

/// POST /api/chat/create (requires session)
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateChatRequest>,
) -> Result<Json<CreateChatResponse>, AppError> {
    let chat = state
        .advisor
        .create_chat(&user.user_id, req.title.as_deref(), req.first_message.as_deref())
        .await?;

    Ok(Json(CreateChatResponse {
        chat_id: chat.id,
        title: chat.title,
    }))
}

/// POST /api/chat/:chat_id/activate (requires session)
pub async fn set_active_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.advisor.set_active_chat(&user.user_id, &chat_id).await? {
        return Err(AppError::NotFound("Chat not found".to_string()));
    }

    Ok(Json(serde_json::json!({"status": "success"})))
}

/// PUT /api/chat/:chat_id/rename (requires session)
pub async fn rename_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(chat_id): Path<String>,
    Json(req): Json<RenameChatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state
        .advisor
        .rename_chat(&user.user_id, &chat_id, &req.title)
        .await?
    {
        return Err(AppError::NotFound("Chat not found".to_string()));
    }

    Ok(Json(serde_json::json!({"status": "success"})))
}

/// DELETE /api/chat/:chat_id (requires session)
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.advisor.delete_chat(&user.user_id, &chat_id).await? {
        return Err(AppError::NotFound("Chat not found".to_string()));
    }

    Ok(Json(serde_json::json!({"status": "success"})))
}

/// GET /api/chat/messages (requires session)
///
/// Messages of the active chat; an empty list when no chat is active.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MessagesResponse>, AppError> {
    let response = match state.advisor.active_chat_messages(&user.user_id).await? {
        Some((chat, messages)) => MessagesResponse {
            messages,
            active_chat: Some(chat),
        },
        None => MessagesResponse {
            messages: Vec::new(),
            active_chat: None,
        },
    };

    Ok(Json(response))
}

/// POST /api/chat/send (requires session)
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let response = state.advisor.send_message(&user.user_id, &req.message).await?;

    Ok(Json(SendMessageResponse { response }))
}

/// GET /api/profile (requires session)
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = UserRepository::get_profile(&state.db, &user.user_id).await?;

    Ok(Json(ProfileResponse { profile }))
}

/// PUT /api/profile (requires session)
///
/// Wholesale overwrite of the five recognized fields; unknown fields are
/// rejected by deserialization.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(fields): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = UserRepository::upsert_profile(&state.db, &user.user_id, &fields).await?;

    Ok(Json(ProfileResponse {
        profile: Some(profile),
    }))
}
