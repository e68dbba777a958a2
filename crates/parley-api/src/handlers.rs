//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, checks
//! ownership against the repositories, and returns JSON responses. The
//! chat endpoint returns an SSE stream fed by the orchestrator.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use parley_chat::orchestrator::{ChatEvent, ChatTurn, IncomingMessage};
use parley_core::types::{Attachment, Chat, Message, Role, Vote, WritingStyle};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request/response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    pub role: String,
    pub content: String,
    #[serde(default, rename = "experimental_attachments")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub id: Uuid,
    pub messages: Vec<ClientMessage>,
    #[serde(default)]
    pub selected_chat_model: Option<String>,
    #[serde(default)]
    pub selected_writing_style: Option<String>,
    #[serde(default)]
    pub use_search_grounding: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatIdParams {
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteParams {
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentParams {
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionParams {
    pub document_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(rename = "experimental_attachments")]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub is_upvoted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub kind: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub original_text: String,
    pub suggested_text: String,
    pub description: String,
    pub is_resolved: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub pathname: String,
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

fn chat_summary(chat: Chat) -> ChatSummary {
    ChatSummary {
        id: chat.id,
        title: chat.title,
        created_at: chat.created_at,
    }
}

fn message_response(message: Message) -> MessageResponse {
    MessageResponse {
        id: message.id,
        role: message.role.as_str().to_string(),
        content: message.content,
        reasoning: message.reasoning,
        attachments: message.attachments,
        created_at: message.created_at,
    }
}

fn vote_response(vote: Vote) -> VoteResponse {
    VoteResponse {
        chat_id: vote.chat_id,
        message_id: vote.message_id,
        is_upvoted: vote.is_upvoted,
    }
}

/// Load a chat and check it belongs to the acting user.
fn owned_chat(state: &AppState, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ApiError> {
    let chat = state
        .chats
        .find_by_id(chat_id)?
        .ok_or_else(|| ApiError::NotFound("Chat not found".to_string()))?;
    if chat.user_id != user_id {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }
    Ok(chat)
}

// =============================================================================
// Chat
// =============================================================================

/// POST /api/chat - run a chat turn, streaming the reply as SSE.
pub async fn chat(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<ChatRequestBody>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send>, ApiError> {
    let style = WritingStyle::parse_or_normal(
        body.selected_writing_style.as_deref().unwrap_or("Normal"),
    );

    if body.use_search_grounding {
        tracing::debug!(chat_id = %body.id, "Search grounding requested");
    }

    let messages: Vec<IncomingMessage> = body
        .messages
        .into_iter()
        .filter_map(|m| {
            Role::parse(&m.role).map(|role| IncomingMessage {
                role,
                content: m.content,
                attachments: m.attachments,
            })
        })
        .collect();

    let model_id = body
        .selected_chat_model
        .unwrap_or_else(|| state.config.chat.default_model.clone());

    let turn = ChatTurn {
        chat_id: body.id,
        user_id,
        messages,
        model_id,
        style,
    };

    let prepared = state.orchestrator.prepare_turn(&turn).await?;

    let (tx, rx) = mpsc::channel::<ChatEvent>(64);
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        orchestrator.stream_turn(turn, prepared, tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok(sse_event(event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn sse_event(event: ChatEvent) -> Event {
    let (name, data) = match event {
        ChatEvent::TextDelta(text) => ("text-delta", serde_json::json!({ "textDelta": text })),
        ChatEvent::ReasoningDelta(text) => ("reasoning", serde_json::json!({ "reasoning": text })),
        ChatEvent::ToolCall {
            id,
            name,
            arguments,
        } => (
            "tool-call",
            serde_json::json!({ "toolCallId": id, "toolName": name, "args": arguments }),
        ),
        ChatEvent::ToolResult { id, name, result } => (
            "tool-result",
            serde_json::json!({ "toolCallId": id, "toolName": name, "result": result }),
        ),
        ChatEvent::Finish { finish_reason } => {
            ("finish", serde_json::json!({ "finishReason": finish_reason }))
        }
        ChatEvent::Error(message) => ("error", serde_json::json!({ "error": message })),
    };
    Event::default().event(name).data(data.to_string())
}

/// DELETE /api/chat?id= - delete an owned chat and everything under it.
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<ChatIdParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::NotFound("Not Found".to_string()))?;

    owned_chat(&state, id, user_id)?;
    state.chats.delete(id)?;

    tracing::info!(chat_id = %id, "Chat deleted");
    Ok(Json(serde_json::json!({ "message": "Chat deleted" })))
}

/// GET /api/history - the caller's chats, newest first.
pub async fn history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let chats = state.chats.list_by_user(user_id)?;
    Ok(Json(chats.into_iter().map(chat_summary).collect()))
}

/// GET /api/chat/{id}/messages - messages of an owned chat.
pub async fn chat_messages(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    owned_chat(&state, id, user_id)?;
    let messages = state.messages.list_by_chat(id)?;
    Ok(Json(messages.into_iter().map(message_response).collect()))
}

/// GET /api/models - the user-selectable model catalog.
pub async fn models() -> Json<Vec<parley_core::types::ChatModel>> {
    Json(parley_core::types::CHAT_MODELS.to_vec())
}

// =============================================================================
// Votes
// =============================================================================

/// GET /api/vote?chatId= - votes in an owned chat.
pub async fn list_votes(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<VoteParams>,
) -> Result<Json<Vec<VoteResponse>>, ApiError> {
    let chat_id = params
        .chat_id
        .ok_or_else(|| ApiError::BadRequest("chatId is required".to_string()))?;

    owned_chat(&state, chat_id, user_id)?;
    let votes = state.votes.list_by_chat(chat_id)?;
    Ok(Json(votes.into_iter().map(vote_response).collect()))
}

/// PATCH /api/vote - up/down vote a message in an owned chat.
pub async fn patch_vote(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<VoteBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let is_upvoted = match body.vote_type.as_str() {
        "up" => true,
        "down" => false,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid vote type: {}",
                other
            )))
        }
    };

    owned_chat(&state, body.chat_id, user_id)?;
    state.votes.upsert(&Vote {
        chat_id: body.chat_id,
        message_id: body.message_id,
        is_upvoted,
    })?;

    Ok(Json(serde_json::json!({ "message": "Message voted" })))
}

// =============================================================================
// Documents
// =============================================================================

/// GET /api/document?id= - latest version of an owned document.
pub async fn get_document(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<DocumentParams>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::BadRequest("id is required".to_string()))?;

    let document = state
        .documents
        .find_latest(id)?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    if document.user_id != user_id {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }

    Ok(Json(DocumentResponse {
        id: document.id,
        title: document.title,
        kind: document.kind.as_str().to_string(),
        content: document.content,
        created_at: document.created_at,
    }))
}

/// GET /api/suggestions?documentId= - suggestions for an owned document.
pub async fn list_suggestions(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<SuggestionResponse>>, ApiError> {
    let document_id = params
        .document_id
        .ok_or_else(|| ApiError::BadRequest("documentId is required".to_string()))?;

    let document = state
        .documents
        .find_latest(document_id)?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    if document.user_id != user_id {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }

    let suggestions = state.suggestions.list_by_document(document_id)?;
    Ok(Json(
        suggestions
            .into_iter()
            .map(|s| SuggestionResponse {
                id: s.id,
                document_id: s.document_id,
                original_text: s.original_text,
                suggested_text: s.suggested_text,
                description: s.description,
                is_resolved: s.resolved,
            })
            .collect(),
    ))
}

// =============================================================================
// Voice
// =============================================================================

/// POST /api/voice - transcribe a recorded clip.
pub async fn voice(
    State(state): State<AppState>,
    Extension(AuthUser(_user_id)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("audio") {
            let content_type = field
                .content_type()
                .unwrap_or("audio/wav")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read audio: {}", e)))?;
            audio = Some((data.to_vec(), content_type));
        }
    }

    let (data, content_type) =
        audio.ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    if data.len() > state.config.voice.max_audio_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "Audio exceeds maximum size of {} bytes",
            state.config.voice.max_audio_bytes
        )));
    }

    let result = state.speech.transcribe(&data, &content_type).await?;

    Ok(Json(serde_json::json!({
        "transcript": result.transcript,
        "response": {
            "text": result.response_text,
            "isFinished": true,
        }
    })))
}

// =============================================================================
// File upload
// =============================================================================

/// POST /api/files/upload - persist an attachment under the data dir.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(AuthUser(_user_id)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("upload")
                .to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            file = Some((data.to_vec(), filename, content_type));
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let uploads = &state.config.uploads;
    if !uploads
        .allowed_content_types
        .iter()
        .any(|t| t == &content_type)
    {
        return Err(ApiError::BadRequest(format!(
            "File type not allowed: {}",
            content_type
        )));
    }
    if data.len() > uploads.max_file_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds maximum size of {} bytes",
            uploads.max_file_bytes
        )));
    }

    // Uploads get a fresh name; only the extension survives.
    let extension = std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = state.upload_dir.join(&stored_name);

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {}", e)))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to write upload: {}", e)))?;

    tracing::info!(pathname = %stored_name, bytes = data.len(), "File uploaded");

    Ok(Json(UploadResponse {
        url: format!("/uploads/{}", stored_name),
        pathname: stored_name,
        content_type,
    }))
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - public liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Tests
// =============================================================================
