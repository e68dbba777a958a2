//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parley_chat::orchestrator::ChatOrchestrator;
use parley_chat::styles::StyleRegistry;
use parley_chat::tools::documents::{CreateDocumentTool, UpdateDocumentTool};
use parley_chat::tools::suggestions::RequestSuggestionsTool;
use parley_chat::tools::weather::WeatherTool;
use parley_chat::tools::ToolRegistry;
use parley_core::config::ParleyConfig;
use parley_core::error::ParleyError;
use parley_provider::{ChatClient, SpeechService};
use parley_storage::{
    ChatRepository, Database, DocumentRepository, MessageRepository, SessionRepository,
    SuggestionRepository, VoteRepository,
};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ParleyConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Session tokens, resolved by the auth middleware.
    pub sessions: Arc<SessionRepository>,
    pub chats: Arc<ChatRepository>,
    pub messages: Arc<MessageRepository>,
    pub votes: Arc<VoteRepository>,
    pub documents: Arc<DocumentRepository>,
    pub suggestions: Arc<SuggestionRepository>,
    /// Chat turn coordinator (provider + tools + persistence).
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Voice transcription service.
    pub speech: Arc<dyn SpeechService>,
    /// Directory uploaded attachments are written to.
    pub upload_dir: PathBuf,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire up repositories, tools, and the orchestrator.
    pub fn new(
        config: ParleyConfig,
        database: Arc<Database>,
        speech: Arc<dyn SpeechService>,
        upload_dir: PathBuf,
    ) -> Result<Self, ParleyError> {
        let chats = Arc::new(ChatRepository::new(Arc::clone(&database)));
        let messages = Arc::new(MessageRepository::new(Arc::clone(&database)));
        let votes = Arc::new(VoteRepository::new(Arc::clone(&database)));
        let documents = Arc::new(DocumentRepository::new(Arc::clone(&database)));
        let suggestions = Arc::new(SuggestionRepository::new(Arc::clone(&database)));
        let sessions = Arc::new(SessionRepository::new(Arc::clone(&database)));

        let client = ChatClient::new(config.providers.clone());
        let artifact_model = config.chat.artifact_model.clone();

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(WeatherTool::new()));
        tools.register(Arc::new(CreateDocumentTool::new(
            client.clone(),
            Arc::clone(&documents),
            artifact_model.clone(),
        )));
        tools.register(Arc::new(UpdateDocumentTool::new(
            client.clone(),
            Arc::clone(&documents),
            artifact_model.clone(),
        )));
        tools.register(Arc::new(RequestSuggestionsTool::new(
            client.clone(),
            Arc::clone(&documents),
            Arc::clone(&suggestions),
            artifact_model,
        )));

        let tool_names = tools.names();
        let styles = StyleRegistry::new(&tool_names)?;

        let orchestrator = Arc::new(ChatOrchestrator::new(
            client,
            Arc::clone(&chats),
            Arc::clone(&messages),
            tools,
            styles,
            config.chat.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            database,
            sessions,
            chats,
            messages,
            votes,
            documents,
            suggestions,
            orchestrator,
            speech,
            upload_dir,
            start_time: Instant::now(),
        })
    }
}
