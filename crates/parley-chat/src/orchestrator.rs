//! Chat turn orchestrator.
//!
//! Drives one POST /api/chat turn end to end: ownership checks, title
//! generation for new chats, message persistence, the streaming
//! tool-call loop against the provider, and delivery of incremental
//! events to the transport.
//!
//! A turn has two phases. [`ChatOrchestrator::prepare_turn`] runs every
//! step that can still map to an HTTP status (ownership, validation,
//! user-message persistence). [`ChatOrchestrator::stream_turn`] then
//! drives the provider; from that point failures surface as a single
//! error event on the stream.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use parley_core::config::ChatConfig;
use parley_core::types::{Attachment, Chat, Message, Role, WritingStyle};
use parley_provider::{
    invocations_to_wire, ChatClient, StreamEvent, ToolDefinition, ToolInvocation, WireMessage,
};
use parley_storage::{ChatRepository, MessageRepository};

use crate::error::ChatError;
use crate::prompts::{self, TITLE_SYSTEM_PROMPT};
use crate::reasoning::{split_thinking, SplitContent};
use crate::styles::StyleRegistry;
use crate::tools::ToolRegistry;

/// Generic message surfaced to the client when generation fails
/// mid-stream. Never includes provider detail.
pub const STREAM_ERROR_MESSAGE: &str = "Oops, an error occurred! If you uploaded images, \
     please try again without attachments as they might not be supported with the current \
     AI provider.";

/// One message as submitted by the browser.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// An authenticated chat request, ready to run.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub chat_id: Uuid,
    pub user_id: Uuid,
    pub messages: Vec<IncomingMessage>,
    pub model_id: String,
    pub style: WritingStyle,
}

/// Output of the pre-flight phase, consumed by the streaming phase.
pub struct PreparedTurn {
    wire_messages: Vec<WireMessage>,
    tool_definitions: Option<Vec<ToolDefinition>>,
}

/// Incremental output of a running turn.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    TextDelta(String),
    ReasoningDelta(String),
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    ToolResult {
        id: String,
        name: String,
        result: serde_json::Value,
    },
    Finish {
        finish_reason: Option<String>,
    },
    Error(String),
}

/// Coordinates provider, tools, styles, and storage for chat turns.
pub struct ChatOrchestrator {
    client: ChatClient,
    chats: Arc<ChatRepository>,
    messages: Arc<MessageRepository>,
    tools: ToolRegistry,
    styles: StyleRegistry,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(
        client: ChatClient,
        chats: Arc<ChatRepository>,
        messages: Arc<MessageRepository>,
        tools: ToolRegistry,
        styles: StyleRegistry,
        config: ChatConfig,
    ) -> Self {
        Self {
            client,
            chats,
            messages,
            tools,
            styles,
            config,
        }
    }

    /// Pre-flight for a chat turn.
    ///
    /// Validates the request, creates the chat on first contact (with a
    /// model-generated title), checks ownership, and persists the user
    /// message. Errors here map to HTTP statuses; nothing has been
    /// streamed yet.
    pub async fn prepare_turn(&self, turn: &ChatTurn) -> Result<PreparedTurn, ChatError> {
        let user_message = turn
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .cloned()
            .ok_or(ChatError::NoUserMessage)?;

        if user_message.content.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        // Model must resolve before anything is written.
        let spec = parley_provider::resolve_model(&turn.model_id)?;

        match self.chats.find_by_id(turn.chat_id)? {
            Some(chat) if chat.user_id != turn.user_id => return Err(ChatError::NotOwner),
            Some(_) => {}
            None => {
                let title = self.generate_title(&user_message.content).await;
                self.chats.save(&Chat {
                    id: turn.chat_id,
                    user_id: turn.user_id,
                    title,
                    created_at: Utc::now(),
                })?;
            }
        }

        self.messages.save(&Message {
            id: Uuid::new_v4(),
            chat_id: turn.chat_id,
            role: Role::User,
            content: user_message.content.clone(),
            reasoning: None,
            attachments: user_message.attachments.clone(),
            created_at: Utc::now(),
        })?;

        let style = self.styles.spec(turn.style);
        let active_tools: &[&str] = if spec.supports_tools {
            style.tool_names
        } else {
            &[]
        };
        let definitions = self.tools.definitions(active_tools);

        let mut wire_messages = vec![WireMessage::system(prompts::system_prompt(style.prompt))];
        for message in &turn.messages {
            // Stored tool results lose their call ids on the way through
            // the client, and providers reject tool-role messages without
            // one. The surviving user/assistant text carries the context.
            if message.role == Role::Tool {
                continue;
            }
            wire_messages.push(WireMessage {
                role: message.role.as_str().to_string(),
                content: Some(message.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        info!(
            chat_id = %turn.chat_id,
            model = %turn.model_id,
            style = ?turn.style,
            active_tools = active_tools.len(),
            "Chat turn prepared"
        );

        Ok(PreparedTurn {
            wire_messages,
            tool_definitions: if definitions.is_empty() {
                None
            } else {
                Some(definitions)
            },
        })
    }

    /// Stream the completion, sending incremental events through `tx`.
    ///
    /// Provider failures surface as a single [`ChatEvent::Error`]; a
    /// closed receiver aborts the turn. Assistant and tool messages are
    /// persisted at the end, failures there logged only.
    pub async fn stream_turn(
        &self,
        turn: ChatTurn,
        prepared: PreparedTurn,
        tx: mpsc::Sender<ChatEvent>,
    ) {
        let PreparedTurn {
            mut wire_messages,
            tool_definitions,
        } = prepared;

        let mut tracker = DeltaTracker::new();
        let mut tool_messages: Vec<Message> = Vec::new();
        let mut finish_reason: Option<String> = None;

        'rounds: for round in 0..self.config.max_tool_rounds {
            let mut stream = match self
                .client
                .stream(&turn.model_id, wire_messages.clone(), tool_definitions.clone())
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(chat_id = %turn.chat_id, error = %e, "Provider request failed");
                    let _ = tx.send(ChatEvent::Error(STREAM_ERROR_MESSAGE.to_string())).await;
                    return;
                }
            };

            let mut round_calls: Vec<ToolInvocation> = Vec::new();
            loop {
                let event = match stream.next_event().await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(chat_id = %turn.chat_id, error = %e, "Stream decode failed");
                        let _ = tx.send(ChatEvent::Error(STREAM_ERROR_MESSAGE.to_string())).await;
                        return;
                    }
                };

                match event {
                    StreamEvent::Content(delta) => {
                        for chat_event in tracker.push(&delta) {
                            if tx.send(chat_event).await.is_err() {
                                debug!(chat_id = %turn.chat_id, "Client disconnected, aborting turn");
                                return;
                            }
                        }
                    }
                    StreamEvent::ToolCalls(calls) => round_calls = calls,
                    StreamEvent::Finished { finish_reason: reason } => {
                        finish_reason = reason;
                    }
                }
            }

            if round_calls.is_empty() {
                break 'rounds;
            }
            if round + 1 == self.config.max_tool_rounds {
                debug!(chat_id = %turn.chat_id, "Tool round budget exhausted");
                break 'rounds;
            }

            wire_messages.push(WireMessage::assistant_tool_calls(invocations_to_wire(
                &round_calls,
            )));

            for call in round_calls {
                let arguments: serde_json::Value =
                    serde_json::from_str(&call.arguments).unwrap_or(serde_json::Value::Null);

                let sent = tx
                    .send(ChatEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        arguments: arguments.clone(),
                    })
                    .await;
                if sent.is_err() {
                    return;
                }

                let result = match self.tools.get(&call.name) {
                    Some(tool) => match tool.execute(turn.user_id, arguments).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(tool = %call.name, error = %e, "Tool execution failed");
                            serde_json::json!({ "error": format!("Tool failed: {}", call.name) })
                        }
                    },
                    None => serde_json::json!({ "error": format!("Unknown tool: {}", call.name) }),
                };

                wire_messages.push(WireMessage::tool_result(call.id.clone(), result.to_string()));
                tool_messages.push(Message {
                    id: Uuid::new_v4(),
                    chat_id: turn.chat_id,
                    role: Role::Tool,
                    content: serde_json::json!({
                        "toolCallId": call.id,
                        "toolName": call.name,
                        "result": result,
                    })
                    .to_string(),
                    reasoning: None,
                    attachments: vec![],
                    created_at: Utc::now(),
                });

                let sent = tx
                    .send(ChatEvent::ToolResult {
                        id: call.id,
                        name: call.name,
                        result,
                    })
                    .await;
                if sent.is_err() {
                    return;
                }
            }
        }

        self.persist_turn_output(&turn, tracker.finish(), tool_messages);

        let _ = tx
            .send(ChatEvent::Finish {
                finish_reason: finish_reason.clone(),
            })
            .await;

        info!(chat_id = %turn.chat_id, finish_reason = ?finish_reason, "Chat turn finished");
    }

    /// Persist assistant output and tool results. The streamed reply has
    /// already reached the client, so failures here are logged only.
    fn persist_turn_output(
        &self,
        turn: &ChatTurn,
        split: SplitContent,
        tool_messages: Vec<Message>,
    ) {
        let mut to_save = tool_messages;

        // Drop assistant fragments with no visible text: tool-only turns
        // are represented by their tool messages.
        if !split.main.is_empty() {
            to_save.push(Message {
                id: Uuid::new_v4(),
                chat_id: turn.chat_id,
                role: Role::Assistant,
                content: split.main,
                reasoning: split.thinking.filter(|t| !t.is_empty()),
                attachments: vec![],
                created_at: Utc::now(),
            });
        }

        if to_save.is_empty() {
            debug!(chat_id = %turn.chat_id, "No messages to save after sanitization");
            return;
        }
        if let Err(e) = self.messages.save_all(&to_save) {
            warn!(chat_id = %turn.chat_id, error = %e, "Failed to save turn output");
        }
    }

    /// Generate a chat title from the first user message, falling back
    /// to the truncated message text.
    async fn generate_title(&self, message: &str) -> String {
        let result = self
            .client
            .complete(
                &self.config.title_model,
                vec![
                    WireMessage::system(TITLE_SYSTEM_PROMPT),
                    WireMessage::user(message),
                ],
            )
            .await;

        match result {
            Ok(title) if !title.is_empty() => title,
            Ok(_) => prompts::fallback_title(message),
            Err(e) => {
                warn!(error = %e, "Title generation failed, using fallback");
                prompts::fallback_title(message)
            }
        }
    }
}

// =============================================================================
// Delta tracking
// =============================================================================

/// Turns raw content deltas into text/reasoning deltas.
///
/// Re-splits the accumulated reply on every chunk so a `<think>` block
/// streams as reasoning the moment the tag is recognized. Output that
/// might still turn out to be part of a tag is held back until decided.
struct DeltaTracker {
    acc: String,
    sent_main: usize,
    sent_thinking: usize,
}

impl DeltaTracker {
    fn new() -> Self {
        Self {
            acc: String::new(),
            sent_main: 0,
            sent_thinking: 0,
        }
    }

    fn push(&mut self, chunk: &str) -> Vec<ChatEvent> {
        self.acc.push_str(chunk);

        // Could still become an opening tag; wait for more input.
        let trimmed = self.acc.trim_start();
        if !trimmed.is_empty() && trimmed.len() < "<think>".len() && "<think>".starts_with(trimmed)
        {
            return Vec::new();
        }

        let split = split_thinking(&self.acc);
        let mut events = Vec::new();

        if let Some(thinking) = &split.thinking {
            let safe = if split.thinking_complete {
                thinking.len()
            } else {
                thinking.len() - close_tag_holdback(thinking)
            };
            if safe > self.sent_thinking {
                events.push(ChatEvent::ReasoningDelta(
                    thinking[self.sent_thinking..safe].to_string(),
                ));
                self.sent_thinking = safe;
            }
        }

        if split.main.len() > self.sent_main {
            events.push(ChatEvent::TextDelta(
                split.main[self.sent_main..].to_string(),
            ));
            self.sent_main = split.main.len();
        }

        events
    }

    fn finish(&self) -> SplitContent {
        split_thinking(&self.acc)
    }
}

/// Length of the longest suffix of `s` that is a proper prefix of
/// `</think>`. Those bytes may belong to a closing tag still arriving.
fn close_tag_holdback(s: &str) -> usize {
    const TAG: &str = "</think>";
    for len in (1..TAG.len()).rev() {
        if s.ends_with(&TAG[..len]) {
            return len;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    use parley_core::config::ProvidersConfig;
    use parley_storage::{Database, DocumentRepository, SuggestionRepository, UserRepository};

    use crate::tools::documents::{CreateDocumentTool, UpdateDocumentTool};
    use crate::tools::suggestions::RequestSuggestionsTool;
    use crate::tools::weather::WeatherTool;

    fn make_orchestrator(db: &Arc<Database>) -> ChatOrchestrator {
        let chats = Arc::new(ChatRepository::new(Arc::clone(db)));
        let messages = Arc::new(MessageRepository::new(Arc::clone(db)));
        let documents = Arc::new(DocumentRepository::new(Arc::clone(db)));
        let suggestions = Arc::new(SuggestionRepository::new(Arc::clone(db)));

        let client = ChatClient::new(ProvidersConfig::default());
        let config = ChatConfig::default();

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(WeatherTool::new()));
        tools.register(Arc::new(CreateDocumentTool::new(
            client.clone(),
            Arc::clone(&documents),
            config.artifact_model.clone(),
        )));
        tools.register(Arc::new(UpdateDocumentTool::new(
            client.clone(),
            Arc::clone(&documents),
            config.artifact_model.clone(),
        )));
        tools.register(Arc::new(RequestSuggestionsTool::new(
            client.clone(),
            Arc::clone(&documents),
            suggestions,
            config.artifact_model.clone(),
        )));

        let styles = StyleRegistry::new(&tools.names()).unwrap();
        ChatOrchestrator::new(client, chats, messages, tools, styles, config)
    }

    /// Seed a user and a chat they own, so prepare_turn skips title
    /// generation (which needs the network).
    fn seed_owned_chat(orchestrator: &ChatOrchestrator, db: &Arc<Database>) -> (Uuid, Uuid) {
        let users = UserRepository::new(Arc::clone(db));
        let user_id = users.create("turns@example.com").unwrap();
        let chat_id = Uuid::new_v4();
        orchestrator
            .chats
            .save(&Chat {
                id: chat_id,
                user_id,
                title: "seeded".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        (user_id, chat_id)
    }

    fn user_turn(chat_id: Uuid, user_id: Uuid, model_id: &str) -> ChatTurn {
        ChatTurn {
            chat_id,
            user_id,
            messages: vec![IncomingMessage {
                role: Role::User,
                content: "hello".to_string(),
                attachments: vec![],
            }],
            model_id: model_id.to_string(),
            style: WritingStyle::Normal,
        }
    }

    #[tokio::test]
    async fn test_tools_disabled_for_non_tool_models() {
        let db = Arc::new(Database::in_memory().unwrap());
        let orchestrator = make_orchestrator(&db);
        let (user_id, chat_id) = seed_owned_chat(&orchestrator, &db);

        let prepared = orchestrator
            .prepare_turn(&user_turn(chat_id, user_id, "deepseek-r1"))
            .await
            .unwrap();
        assert!(prepared.tool_definitions.is_none());

        let prepared = orchestrator
            .prepare_turn(&user_turn(chat_id, user_id, "claude-3-5"))
            .await
            .unwrap();
        assert!(prepared.tool_definitions.is_none());

        let prepared = orchestrator
            .prepare_turn(&user_turn(chat_id, user_id, "gemini-2-0-flash"))
            .await
            .unwrap();
        assert!(prepared.tool_definitions.is_some());
    }

    #[tokio::test]
    async fn test_tool_history_not_replayed_to_provider() {
        let db = Arc::new(Database::in_memory().unwrap());
        let orchestrator = make_orchestrator(&db);
        let (user_id, chat_id) = seed_owned_chat(&orchestrator, &db);

        let mut turn = user_turn(chat_id, user_id, "gemini-2-0-flash");
        turn.messages = vec![
            IncomingMessage {
                role: Role::User,
                content: "weather in Turku?".to_string(),
                attachments: vec![],
            },
            IncomingMessage {
                role: Role::Tool,
                content: "{\"toolCallId\":\"call_1\"}".to_string(),
                attachments: vec![],
            },
            IncomingMessage {
                role: Role::Assistant,
                content: "Sunny.".to_string(),
                attachments: vec![],
            },
            IncomingMessage {
                role: Role::User,
                content: "and tomorrow?".to_string(),
                attachments: vec![],
            },
        ];

        let prepared = orchestrator.prepare_turn(&turn).await.unwrap();
        assert!(prepared.wire_messages.iter().all(|m| m.role != "tool"));
        // System prompt plus the three surviving history messages.
        assert_eq!(prepared.wire_messages.len(), 4);
    }

    fn text_of(events: &[ChatEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::TextDelta(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    fn reasoning_of(events: &[ChatEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::ReasoningDelta(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tracker_plain_text_passthrough() {
        let mut tracker = DeltaTracker::new();
        let mut events = Vec::new();
        events.extend(tracker.push("Hello, "));
        events.extend(tracker.push("world"));
        assert_eq!(text_of(&events), "Hello, world");
        assert_eq!(reasoning_of(&events), "");
    }

    #[test]
    fn test_tracker_reasoning_then_answer() {
        let mut tracker = DeltaTracker::new();
        let mut events = Vec::new();
        events.extend(tracker.push("<think>let me "));
        events.extend(tracker.push("work this out</think>"));
        events.extend(tracker.push("The answer is 4."));

        assert_eq!(reasoning_of(&events), "let me work this out");
        assert_eq!(text_of(&events), "The answer is 4.");

        let split = tracker.finish();
        assert_eq!(split.main, "The answer is 4.");
        assert_eq!(split.thinking.as_deref(), Some("let me work this out"));
        assert!(split.thinking_complete);
    }

    #[test]
    fn test_tracker_holds_back_partial_open_tag() {
        let mut tracker = DeltaTracker::new();
        assert!(tracker.push("<th").is_empty());
        let events = tracker.push("ink>reasoning");
        assert_eq!(reasoning_of(&events), "reasoning");
        assert_eq!(text_of(&events), "");
    }

    #[test]
    fn test_tracker_holds_back_partial_close_tag() {
        let mut tracker = DeltaTracker::new();
        let mut events = Vec::new();
        events.extend(tracker.push("<think>abc"));
        events.extend(tracker.push("</th"));
        // "</th" must not leak into the reasoning stream.
        assert_eq!(reasoning_of(&events), "abc");

        events.extend(tracker.push("ink>done"));
        assert_eq!(reasoning_of(&events), "abc");
        assert_eq!(text_of(&events), "done");
    }

    #[test]
    fn test_tracker_open_tag_never_closed() {
        let mut tracker = DeltaTracker::new();
        let events = tracker.push("<think>still going");
        assert_eq!(reasoning_of(&events), "still going");

        let split = tracker.finish();
        assert_eq!(split.main, "");
        assert!(!split.thinking_complete);
    }

    #[test]
    fn test_tracker_angle_bracket_in_plain_text() {
        let mut tracker = DeltaTracker::new();
        let mut events = Vec::new();
        events.extend(tracker.push("use Vec"));
        events.extend(tracker.push("<u8> here"));
        assert_eq!(text_of(&events), "use Vec<u8> here");
    }

    #[test]
    fn test_close_tag_holdback() {
        assert_eq!(close_tag_holdback("abc"), 0);
        assert_eq!(close_tag_holdback("abc<"), 1);
        assert_eq!(close_tag_holdback("abc</think"), 7);
        assert_eq!(close_tag_holdback("a<b"), 0);
    }

    #[test]
    fn test_stream_error_message_is_generic() {
        assert!(STREAM_ERROR_MESSAGE.contains("Oops"));
        assert!(!STREAM_ERROR_MESSAGE.contains("500"));
    }
}
