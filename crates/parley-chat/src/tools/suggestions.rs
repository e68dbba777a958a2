//! Suggestion tool: ask the artifact model for edit suggestions on a
//! stored document and persist them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use parley_core::types::Suggestion;
use parley_provider::{ChatClient, WireMessage};
use parley_storage::{DocumentRepository, SuggestionRepository};

use crate::error::ChatError;
use crate::tools::Tool;

const SUGGESTIONS_PROMPT: &str = "\
You are a help writing assistant. Given a piece of writing, please offer suggestions to improve \
the piece of writing and describe the change. It is very important for the edits to contain full \
sentences instead of just words. Respond with a JSON array where each element has the fields \
\"originalSentence\", \"suggestedSentence\", and \"description\". Output only the JSON array. \
Max 5 suggestions.";

/// `requestSuggestions` - generate edit suggestions for a document.
pub struct RequestSuggestionsTool {
    client: ChatClient,
    documents: Arc<DocumentRepository>,
    suggestions: Arc<SuggestionRepository>,
    artifact_model: String,
}

impl RequestSuggestionsTool {
    pub fn new(
        client: ChatClient,
        documents: Arc<DocumentRepository>,
        suggestions: Arc<SuggestionRepository>,
        artifact_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            documents,
            suggestions,
            artifact_model: artifact_model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RequestSuggestionsArgs {
    #[serde(rename = "documentId")]
    document_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ModelSuggestion {
    #[serde(rename = "originalSentence")]
    original_sentence: String,
    #[serde(rename = "suggestedSentence")]
    suggested_sentence: String,
    #[serde(default)]
    description: String,
}

/// Pull a JSON array out of a model reply that may wrap it in a
/// Markdown code fence or surrounding prose.
fn parse_suggestions(reply: &str) -> Vec<ModelSuggestion> {
    let start = match reply.find('[') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let end = match reply.rfind(']') {
        Some(i) if i > start => i,
        _ => return Vec::new(),
    };
    serde_json::from_str(&reply[start..=end]).unwrap_or_default()
}

#[async_trait]
impl Tool for RequestSuggestionsTool {
    fn name(&self) -> &'static str {
        "requestSuggestions"
    }

    fn description(&self) -> &'static str {
        "Request suggestions for a document"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "documentId": {
                    "type": "string",
                    "description": "The ID of the document to request edits"
                }
            },
            "required": ["documentId"]
        })
    }

    async fn execute(
        &self,
        user_id: Uuid,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError> {
        let args: RequestSuggestionsArgs = serde_json::from_value(args).map_err(|e| {
            ChatError::ToolError(format!("Invalid requestSuggestions arguments: {}", e))
        })?;

        let document = self
            .documents
            .find_latest(args.document_id)?
            .filter(|doc| doc.user_id == user_id)
            .ok_or_else(|| {
                ChatError::ToolError(format!("Document not found: {}", args.document_id))
            })?;

        let reply = self
            .client
            .complete(
                &self.artifact_model,
                vec![
                    WireMessage::system(SUGGESTIONS_PROMPT),
                    WireMessage::user(document.content.clone()),
                ],
            )
            .await
            .map_err(|e| ChatError::ToolError(format!("Suggestion generation failed: {}", e)))?;

        let parsed = parse_suggestions(&reply);
        let suggestions: Vec<Suggestion> = parsed
            .into_iter()
            .take(5)
            .map(|s| Suggestion {
                id: Uuid::new_v4(),
                document_id: document.id,
                original_text: s.original_sentence,
                suggested_text: s.suggested_sentence,
                description: s.description,
                resolved: false,
            })
            .collect();
        self.suggestions.save_all(&suggestions)?;

        info!(
            document_id = %document.id,
            count = suggestions.len(),
            "Suggestions generated"
        );

        Ok(serde_json::json!({
            "id": document.id,
            "title": document.title,
            "kind": document.kind.as_str(),
            "message": "Suggestions have been added to the document",
        }))
    }
}
