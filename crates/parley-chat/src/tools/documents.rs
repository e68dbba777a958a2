//! Document tools: create and update model-generated artifacts.
//!
//! Content comes from the artifact model; every write lands in the
//! documents table as a new version row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use parley_core::types::{Document, DocumentKind};
use parley_provider::{ChatClient, WireMessage};
use parley_storage::DocumentRepository;

use crate::error::ChatError;
use crate::tools::Tool;

const TEXT_DOCUMENT_PROMPT: &str =
    "Write about the given topic. Markdown is supported. Use headings wherever appropriate.";

const CODE_DOCUMENT_PROMPT: &str =
    "Write a self-contained code snippet for the given topic. Include brief comments where helpful.";

fn update_prompt(current: &str) -> String {
    format!(
        "Improve the following contents of the document based on the given prompt.\n\n{}",
        current
    )
}

fn generation_prompt(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Text => TEXT_DOCUMENT_PROMPT,
        DocumentKind::Code => CODE_DOCUMENT_PROMPT,
    }
}

/// `createDocument` - generate a fresh artifact from a title.
pub struct CreateDocumentTool {
    client: ChatClient,
    documents: Arc<DocumentRepository>,
    artifact_model: String,
}

impl CreateDocumentTool {
    pub fn new(
        client: ChatClient,
        documents: Arc<DocumentRepository>,
        artifact_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            documents,
            artifact_model: artifact_model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateDocumentArgs {
    title: String,
    kind: DocumentKind,
}

#[async_trait]
impl Tool for CreateDocumentTool {
    fn name(&self) -> &'static str {
        "createDocument"
    }

    fn description(&self) -> &'static str {
        "Create a document for a writing or content creation activity"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "kind": { "type": "string", "enum": ["text", "code"] }
            },
            "required": ["title", "kind"]
        })
    }

    async fn execute(
        &self,
        user_id: Uuid,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError> {
        let args: CreateDocumentArgs = serde_json::from_value(args)
            .map_err(|e| ChatError::ToolError(format!("Invalid createDocument arguments: {}", e)))?;

        let content = self
            .client
            .complete(
                &self.artifact_model,
                vec![
                    WireMessage::system(generation_prompt(args.kind)),
                    WireMessage::user(args.title.clone()),
                ],
            )
            .await
            .map_err(|e| ChatError::ToolError(format!("Artifact generation failed: {}", e)))?;

        let document = Document {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id,
            title: args.title,
            kind: args.kind,
            content,
        };
        self.documents.save(&document)?;

        info!(document_id = %document.id, kind = document.kind.as_str(), "Document created");

        Ok(serde_json::json!({
            "id": document.id,
            "title": document.title,
            "kind": document.kind.as_str(),
            "content": "A document was created and is now visible to the user.",
        }))
    }
}

/// `updateDocument` - rewrite the latest version per a description.
pub struct UpdateDocumentTool {
    client: ChatClient,
    documents: Arc<DocumentRepository>,
    artifact_model: String,
}

impl UpdateDocumentTool {
    pub fn new(
        client: ChatClient,
        documents: Arc<DocumentRepository>,
        artifact_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            documents,
            artifact_model: artifact_model.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateDocumentArgs {
    id: Uuid,
    description: String,
}

#[async_trait]
impl Tool for UpdateDocumentTool {
    fn name(&self) -> &'static str {
        "updateDocument"
    }

    fn description(&self) -> &'static str {
        "Update a document with the given description"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "The ID of the document to update" },
                "description": {
                    "type": "string",
                    "description": "The description of changes that need to be made"
                }
            },
            "required": ["id", "description"]
        })
    }

    async fn execute(
        &self,
        user_id: Uuid,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError> {
        let args: UpdateDocumentArgs = serde_json::from_value(args)
            .map_err(|e| ChatError::ToolError(format!("Invalid updateDocument arguments: {}", e)))?;

        let current = self
            .documents
            .find_latest(args.id)?
            .ok_or_else(|| ChatError::ToolError(format!("Document not found: {}", args.id)))?;

        if current.user_id != user_id {
            return Err(ChatError::ToolError(format!(
                "Document not found: {}",
                args.id
            )));
        }

        let content = self
            .client
            .complete(
                &self.artifact_model,
                vec![
                    WireMessage::system(update_prompt(&current.content)),
                    WireMessage::user(args.description),
                ],
            )
            .await
            .map_err(|e| ChatError::ToolError(format!("Artifact update failed: {}", e)))?;

        let updated = Document {
            created_at: Utc::now(),
            content,
            ..current
        };
        self.documents.save(&updated)?;

        info!(document_id = %updated.id, "Document updated");

        Ok(serde_json::json!({
            "id": updated.id,
            "title": updated.title,
            "kind": updated.kind.as_str(),
            "content": "The document has been updated successfully.",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_by_kind() {
        assert!(generation_prompt(DocumentKind::Text).contains("Markdown"));
        assert!(generation_prompt(DocumentKind::Code).contains("code snippet"));
    }

    #[test]
    fn test_update_prompt_embeds_current_content() {
        let prompt = update_prompt("draft body");
        assert!(prompt.contains("draft body"));
    }

    #[test]
    fn test_create_args_reject_unknown_kind() {
        let args = serde_json::json!({"title": "Essay", "kind": "spreadsheet"});
        assert!(serde_json::from_value::<CreateDocumentArgs>(args).is_err());
    }

    #[test]
    fn test_update_args_require_uuid() {
        let args = serde_json::json!({"id": "not-a-uuid", "description": "tighten"});
        assert!(serde_json::from_value::<UpdateDocumentArgs>(args).is_err());
    }
}
