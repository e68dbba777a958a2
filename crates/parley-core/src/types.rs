use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Parse a role string as stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }
}

/// A conversation owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Derived from the first user message by a model call.
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded file referenced (not embedded) by a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// A single turn in a conversation.
///
/// `content` is plain text for user/assistant turns, or a JSON tool payload
/// for tool turns. Messages are never mutated after creation and are deleted
/// transitively with their chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: Role,
    pub content: String,
    /// Model-emitted intermediate reasoning, when the provider surfaces it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// An up/down judgment on an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub is_upvoted: bool,
}

/// A document produced by the createDocument/updateDocument tools.
///
/// Versioned by (id, created_at): each update inserts a new row with the
/// same id and a fresh timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub title: String,
    pub kind: DocumentKind,
    pub content: String,
}

/// What a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Code,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Code => "code",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(DocumentKind::Text),
            "code" => Some(DocumentKind::Code),
            _ => None,
        }
    }
}

/// A proposed edit to a document, produced by the requestSuggestions tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub original_text: String,
    pub suggested_text: String,
    pub description: String,
    pub resolved: bool,
}

/// A user-selected system-prompt modifier.
///
/// Alters response tone/verbosity and which tools are enabled for the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WritingStyle {
    Normal,
    Concise,
    Explanatory,
    Formal,
}

impl WritingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingStyle::Normal => "Normal",
            WritingStyle::Concise => "Concise",
            WritingStyle::Explanatory => "Explanatory",
            WritingStyle::Formal => "Formal",
        }
    }

    /// Parse a style name from a request, falling back to Normal for
    /// anything unrecognized.
    pub fn parse_or_normal(s: &str) -> Self {
        match s {
            "Concise" => WritingStyle::Concise,
            "Explanatory" => WritingStyle::Explanatory,
            "Formal" => WritingStyle::Formal,
            _ => WritingStyle::Normal,
        }
    }

    pub const ALL: [WritingStyle; 4] = [
        WritingStyle::Normal,
        WritingStyle::Concise,
        WritingStyle::Explanatory,
        WritingStyle::Formal,
    ];
}

/// A user-selectable chat model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatModel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Model id used when the request does not name one.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2-0-flash";

/// The user-facing model catalog. Internal models (title, artifact) are not
/// listed here; they live only in the provider registry.
pub const CHAT_MODELS: [ChatModel; 6] = [
    ChatModel {
        id: "claude-3-5",
        name: "Claude 3.5 Haiku",
        description: "Fast and efficient Claude model for everyday use",
    },
    ChatModel {
        id: "claude-3-7",
        name: "Claude 3.7 Sonnet",
        description: "Latest Claude model with enhanced reasoning and coding abilities",
    },
    ChatModel {
        id: "gemini-2-5-pro-exp",
        name: "Gemini 2.5 Pro",
        description: "Google's most capable model, with search grounding",
    },
    ChatModel {
        id: "gemini-2-0-flash",
        name: "Gemini 2.0 Flash",
        description: "High-speed chat model for quick tasks",
    },
    ChatModel {
        id: "cohere-command-a",
        name: "Cohere Command-A",
        description: "Optimized for advanced RAG and comprehensive knowledge tasks",
    },
    ChatModel {
        id: "deepseek-r1",
        name: "Deepseek R1",
        description: "Reasoning model that emits <think> blocks; tools disabled",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Assistant, Role::Tool] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("system"), None);
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        let parsed: Role = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(parsed, Role::Tool);
    }

    #[test]
    fn test_writing_style_parse_falls_back_to_normal() {
        assert_eq!(WritingStyle::parse_or_normal("Concise"), WritingStyle::Concise);
        assert_eq!(WritingStyle::parse_or_normal("Shouty"), WritingStyle::Normal);
        assert_eq!(WritingStyle::parse_or_normal(""), WritingStyle::Normal);
    }

    #[test]
    fn test_catalog_contains_default_model() {
        assert!(CHAT_MODELS.iter().any(|m| m.id == DEFAULT_CHAT_MODEL));
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = CHAT_MODELS.iter().map(|m| m.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CHAT_MODELS.len());
    }

    #[test]
    fn test_attachment_serde_uses_content_type_key() {
        let att = Attachment {
            url: "/uploads/a.png".to_string(),
            name: "a.png".to_string(),
            content_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["contentType"], "image/png");
    }

    #[test]
    fn test_document_kind_round_trip() {
        assert_eq!(DocumentKind::parse("text"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::parse("code"), Some(DocumentKind::Code));
        assert_eq!(DocumentKind::parse("sheet"), None);
    }

    #[test]
    fn test_message_skips_empty_optional_fields() {
        let msg = Message {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            role: Role::User,
            content: "hi".to_string(),
            reasoning: None,
            attachments: vec![],
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("reasoning").is_none());
        assert!(json.get("attachments").is_none());
    }
}
