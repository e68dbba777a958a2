//! Repository implementations for SQLite-backed persistence.
//!
//! Each repository operates on the shared [`Database`] using raw SQL.
//! All ownership checks happen above this layer; repositories only move
//! rows in and out.

use std::sync::Arc;

use chrono::DateTime;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use parley_core::error::ParleyError;
use parley_core::types::{
    Attachment, Chat, Document, DocumentKind, Message, Role, Suggestion, Vote,
};

use crate::db::Database;

/// Repository for user accounts.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a user, returning its id.
    pub fn create(&self, email: &str) -> Result<Uuid, ParleyError> {
        let id = Uuid::new_v4();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email) VALUES (?1, ?2)",
                rusqlite::params![id.to_string(), email],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to create user: {}", e)))?;
            Ok(id)
        })
    }

    /// Look up a user id by email.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Uuid>, ParleyError> {
        self.db.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;
            match id {
                Some(s) => Ok(Some(parse_uuid(&s)?)),
                None => Ok(None),
            }
        })
    }
}

/// Repository for bearer-token sessions.
pub struct SessionRepository {
    db: Arc<Database>,
}

impl SessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a session token for a user.
    pub fn create(&self, token: &str, user_id: Uuid) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO sessions (token, user_id) VALUES (?1, ?2)",
                rusqlite::params![token, user_id.to_string()],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to create session: {}", e)))?;
            Ok(())
        })
    }

    /// Resolve a bearer token to the user it belongs to.
    pub fn resolve(&self, token: &str) -> Result<Option<Uuid>, ParleyError> {
        self.db.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM sessions WHERE token = ?1",
                    rusqlite::params![token],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;
            match id {
                Some(s) => Ok(Some(parse_uuid(&s)?)),
                None => Ok(None),
            }
        })
    }

    /// Remove a session token.
    pub fn delete(&self, token: &str) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .map_err(|e| ParleyError::Storage(e.to_string()))?;
            Ok(())
        })
    }
}

/// Repository for chats.
pub struct ChatRepository {
    db: Arc<Database>,
}

impl ChatRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new chat.
    pub fn save(&self, chat: &Chat) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, user_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    chat.id.to_string(),
                    chat.user_id.to_string(),
                    chat.title,
                    chat.created_at.timestamp(),
                ],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to save chat: {}", e)))?;
            Ok(())
        })
    }

    /// Find a chat by id.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Chat>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, user_id, title, created_at FROM chats WHERE id = ?1")
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| Ok(row_to_chat(row)))
                .optional()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            match result {
                Some(chat) => Ok(Some(chat?)),
                None => Ok(None),
            }
        })
    }

    /// List a user's chats, newest first.
    pub fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Chat>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, title, created_at FROM chats
                     WHERE user_id = ?1 ORDER BY created_at DESC",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string()], |row| {
                    Ok(row_to_chat(row))
                })
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let mut chats = Vec::new();
            for row in rows {
                let chat = row.map_err(|e| ParleyError::Storage(e.to_string()))??;
                chats.push(chat);
            }
            Ok(chats)
        })
    }

    /// Delete a chat. Messages and votes cascade at the schema level.
    pub fn delete(&self, id: Uuid) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM chats WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to delete chat: {}", e)))?;
            Ok(())
        })
    }
}

/// Repository for messages.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a single message.
    pub fn save(&self, message: &Message) -> Result<(), ParleyError> {
        self.save_all(std::slice::from_ref(message))
    }

    /// Store a batch of messages.
    pub fn save_all(&self, messages: &[Message]) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "INSERT INTO messages (id, chat_id, role, content, reasoning, attachments, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            for message in messages {
                let attachments = serde_json::to_string(&message.attachments)?;
                stmt.execute(rusqlite::params![
                    message.id.to_string(),
                    message.chat_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    message.reasoning,
                    attachments,
                    message.created_at.timestamp(),
                ])
                .map_err(|e| ParleyError::Storage(format!("Failed to save message: {}", e)))?;
            }
            Ok(())
        })
    }

    /// List a chat's messages in creation order.
    pub fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Message>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, chat_id, role, content, reasoning, attachments, created_at
                     FROM messages WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![chat_id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| ParleyError::Storage(e.to_string()))??;
                messages.push(message);
            }
            Ok(messages)
        })
    }

    /// Count messages in a chat.
    pub fn count_by_chat(&self, chat_id: Uuid) -> Result<u64, ParleyError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE chat_id = ?1",
                    rusqlite::params![chat_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Repository for message votes.
pub struct VoteRepository {
    db: Arc<Database>,
}

impl VoteRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a vote, replacing any existing vote on the same message.
    pub fn upsert(&self, vote: &Vote) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (chat_id, message_id, is_upvoted) VALUES (?1, ?2, ?3)
                 ON CONFLICT (chat_id, message_id) DO UPDATE SET is_upvoted = ?3",
                rusqlite::params![
                    vote.chat_id.to_string(),
                    vote.message_id.to_string(),
                    vote.is_upvoted as i32,
                ],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to save vote: {}", e)))?;
            Ok(())
        })
    }

    /// List all votes in a chat.
    pub fn list_by_chat(&self, chat_id: Uuid) -> Result<Vec<Vote>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT chat_id, message_id, is_upvoted FROM votes WHERE chat_id = ?1")
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![chat_id.to_string()], |row| {
                    Ok(row_to_vote(row))
                })
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let mut votes = Vec::new();
            for row in rows {
                let vote = row.map_err(|e| ParleyError::Storage(e.to_string()))??;
                votes.push(vote);
            }
            Ok(votes)
        })
    }
}

/// Repository for tool-produced documents.
pub struct DocumentRepository {
    db: Arc<Database>,
}

impl DocumentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new document version.
    pub fn save(&self, document: &Document) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, created_at, user_id, title, kind, content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    document.id.to_string(),
                    document.created_at.timestamp(),
                    document.user_id.to_string(),
                    document.title,
                    document.kind.as_str(),
                    document.content,
                ],
            )
            .map_err(|e| ParleyError::Storage(format!("Failed to save document: {}", e)))?;
            Ok(())
        })
    }

    /// Find the latest version of a document.
    pub fn find_latest(&self, id: Uuid) -> Result<Option<Document>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, created_at, user_id, title, kind, content FROM documents
                     WHERE id = ?1 ORDER BY created_at DESC LIMIT 1",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_document(row))
                })
                .optional()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            match result {
                Some(doc) => Ok(Some(doc?)),
                None => Ok(None),
            }
        })
    }
}

/// Repository for edit suggestions.
pub struct SuggestionRepository {
    db: Arc<Database>,
}

impl SuggestionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a batch of suggestions.
    pub fn save_all(&self, suggestions: &[Suggestion]) -> Result<(), ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "INSERT INTO suggestions
                     (id, document_id, original_text, suggested_text, description, resolved)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            for s in suggestions {
                stmt.execute(rusqlite::params![
                    s.id.to_string(),
                    s.document_id.to_string(),
                    s.original_text,
                    s.suggested_text,
                    s.description,
                    s.resolved as i32,
                ])
                .map_err(|e| ParleyError::Storage(format!("Failed to save suggestion: {}", e)))?;
            }
            Ok(())
        })
    }

    /// List suggestions for a document.
    pub fn list_by_document(&self, document_id: Uuid) -> Result<Vec<Suggestion>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, document_id, original_text, suggested_text, description, resolved
                     FROM suggestions WHERE document_id = ?1 ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![document_id.to_string()], |row| {
                    Ok(row_to_suggestion(row))
                })
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let mut suggestions = Vec::new();
            for row in rows {
                let s = row.map_err(|e| ParleyError::Storage(e.to_string()))??;
                suggestions.push(s);
            }
            Ok(suggestions)
        })
    }
}

// =============================================================================
// Row mappers
// =============================================================================

fn parse_uuid(s: &str) -> Result<Uuid, ParleyError> {
    Uuid::parse_str(s).map_err(|e| ParleyError::Storage(format!("Invalid UUID in row: {}", e)))
}

fn epoch_to_utc(ts: i64) -> chrono::DateTime<chrono::Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn row_to_chat(row: &rusqlite::Row<'_>) -> Result<Chat, ParleyError> {
    let id: String = row.get(0).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let user_id: String = row.get(1).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let title: String = row.get(2).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(3).map_err(|e| ParleyError::Storage(e.to_string()))?;
    Ok(Chat {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        title,
        created_at: epoch_to_utc(created_at),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, ParleyError> {
    let id: String = row.get(0).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let chat_id: String = row.get(1).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let role: String = row.get(2).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let content: String = row.get(3).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let reasoning: Option<String> = row.get(4).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let attachments: String = row.get(5).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(6).map_err(|e| ParleyError::Storage(e.to_string()))?;

    let attachments: Vec<Attachment> = serde_json::from_str(&attachments).unwrap_or_default();

    Ok(Message {
        id: parse_uuid(&id)?,
        chat_id: parse_uuid(&chat_id)?,
        role: Role::parse(&role)
            .ok_or_else(|| ParleyError::Storage(format!("Invalid role in row: {}", role)))?,
        content,
        reasoning,
        attachments,
        created_at: epoch_to_utc(created_at),
    })
}

fn row_to_vote(row: &rusqlite::Row<'_>) -> Result<Vote, ParleyError> {
    let chat_id: String = row.get(0).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let message_id: String = row.get(1).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let is_upvoted: i64 = row.get(2).map_err(|e| ParleyError::Storage(e.to_string()))?;
    Ok(Vote {
        chat_id: parse_uuid(&chat_id)?,
        message_id: parse_uuid(&message_id)?,
        is_upvoted: is_upvoted != 0,
    })
}

fn row_to_document(row: &rusqlite::Row<'_>) -> Result<Document, ParleyError> {
    let id: String = row.get(0).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(1).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let user_id: String = row.get(2).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let title: String = row.get(3).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let kind: String = row.get(4).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let content: String = row.get(5).map_err(|e| ParleyError::Storage(e.to_string()))?;
    Ok(Document {
        id: parse_uuid(&id)?,
        created_at: epoch_to_utc(created_at),
        user_id: parse_uuid(&user_id)?,
        title,
        kind: DocumentKind::parse(&kind)
            .ok_or_else(|| ParleyError::Storage(format!("Invalid document kind: {}", kind)))?,
        content,
    })
}

fn row_to_suggestion(row: &rusqlite::Row<'_>) -> Result<Suggestion, ParleyError> {
    let id: String = row.get(0).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let document_id: String = row.get(1).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let original_text: String = row.get(2).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let suggested_text: String = row.get(3).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let description: String = row.get(4).map_err(|e| ParleyError::Storage(e.to_string()))?;
    let resolved: i64 = row.get(5).map_err(|e| ParleyError::Storage(e.to_string()))?;
    Ok(Suggestion {
        id: parse_uuid(&id)?,
        document_id: parse_uuid(&document_id)?,
        original_text,
        suggested_text,
        description,
        resolved: resolved != 0,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setup() -> (Arc<Database>, Uuid) {
        let db = Arc::new(Database::in_memory().unwrap());
        let users = UserRepository::new(Arc::clone(&db));
        let user_id = users.create("test@example.com").unwrap();
        (db, user_id)
    }

    fn make_chat(user_id: Uuid) -> Chat {
        Chat {
            id: Uuid::new_v4(),
            user_id,
            title: "Weather in Turku".to_string(),
            created_at: Utc::now(),
        }
    }

    fn make_message(chat_id: Uuid, role: Role, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id,
            role,
            content: content.to_string(),
            reasoning: None,
            attachments: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_create_and_find() {
        let (db, user_id) = setup();
        let users = UserRepository::new(db);
        assert_eq!(users.find_by_email("test@example.com").unwrap(), Some(user_id));
        assert_eq!(users.find_by_email("nobody@example.com").unwrap(), None);
    }

    #[test]
    fn test_session_resolve() {
        let (db, user_id) = setup();
        let sessions = SessionRepository::new(db);
        sessions.create("tok-123", user_id).unwrap();
        assert_eq!(sessions.resolve("tok-123").unwrap(), Some(user_id));
        assert_eq!(sessions.resolve("tok-999").unwrap(), None);

        sessions.delete("tok-123").unwrap();
        assert_eq!(sessions.resolve("tok-123").unwrap(), None);
    }

    #[test]
    fn test_chat_save_and_find() {
        let (db, user_id) = setup();
        let chats = ChatRepository::new(db);
        let chat = make_chat(user_id);
        chats.save(&chat).unwrap();

        let found = chats.find_by_id(chat.id).unwrap().unwrap();
        assert_eq!(found.id, chat.id);
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.title, "Weather in Turku");
    }

    #[test]
    fn test_chat_find_missing_returns_none() {
        let (db, _) = setup();
        let chats = ChatRepository::new(db);
        assert!(chats.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_chat_list_by_user_newest_first() {
        let (db, user_id) = setup();
        let chats = ChatRepository::new(Arc::clone(&db));

        let mut older = make_chat(user_id);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = make_chat(user_id);
        chats.save(&older).unwrap();
        chats.save(&newer).unwrap();

        let listed = chats.list_by_user(user_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[test]
    fn test_chat_delete_cascades_messages() {
        let (db, user_id) = setup();
        let chats = ChatRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(Arc::clone(&db));

        let chat = make_chat(user_id);
        chats.save(&chat).unwrap();
        messages
            .save(&make_message(chat.id, Role::User, "hello"))
            .unwrap();
        assert_eq!(messages.count_by_chat(chat.id).unwrap(), 1);

        chats.delete(chat.id).unwrap();
        assert!(chats.find_by_id(chat.id).unwrap().is_none());
        assert_eq!(messages.count_by_chat(chat.id).unwrap(), 0);
    }

    #[test]
    fn test_message_order_and_fields() {
        let (db, user_id) = setup();
        let chats = ChatRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(Arc::clone(&db));

        let chat = make_chat(user_id);
        chats.save(&chat).unwrap();

        let mut user_msg = make_message(chat.id, Role::User, "what's the weather?");
        user_msg.attachments = vec![Attachment {
            url: "/uploads/map.png".to_string(),
            name: "map.png".to_string(),
            content_type: "image/png".to_string(),
        }];
        let mut assistant_msg = make_message(chat.id, Role::Assistant, "sunny");
        assistant_msg.reasoning = Some("checked the forecast".to_string());

        messages.save_all(&[user_msg.clone(), assistant_msg.clone()]).unwrap();

        let listed = messages.list_by_chat(chat.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].role, Role::User);
        assert_eq!(listed[0].attachments.len(), 1);
        assert_eq!(listed[0].attachments[0].name, "map.png");
        assert_eq!(listed[1].role, Role::Assistant);
        assert_eq!(listed[1].reasoning.as_deref(), Some("checked the forecast"));
    }

    #[test]
    fn test_vote_upsert_replaces() {
        let (db, user_id) = setup();
        let chats = ChatRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(Arc::clone(&db));
        let votes = VoteRepository::new(Arc::clone(&db));

        let chat = make_chat(user_id);
        chats.save(&chat).unwrap();
        let msg = make_message(chat.id, Role::Assistant, "answer");
        messages.save(&msg).unwrap();

        votes
            .upsert(&Vote {
                chat_id: chat.id,
                message_id: msg.id,
                is_upvoted: true,
            })
            .unwrap();
        votes
            .upsert(&Vote {
                chat_id: chat.id,
                message_id: msg.id,
                is_upvoted: false,
            })
            .unwrap();

        let listed = votes.list_by_chat(chat.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_upvoted);
    }

    #[test]
    fn test_document_versioning() {
        let (db, user_id) = setup();
        let docs = DocumentRepository::new(db);

        let id = Uuid::new_v4();
        let v1 = Document {
            id,
            created_at: Utc::now() - chrono::Duration::minutes(5),
            user_id,
            title: "Essay".to_string(),
            kind: DocumentKind::Text,
            content: "draft one".to_string(),
        };
        let v2 = Document {
            content: "draft two".to_string(),
            created_at: Utc::now(),
            ..v1.clone()
        };
        docs.save(&v1).unwrap();
        docs.save(&v2).unwrap();

        let latest = docs.find_latest(id).unwrap().unwrap();
        assert_eq!(latest.content, "draft two");
    }

    #[test]
    fn test_suggestions_round_trip() {
        let (db, _) = setup();
        let suggestions = SuggestionRepository::new(db);

        let document_id = Uuid::new_v4();
        let batch = vec![
            Suggestion {
                id: Uuid::new_v4(),
                document_id,
                original_text: "teh".to_string(),
                suggested_text: "the".to_string(),
                description: "typo".to_string(),
                resolved: false,
            },
            Suggestion {
                id: Uuid::new_v4(),
                document_id,
                original_text: "very unique".to_string(),
                suggested_text: "unique".to_string(),
                description: "redundancy".to_string(),
                resolved: false,
            },
        ];
        suggestions.save_all(&batch).unwrap();

        let listed = suggestions.list_by_document(document_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].description, "typo");
    }
}
