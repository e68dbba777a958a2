//! SQLite persistence for Parley.
//!
//! Wraps a rusqlite connection behind [`Database`], applies versioned
//! migrations, and exposes repository structs for chats, messages, votes,
//! documents, suggestions, and sessions.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{
    ChatRepository, DocumentRepository, MessageRepository, SessionRepository,
    SuggestionRepository, UserRepository, VoteRepository,
};
