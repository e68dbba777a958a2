//! Database schema migrations.
//!
//! Applies the initial schema: users, sessions, chats, messages, votes,
//! documents, suggestions, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use parley_core::error::ParleyError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ParleyError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Bearer tokens resolving to a user.
        CREATE TABLE IF NOT EXISTS sessions (
            token       TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user
            ON sessions (user_id);

        CREATE TABLE IF NOT EXISTS chats (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title       TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chats_user
            ON chats (user_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY NOT NULL,
            chat_id     TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
            role        TEXT NOT NULL
                        CHECK (role IN ('user', 'assistant', 'tool')),
            content     TEXT NOT NULL DEFAULT '',
            reasoning   TEXT,
            attachments TEXT NOT NULL DEFAULT '[]',
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_chat
            ON messages (chat_id, created_at ASC);

        CREATE TABLE IF NOT EXISTS votes (
            chat_id     TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
            message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            is_upvoted  INTEGER NOT NULL,
            PRIMARY KEY (chat_id, message_id)
        );

        -- Documents are versioned: each update inserts a new row with the
        -- same id and a fresh created_at.
        CREATE TABLE IF NOT EXISTS documents (
            id          TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title       TEXT NOT NULL DEFAULT '',
            kind        TEXT NOT NULL DEFAULT 'text'
                        CHECK (kind IN ('text', 'code')),
            content     TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (id, created_at)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_user
            ON documents (user_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS suggestions (
            id              TEXT PRIMARY KEY NOT NULL,
            document_id     TEXT NOT NULL,
            original_text   TEXT NOT NULL DEFAULT '',
            suggested_text  TEXT NOT NULL DEFAULT '',
            description     TEXT NOT NULL DEFAULT '',
            resolved        INTEGER NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_suggestions_document
            ON suggestions (document_id);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| ParleyError::Storage(format!("Failed to apply v1 schema: {}", e)))?;

    Ok(())
}
