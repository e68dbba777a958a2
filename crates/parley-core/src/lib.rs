//! Shared foundation for the Parley chat server.
//!
//! Defines the workspace-wide error type, TOML configuration, and the
//! domain types (chats, messages, votes, documents) used by every other
//! crate.

pub mod config;
pub mod error;
pub mod types;
