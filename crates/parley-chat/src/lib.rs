//! Parley chat crate - everything between an incoming chat request and
//! the streamed reply.
//!
//! Holds the writing-style registry, reasoning-tag extraction, the tool
//! trait with its implementations, and the turn orchestrator that wires
//! them to the provider client and storage.

pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod reasoning;
pub mod styles;
pub mod tools;

pub use error::ChatError;
pub use orchestrator::{ChatEvent, ChatOrchestrator, ChatTurn, IncomingMessage, PreparedTurn};
pub use reasoning::{split_thinking, SplitContent};
pub use styles::StyleRegistry;
pub use tools::{Tool, ToolRegistry};
