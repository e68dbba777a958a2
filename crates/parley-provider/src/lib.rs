//! Parley provider crate - clients for hosted LLM APIs.
//!
//! Every chat provider is reached through its OpenAI-compatible
//! chat-completions endpoint, so a single wire format and streaming
//! codec covers Anthropic, Google, Cohere, and Together. Voice
//! transcription uses the Gemini generateContent API directly.

pub mod client;
pub mod registry;
pub mod transcribe;
pub mod wire;

pub use client::{invocations_to_wire, ChatClient, ChatStream, StreamEvent};
pub use registry::{resolve_model, ModelSpec, Provider};
pub use transcribe::{GeminiTranscriber, MockSpeechService, SpeechService, VoiceResult};
pub use wire::{ToolDefinition, ToolInvocation, WireMessage};
