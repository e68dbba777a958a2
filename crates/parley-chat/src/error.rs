//! Error types for chat turn handling.

use parley_core::error::ParleyError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no user message found")]
    NoUserMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("chat belongs to another user")]
    NotOwner,
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("tool error: {0}")]
    ToolError(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ParleyError> for ChatError {
    fn from(err: ParleyError) -> Self {
        match err {
            ParleyError::Storage(msg) => ChatError::StorageError(msg),
            ParleyError::Tool(msg) => ChatError::ToolError(msg),
            ParleyError::UnknownModel(id) => ChatError::UnknownModel(id),
            other => ChatError::ProviderError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::NoUserMessage.to_string(),
            "no user message found"
        );
        assert_eq!(
            ChatError::MessageTooLong(32000).to_string(),
            "message exceeds maximum length of 32000 characters"
        );
        assert_eq!(
            ChatError::NotOwner.to_string(),
            "chat belongs to another user"
        );
    }

    #[test]
    fn test_from_parley_error_routes_by_variant() {
        let err: ChatError = ParleyError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ChatError::StorageError(_)));

        let err: ChatError = ParleyError::UnknownModel("gpt-4".to_string()).into();
        assert!(matches!(err, ChatError::UnknownModel(_)));

        let err: ChatError = ParleyError::Provider("timeout".to_string()).into();
        assert!(matches!(err, ChatError::ProviderError(_)));
    }
}
