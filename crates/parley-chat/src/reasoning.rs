//! Reasoning-tag extraction.
//!
//! Reasoning models wrap their chain of thought in `<think>` tags at
//! the start of the reply. Callers re-run the split on every appended
//! chunk, so a reply that has opened the tag but not yet closed it must
//! present as all-thinking with an empty main body.

/// Outcome of splitting a reply into visible text and reasoning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitContent {
    /// Text to show as the assistant's answer.
    pub main: String,
    /// Extracted reasoning, if the reply carries a `<think>` block.
    pub thinking: Option<String>,
    /// False while the `<think>` block is still open.
    pub thinking_complete: bool,
}

impl SplitContent {
    fn plain(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            thinking: None,
            thinking_complete: true,
        }
    }
}

/// Split a reply into main text and `<think>` reasoning.
pub fn split_thinking(content: &str) -> SplitContent {
    let trimmed = content.trim_start();
    let Some(after_open) = trimmed.strip_prefix("<think>") else {
        return SplitContent::plain(content);
    };

    match after_open.find("</think>") {
        Some(close) => SplitContent {
            main: after_open[close + "</think>".len()..].trim().to_string(),
            thinking: Some(after_open[..close].trim().to_string()),
            thinking_complete: true,
        },
        // Tag still open: everything so far is reasoning in progress.
        None => SplitContent {
            main: String::new(),
            thinking: Some(after_open.trim().to_string()),
            thinking_complete: false,
        },
    }
}
