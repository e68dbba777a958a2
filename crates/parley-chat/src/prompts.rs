//! System prompts used across chat turns.

/// Base system prompt for every chat turn.
pub const BASE_SYSTEM_PROMPT: &str =
    "You are a friendly assistant! Keep your responses concise and helpful.";

/// System prompt for generating a chat title from the first message.
pub const TITLE_SYSTEM_PROMPT: &str = "\
- you will generate a short title based on the first message a user begins a conversation with
- ensure it is not more than 80 characters long
- the title should be a summary of the user's message
- do not use quotes or colons";

/// Maximum length of a fallback title derived from the message text.
pub const TITLE_FALLBACK_MAX_CHARS: usize = 80;

/// Compose the system prompt for a turn: base prompt plus the selected
/// style fragment, when the style carries one.
pub fn system_prompt(style_fragment: &str) -> String {
    if style_fragment.is_empty() {
        BASE_SYSTEM_PROMPT.to_string()
    } else {
        format!("{}\n{}", BASE_SYSTEM_PROMPT, style_fragment)
    }
}

/// Title used when title generation fails: the message text itself,
/// cut at a character boundary.
pub fn fallback_title(message: &str) -> String {
    message.chars().take(TITLE_FALLBACK_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_without_style() {
        assert_eq!(system_prompt(""), BASE_SYSTEM_PROMPT);
    }

    #[test]
    fn test_system_prompt_appends_style() {
        let prompt = system_prompt("<userStyle>Be brief.</userStyle>");
        assert!(prompt.starts_with(BASE_SYSTEM_PROMPT));
        assert!(prompt.ends_with("<userStyle>Be brief.</userStyle>"));
    }

    #[test]
    fn test_fallback_title_truncates() {
        let long = "x".repeat(200);
        assert_eq!(fallback_title(&long).chars().count(), 80);
        assert_eq!(fallback_title("short"), "short");
    }

    #[test]
    fn test_fallback_title_respects_char_boundaries() {
        let msg = "ä".repeat(100);
        assert_eq!(fallback_title(&msg).chars().count(), 80);
    }
}
