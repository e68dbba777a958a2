//! Writing-style registry.
//!
//! Each style is a system-prompt fragment plus the set of tools enabled
//! while it is active. The registry is built once at startup and
//! validated against the tool registry, so a style can never reference
//! a tool that does not exist.

use parley_core::error::ParleyError;
use parley_core::types::WritingStyle;

const CONCISE_PROMPT: &str = "<userStyle>Do not create artifacts. You may write in any programming language. Provide code directly in the chat using Markdown. Be concise. Use short sentences. Avoid details or elaboration. Respond directly. Write clear, simple emails without jargon. </userStyle>";

const EXPLANATORY_PROMPT: &str = "<userStyle>Provide detailed explanations and background context. Break down complex concepts into digestible parts. Use examples when helpful. Aim to educate the user thoroughly on the topic.</userStyle>";

const FORMAL_PROMPT: &str = "<userStyle>Use a formal, professional tone. Avoid colloquialisms and casual language. Use precise vocabulary and maintain proper grammar throughout. Structure your responses in a logical, organized manner.</userStyle>";

const ALL_TOOLS: &[&str] = &[
    "getWeather",
    "createDocument",
    "updateDocument",
    "requestSuggestions",
];

const CONCISE_TOOLS: &[&str] = &["getWeather", "requestSuggestions"];

/// Prompt fragment and tool set for one writing style.
#[derive(Debug, Clone)]
pub struct StyleSpec {
    pub prompt: &'static str,
    pub tool_names: &'static [&'static str],
}

/// Validated map of writing styles.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    normal: StyleSpec,
    concise: StyleSpec,
    explanatory: StyleSpec,
    formal: StyleSpec,
}

impl StyleRegistry {
    /// Build the registry, checking every referenced tool against the
    /// names actually registered.
    pub fn new(registered_tools: &[&str]) -> Result<Self, ParleyError> {
        let registry = Self {
            normal: StyleSpec {
                prompt: "",
                tool_names: ALL_TOOLS,
            },
            concise: StyleSpec {
                prompt: CONCISE_PROMPT,
                tool_names: CONCISE_TOOLS,
            },
            explanatory: StyleSpec {
                prompt: EXPLANATORY_PROMPT,
                tool_names: ALL_TOOLS,
            },
            formal: StyleSpec {
                prompt: FORMAL_PROMPT,
                tool_names: ALL_TOOLS,
            },
        };

        for style in WritingStyle::ALL {
            for tool in registry.spec(style).tool_names {
                if !registered_tools.contains(tool) {
                    return Err(ParleyError::Config(format!(
                        "Style {:?} references unregistered tool: {}",
                        style, tool
                    )));
                }
            }
        }
        Ok(registry)
    }

    pub fn spec(&self, style: WritingStyle) -> &StyleSpec {
        match style {
            WritingStyle::Normal => &self.normal,
            WritingStyle::Concise => &self.concise,
            WritingStyle::Explanatory => &self.explanatory,
            WritingStyle::Formal => &self.formal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StyleRegistry {
        StyleRegistry::new(ALL_TOOLS).unwrap()
    }

    #[test]
    fn test_normal_has_no_prompt_and_all_tools() {
        let spec = registry().spec(WritingStyle::Normal).clone();
        assert!(spec.prompt.is_empty());
        assert_eq!(spec.tool_names.len(), 4);
    }

    #[test]
    fn test_concise_tools_are_subset_of_normal() {
        let reg = registry();
        let normal = reg.spec(WritingStyle::Normal).tool_names;
        let concise = reg.spec(WritingStyle::Concise).tool_names;
        assert!(concise.len() < normal.len());
        for tool in concise {
            assert!(normal.contains(tool));
        }
    }

    #[test]
    fn test_concise_prompt_forbids_artifacts() {
        let spec = registry().spec(WritingStyle::Concise).clone();
        assert!(spec.prompt.starts_with("<userStyle>Do not create artifacts."));
        assert!(!spec.tool_names.contains(&"createDocument"));
    }

    #[test]
    fn test_explanatory_and_formal_have_prompts() {
        let reg = registry();
        assert!(reg
            .spec(WritingStyle::Explanatory)
            .prompt
            .contains("detailed explanations"));
        assert!(reg.spec(WritingStyle::Formal).prompt.contains("formal"));
    }

    #[test]
    fn test_validation_rejects_missing_tool() {
        let err = StyleRegistry::new(&["getWeather"]).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }
}
