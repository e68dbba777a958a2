//! Static model registry.
//!
//! Maps catalog model ids (what the browser selects) to the provider
//! that serves them and the model name that goes on the wire.

use parley_core::error::ParleyError;

/// A hosted LLM provider reachable over an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Google,
    Cohere,
    Together,
}

impl Provider {
    /// Default base URL of the provider's OpenAI-compatible API.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::Cohere => "https://api.cohere.ai/compatibility/v1",
            Provider::Together => "https://api.together.xyz/v1",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Google => "GEMINI_API_KEY",
            Provider::Cohere => "COHERE_API_KEY",
            Provider::Together => "TOGETHER_API_KEY",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google",
            Provider::Cohere => "Cohere",
            Provider::Together => "Together",
        }
    }
}

/// How a catalog model id maps onto a provider.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// Catalog id as selected by the browser.
    pub id: &'static str,
    pub provider: Provider,
    /// Model name sent on the wire.
    pub wire_name: &'static str,
    /// Whether tool calling is enabled for this model.
    pub supports_tools: bool,
}

/// All models the server knows how to route, including the internal
/// title and artifact models that never appear in the browser catalog.
pub const MODEL_SPECS: &[ModelSpec] = &[
    ModelSpec {
        id: "claude-3-5",
        provider: Provider::Anthropic,
        wire_name: "claude-3-5-haiku-latest",
        supports_tools: false,
    },
    ModelSpec {
        id: "claude-3-7",
        provider: Provider::Anthropic,
        wire_name: "claude-3-7-sonnet-latest",
        supports_tools: true,
    },
    ModelSpec {
        id: "gemini-2-5-pro-exp",
        provider: Provider::Google,
        wire_name: "gemini-2.5-pro-exp-03-25",
        supports_tools: true,
    },
    ModelSpec {
        id: "gemini-2-0-flash",
        provider: Provider::Google,
        wire_name: "gemini-2.0-flash-001",
        supports_tools: true,
    },
    ModelSpec {
        id: "cohere-command-a",
        provider: Provider::Cohere,
        wire_name: "command-a-03-2025",
        supports_tools: true,
    },
    ModelSpec {
        id: "deepseek-r1",
        provider: Provider::Together,
        wire_name: "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free",
        supports_tools: false,
    },
    ModelSpec {
        id: "title-model",
        provider: Provider::Google,
        wire_name: "gemini-1.5-flash-latest",
        supports_tools: false,
    },
    ModelSpec {
        id: "artifact-model",
        provider: Provider::Google,
        wire_name: "gemini-1.5-flash-latest",
        supports_tools: false,
    },
];

/// Resolve a catalog model id to its spec.
pub fn resolve_model(id: &str) -> Result<&'static ModelSpec, ParleyError> {
    MODEL_SPECS
        .iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| ParleyError::UnknownModel(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_models() {
        let spec = resolve_model("gemini-2-0-flash").unwrap();
        assert_eq!(spec.provider, Provider::Google);
        assert_eq!(spec.wire_name, "gemini-2.0-flash-001");
        assert!(spec.supports_tools);

        let spec = resolve_model("deepseek-r1").unwrap();
        assert_eq!(spec.provider, Provider::Together);
        assert!(!spec.supports_tools);
    }

    #[test]
    fn test_resolve_unknown_model() {
        let err = resolve_model("gpt-4").unwrap_err();
        assert!(matches!(err, ParleyError::UnknownModel(_)));
    }

    #[test]
    fn test_internal_models_resolve() {
        assert!(resolve_model("title-model").is_ok());
        assert!(resolve_model("artifact-model").is_ok());
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = MODEL_SPECS.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MODEL_SPECS.len());
    }

    #[test]
    fn test_provider_env_vars() {
        assert_eq!(Provider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(Provider::Google.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(Provider::Cohere.api_key_env(), "COHERE_API_KEY");
        assert_eq!(Provider::Together.api_key_env(), "TOGETHER_API_KEY");
    }
}
