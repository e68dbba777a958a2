//! Tool trait and registry.
//!
//! Tools are what the model can call mid-turn. Each one advertises a
//! JSON-schema parameter object and executes against JSON arguments,
//! returning a JSON result that is fed back to the model.

pub mod documents;
pub mod suggestions;
pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use parley_provider::ToolDefinition;

use crate::error::ChatError;

/// A tool callable by the model during a chat turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &'static str;

    /// Description shown to the model.
    fn description(&self) -> &'static str;

    /// JSON schema of the argument object.
    fn parameters(&self) -> serde_json::Value;

    /// Run the tool for the acting user.
    async fn execute(
        &self,
        user_id: Uuid,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError>;
}

/// Registry of tools keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Wire definitions for a subset of tools, in the order given.
    pub fn definitions(&self, active: &[&str]) -> Vec<ToolDefinition> {
        active
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                ToolDefinition::function(tool.name(), tool.description(), tool.parameters())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the arguments back"
        }

        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn execute(
            &self,
            _user_id: Uuid,
            args: serde_json::Value,
        ) -> Result<serde_json::Value, ChatError> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn test_registry_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let tool = registry.get("echo").unwrap();
        let result = tool
            .execute(Uuid::new_v4(), serde_json::json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(result["x"], 1);
    }

    #[test]
    fn test_definitions_preserve_active_order_and_skip_unknown() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let defs = registry.definitions(&["missing", "echo"]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "echo");
    }

    #[test]
    fn test_get_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
