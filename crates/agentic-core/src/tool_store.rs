//! The name-unique [`ToolStore`] registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::tool::Tool;

/// Name-unique registry of [`Tool`]s, read-only after construction and safe
/// to share across tasks. Grounded on
/// `astrid_tools::ToolRegistry`'s `HashMap<String, Box<dyn BuiltinTool>>`
/// shape, using `Arc` instead of `Box` so the store itself can be cloned
/// cheaply and shared between an `Agent` and any sub-agents it spawns.
#[derive(Clone, Default)]
pub struct ToolStore {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails loudly on a duplicate name
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateTool`] if a tool with this name is
    /// already registered.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> CoreResult<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(CoreError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// `true` if a tool by this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Iterate all registered tools, for building LLM-facing schemas.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Export `{name, description, schema, strict}` for every tool, the
    /// shape the Responder contract expects.
    #[must_use]
    pub fn all_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                schema: t.schema(),
                strict: t.strict(),
            })
            .collect()
    }
}

/// The `{name, description, schema, strict}` tuple advertised to a
/// Responder.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub schema: Value,
    /// Whether argument deserialization is validated strictly.
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolOutput;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes input"
        }
        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn invoke(&self, input: Value) -> ToolOutput {
            ToolOutput::text(input.to_string())
        }
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut store = ToolStore::new();
        store.register(Arc::new(Echo)).unwrap();
        let err = store.register(Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn get_returns_registered_tool() {
        let mut store = ToolStore::new();
        store.register(Arc::new(Echo)).unwrap();
        assert!(store.get("echo").is_some());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn all_schemas_reflects_registered_tools() {
        let mut store = ToolStore::new();
        store.register(Arc::new(Echo)).unwrap();
        let schemas = store.all_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "echo");
    }
}
