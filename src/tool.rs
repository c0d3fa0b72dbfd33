// SPDX-License-Identifier: MIT

//! Tool trait and the adapter registry the workflow nodes call through

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ToolError;

/// Trait for external data-source tools.
///
/// `name()` and `description()` return `&str` and `schema()` returns
/// `&Value` so implementations store these in struct fields rather than
/// allocating per call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (unique within an adapter)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// Uniform `call(name, args) -> text` adapter over registered tools.
///
/// Errors propagate unmodified to the caller; the workflow-level fallback
/// handles them uniformly.
#[derive(Clone, Default)]
pub struct ToolAdapter {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolAdapter {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().await;
        tools.insert(tool.name().to_string(), tool);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// Invoke a registered tool and render its result as text
    pub async fn call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self.get(name).await.ok_or_else(|| ToolError::not_found(name))?;

        log::info!("Calling tool: {}", name);
        let result = tool.execute(args).await?;

        match result {
            Value::String(s) => Ok(s),
            other => Ok(serde_json::to_string_pretty(&other).unwrap_or_default()),
        }
    }
}
