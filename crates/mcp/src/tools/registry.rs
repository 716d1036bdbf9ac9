// Tool trait, registry and schema helpers

use crate::format::{format_result, map_error};
use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments, returning the raw API payload
    async fn execute(&self, arguments: Value) -> Result<Value>;

    /// What the tool does to CRM data
    fn access(&self) -> ToolAccess {
        ToolAccess::Read
    }
}

/// Effect of a tool on CRM data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolAccess {
    /// Read-only operations
    Read,
    /// Creates or modifies records
    Write,
    /// Deletes or unlinks records
    Destructive,
}

impl ToolAccess {
    pub fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: Some(*self == ToolAccess::Read),
            destructive_hint: Some(*self == ToolAccess::Destructive),
        }
    }
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|t| {
                let mut schema = t.schema();
                schema.annotations.get_or_insert_with(|| t.access().annotations());
                schema
            })
            .collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool and render its outcome. Returns `None` for unknown tools.
    ///
    /// Every tool failure ends here and becomes an `isError` result.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<CallToolResult> {
        let tool = self.get(name)?;

        debug!(tool = name, "Calling tool");
        let result = match tool.execute(arguments).await {
            Ok(data) => format_result(&data),
            Err(e) => {
                warn!(tool = name, error = %format!("{:#}", e), "Tool call failed");
                map_error(&e)
            }
        };
        Some(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

pub fn json_schema_record(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "description": description,
        "additionalProperties": true
    })
}
