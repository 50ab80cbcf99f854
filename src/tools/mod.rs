//! Agent tools
//!
//! Each tool is a named, described callable taking one primary string argument
//! and the run configuration injected by the agent's dispatch loop. The
//! [`ToolSet`] holds them in the order they are offered to the agent.

mod retriever;
mod sandbox;
mod web_search;

pub use retriever::RetrieverTool;
pub use sandbox::{CodeSandboxTool, Execution, ExecutionError, Logs};
pub use web_search::WebSearchTool;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::retriever::CodeRetriever;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Per-run settings passed to every tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of web search results to request
    pub max_search_results: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_search_results: 10,
        }
    }
}

impl From<&ToolsConfig> for RunConfig {
    fn from(config: &ToolsConfig) -> Self {
        Self {
            max_search_results: config.max_search_results,
        }
    }
}

/// A callable exposed to the agent
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Name the agent calls the tool by
    fn name(&self) -> &str;

    /// One-line description used by the agent to pick a tool
    fn description(&self) -> &str;

    /// JSON Schema of the tool's arguments
    fn input_schema(&self) -> Value;

    /// Run the tool on its primary argument
    async fn invoke(&self, input: &str, config: &RunConfig) -> Result<Value, ToolError>;
}

/// Name, description and argument schema of one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One requested tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub input: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
        }
    }
}

/// Ordered tool list offered to the agent
#[derive(Clone)]
pub struct ToolSet {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl ToolSet {
    /// The standard set: web search, code sandbox, then code retrieval
    pub fn new(retriever: CodeRetriever, config: &ToolsConfig) -> Result<Self, ToolError> {
        Ok(Self::remote(config)?.with_tool(Arc::new(RetrieverTool::new(retriever))))
    }

    /// The tools that need no code index: web search, then code sandbox
    pub fn remote(config: &ToolsConfig) -> Result<Self, ToolError> {
        Ok(Self::from_tools(vec![
            Arc::new(WebSearchTool::new(config)?),
            Arc::new(CodeSandboxTool::new(config)?),
        ]))
    }

    pub fn from_tools(tools: Vec<Arc<dyn AgentTool>>) -> Self {
        Self { tools }
    }

    /// Append a tool after the existing ones
    pub fn with_tool(mut self, tool: Arc<dyn AgentTool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(&self) -> &[Arc<dyn AgentTool>] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Invoke one tool by name
    pub async fn invoke(
        &self,
        name: &str,
        input: &str,
        config: &RunConfig,
    ) -> Result<Value, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tracing::debug!("Invoking tool '{}'", name);
        tool.invoke(input, config).await
    }

    /// Await several calls concurrently; results line up with `calls`.
    ///
    /// Calls are independent, so one failure does not affect the others.
    pub async fn invoke_many(
        &self,
        calls: &[ToolCall],
        config: &RunConfig,
    ) -> Vec<Result<Value, ToolError>> {
        let futures = calls
            .iter()
            .map(|call| self.invoke(&call.name, &call.input, config));
        futures::future::join_all(futures).await
    }
}
