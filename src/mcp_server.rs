use crate::client::RagClient;
use crate::config::Config;
use crate::error::ToolError;
use crate::tools::{CodeSandboxTool, RetrieverTool, RunConfig, ToolSet, WebSearchTool};
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// MCP server exposing the agent tools over stdio
#[derive(Clone)]
pub struct CodeRagMcpServer {
    client: Arc<RagClient>,
    root: PathBuf,
    // Web search and sandbox, usable before any index exists
    remote_tools: ToolSet,
    // Full set including the retriever, built on the first retrieval call
    indexed_tools: Arc<OnceCell<ToolSet>>,
    tool_router: ToolRouter<Self>,
}

impl CodeRagMcpServer {
    /// Create a server that indexes `root` on first use
    pub async fn new(config: Config, root: impl AsRef<Path>) -> Result<Self> {
        let client = RagClient::with_config(config).await?;
        Self::with_client(Arc::new(client), root)
    }

    /// Create a new server with an existing client
    pub fn with_client(client: Arc<RagClient>, root: impl AsRef<Path>) -> Result<Self> {
        let remote_tools = ToolSet::remote(&client.config().tools)?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            remote_tools,
            indexed_tools: Arc::new(OnceCell::new()),
            client,
            tool_router: Self::tool_router(),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &RagClient {
        &self.client
    }

    fn run_config(&self) -> RunConfig {
        RunConfig::from(&self.client.config().tools)
    }

    async fn indexed_tools(&self) -> Result<&ToolSet> {
        self.indexed_tools
            .get_or_try_init(|| async {
                let (retriever, stats) = self
                    .client
                    .build_index(&self.root)
                    .await
                    .context("Failed to build code index")?;
                tracing::info!(
                    "Code index ready: {} chunks from {} files",
                    stats.embeddings,
                    stats.files_read
                );
                Ok(self
                    .remote_tools
                    .clone()
                    .with_tool(Arc::new(RetrieverTool::new(retriever))))
            })
            .await
    }
}

fn to_json_string(value: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn tool_failure(err: ToolError) -> String {
    err.to_string()
}

#[tool_router(router = tool_router)]
impl CodeRagMcpServer {
    #[tool(description = "Search and return relevant code section for user query.")]
    async fn retrieve_code_data(
        &self,
        Parameters(req): Parameters<RetrieveRequest>,
    ) -> Result<String, String> {
        let tools = self
            .indexed_tools()
            .await
            .map_err(|e| format!("{:#}", e))?;
        let value = tools
            .invoke(RetrieverTool::NAME, &req.query, &self.run_config())
            .await
            .map_err(tool_failure)?;

        to_json_string(&value)
    }

    #[tool(
        description = "Search for general web results. Uses the Tavily search engine, which is designed to provide comprehensive, accurate, and trusted results. Useful for answering questions about current events."
    )]
    async fn search(
        &self,
        Parameters(req): Parameters<WebSearchRequest>,
    ) -> Result<String, String> {
        req.validate().map_err(|e| e.to_string())?;

        let mut config = self.run_config();
        if let Some(max_results) = req.max_results {
            config.max_search_results = max_results;
        }

        let value = self
            .remote_tools
            .invoke(WebSearchTool::NAME, &req.query, &config)
            .await
            .map_err(tool_failure)?;

        to_json_string(&value)
    }

    #[tool(
        description = "Execute python code in a sandbox environment. Useful for executing and testing code to see if it works as expected."
    )]
    async fn python_interpretor(
        &self,
        Parameters(req): Parameters<ExecuteCodeRequest>,
    ) -> Result<String, String> {
        req.validate().map_err(|e| e.to_string())?;

        let value = self
            .remote_tools
            .invoke(CodeSandboxTool::NAME, &req.code, &self.run_config())
            .await
            .map_err(tool_failure)?;

        to_json_string(&value)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for CodeRagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "code-rag".into(),
                title: Some("Code RAG - Python code retrieval for agents".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Code-aware retrieval tools. Use retrieve_code_data to fetch relevant code \
                sections from the indexed source tree, search for web results, and \
                python_interpretor to run Python in a fresh sandbox."
                    .into(),
            ),
        }
    }
}

impl CodeRagMcpServer {
    pub async fn serve_stdio(self) -> Result<()> {
        tracing::info!("Starting code-rag MCP server for {}", self.root.display());

        let transport = rmcp::transport::io::stdio();

        self.serve(transport).await?.waiting().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
