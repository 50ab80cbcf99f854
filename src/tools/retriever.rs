use super::{AgentTool, RunConfig};
use crate::error::ToolError;
use crate::retriever::CodeRetriever;
use crate::types::RetrieveRequest;
use async_trait::async_trait;
use schemars::schema_for;
use serde_json::Value;

/// Exposes the code index to the agent as `retrieve_code_data`
#[derive(Clone)]
pub struct RetrieverTool {
    retriever: CodeRetriever,
}

impl RetrieverTool {
    pub const NAME: &'static str = "retrieve_code_data";
    pub const DESCRIPTION: &'static str = "Search and return relevant code section for user query.";

    pub fn new(retriever: CodeRetriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl AgentTool for RetrieverTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        schema_for!(RetrieveRequest).to_value()
    }

    async fn invoke(&self, input: &str, _config: &RunConfig) -> Result<Value, ToolError> {
        let documents = self
            .retriever
            .retrieve(input)
            .await
            .map_err(|e| ToolError::Retrieval(format!("{:#}", e)))?;

        serde_json::to_value(documents).map_err(|e| ToolError::Retrieval(e.to_string()))
    }
}
