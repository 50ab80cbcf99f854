use super::{AgentTool, RunConfig};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::types::WebSearchRequest;
use async_trait::async_trait;
use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

/// Web search through the Tavily API, exposed as `search`
pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

impl WebSearchTool {
    pub const NAME: &'static str = "search";
    pub const DESCRIPTION: &'static str = "Search for general web results. Uses the Tavily \
        search engine, which is designed to provide comprehensive, accurate, and trusted \
        results. Useful for answering questions about current events.";

    pub fn new(config: &ToolsConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("code-rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Http {
                endpoint: config.tavily_api_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.tavily_api_url.trim_end_matches('/').to_string(),
            api_key: config.tavily_api_key.clone(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Run one search, returning Tavily's result records unchanged
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Value>, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToolError::MissingCredential {
                tool: Self::NAME.to_string(),
                variable: "TAVILY_API_KEY".to_string(),
            })?;

        let endpoint = format!("{}/search", self.base_url);
        tracing::debug!("Web search for '{}' (max {} results)", query, max_results);

        let response = self
            .client
            .post(&endpoint)
            .json(&SearchBody {
                api_key,
                query,
                max_results,
            })
            .send()
            .await
            .map_err(|e| ToolError::Http {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Http {
                endpoint,
                reason: format!("status {}: {}", status, body),
            });
        }

        let mut body: Value = response.json().await.map_err(|e| ToolError::InvalidResponse {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        match body.get_mut("results").map(Value::take) {
            Some(Value::Array(results)) => Ok(results),
            _ => Err(ToolError::InvalidResponse {
                endpoint,
                reason: "missing 'results' array".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AgentTool for WebSearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        schema_for!(WebSearchRequest).to_value()
    }

    async fn invoke(&self, input: &str, config: &RunConfig) -> Result<Value, ToolError> {
        let results = self.search(input, config.max_search_results).await?;
        Ok(Value::Array(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(server_url: &str, key: Option<&str>) -> WebSearchTool {
        WebSearchTool::new(&ToolsConfig::default())
            .unwrap()
            .with_base_url(server_url)
            .with_api_key(key.map(String::from))
    }

    #[tokio::test]
    async fn test_search_returns_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "api_key": "tvly-test",
                "query": "lancedb rust",
                "max_results": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "lancedb rust",
                "results": [
                    {"title": "LanceDB", "url": "https://lancedb.com", "content": "Vector DB", "score": 0.9},
                    {"title": "Docs", "url": "https://docs.rs/lancedb", "content": "API"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = RunConfig {
            max_search_results: 2,
        };
        let value = tool(&server.uri(), Some("tvly-test"))
            .invoke("lancedb rust", &config)
            .await
            .unwrap();

        let results = value.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "LanceDB");
        assert_eq!(results[1]["url"], "https://docs.rs/lancedb");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let server = MockServer::start().await;

        let err = tool(&server.uri(), None)
            .invoke("anything", &RunConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::MissingCredential { ref variable, .. } if variable == "TAVILY_API_KEY"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let err = tool(&server.uri(), Some("bad"))
            .invoke("anything", &RunConfig::default())
            .await
            .unwrap_err();

        match err {
            ToolError::Http { reason, .. } => {
                assert!(reason.contains("401"));
                assert!(reason.contains("invalid key"));
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_results_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "42"})))
            .mount(&server)
            .await;

        let err = tool(&server.uri(), Some("key"))
            .invoke("anything", &RunConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidResponse { .. }));
    }

    #[test]
    fn test_schema_and_name() {
        let tool = WebSearchTool::new(&ToolsConfig::default()).unwrap();
        assert_eq!(tool.name(), "search");
        assert!(tool.input_schema()["properties"]["query"].is_object());
    }
}
