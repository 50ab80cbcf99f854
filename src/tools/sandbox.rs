use super::{AgentTool, RunConfig};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::types::ExecuteCodeRequest;
use async_trait::async_trait;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Port the code interpreter listens on inside an E2B sandbox
const INTERPRETER_PORT: u16 = 49999;

/// Captured output streams of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logs {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Exception raised by the executed code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub name: String,
    pub value: String,
    pub traceback: String,
}

/// Outcome of running code in a sandbox
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Rich results (last expression value, display outputs) as reported by the interpreter
    pub results: Vec<Value>,
    pub logs: Logs,
    pub error: Option<ExecutionError>,
    pub execution_count: Option<u64>,
}

/// One line of the interpreter's NDJSON output stream
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputEvent {
    Stdout {
        #[serde(default)]
        text: String,
    },
    Stderr {
        #[serde(default)]
        text: String,
    },
    Result(Map<String, Value>),
    Error {
        #[serde(default)]
        name: String,
        #[serde(default)]
        value: String,
        #[serde(default)]
        traceback: String,
    },
    NumberOfExecutions {
        execution_count: u64,
    },
    EndOfExecution {},
    #[serde(other)]
    Unknown,
}

impl Execution {
    fn from_ndjson(body: &str) -> Result<Self, serde_json::Error> {
        let mut execution = Execution::default();

        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<OutputEvent>(line)? {
                OutputEvent::Stdout { text } => execution.logs.stdout.push(text),
                OutputEvent::Stderr { text } => execution.logs.stderr.push(text),
                OutputEvent::Result(result) => execution.results.push(Value::Object(result)),
                OutputEvent::Error {
                    name,
                    value,
                    traceback,
                } => {
                    execution.error = Some(ExecutionError {
                        name,
                        value,
                        traceback,
                    })
                }
                OutputEvent::NumberOfExecutions { execution_count } => {
                    execution.execution_count = Some(execution_count)
                }
                OutputEvent::EndOfExecution {} => break,
                OutputEvent::Unknown => {}
            }
        }

        Ok(execution)
    }
}

#[derive(Debug, Deserialize)]
struct SandboxInfo {
    #[serde(rename = "sandboxID")]
    sandbox_id: String,
    #[serde(rename = "envdAccessToken", default)]
    access_token: Option<String>,
}

/// Runs Python in a fresh E2B sandbox per call, exposed as `python_interpretor`
pub struct CodeSandboxTool {
    client: reqwest::Client,
    api_url: String,
    domain: String,
    api_key: Option<String>,
    template: String,
    timeout_secs: u64,
    execution_url: Option<String>,
}

impl CodeSandboxTool {
    pub const NAME: &'static str = "python_interpretor";
    pub const DESCRIPTION: &'static str = "Execute python code in a sandbox environment. \
        Useful for executing and testing code to see if it works as expected.";

    pub fn new(config: &ToolsConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("code-rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Http {
                endpoint: config.e2b_api_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: config.e2b_api_url.trim_end_matches('/').to_string(),
            domain: config.e2b_domain.clone(),
            api_key: config.e2b_api_key.clone(),
            template: config.e2b_template.clone(),
            timeout_secs: config.sandbox_timeout_secs,
            execution_url: None,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Send code to this URL instead of the sandbox's own interpreter host
    pub fn with_execution_url(mut self, url: impl Into<String>) -> Self {
        self.execution_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    fn api_key(&self) -> Result<&str, ToolError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToolError::MissingCredential {
                tool: Self::NAME.to_string(),
                variable: "E2B_API_KEY".to_string(),
            })
    }

    fn interpreter_url(&self, sandbox_id: &str) -> String {
        match &self.execution_url {
            Some(url) => url.clone(),
            None => format!("https://{}-{}.{}", INTERPRETER_PORT, sandbox_id, self.domain),
        }
    }

    async fn create_sandbox(&self, api_key: &str) -> Result<SandboxInfo, ToolError> {
        let endpoint = format!("{}/sandboxes", self.api_url);
        let response = self
            .client
            .post(&endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({
                "templateID": self.template,
                "timeout": self.timeout_secs,
            }))
            .send()
            .await
            .map_err(|e| http_error(&endpoint, e))?;

        let response = check_status(&endpoint, response).await?;
        let info: SandboxInfo = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Created sandbox {}", info.sandbox_id);
        Ok(info)
    }

    async fn run_code(&self, sandbox: &SandboxInfo, code: &str) -> Result<Execution, ToolError> {
        let endpoint = format!("{}/execute", self.interpreter_url(&sandbox.sandbox_id));
        let mut request = self.client.post(&endpoint).json(&json!({ "code": code }));
        if let Some(token) = &sandbox.access_token {
            request = request.header("X-Access-Token", token);
        }

        let response = request.send().await.map_err(|e| http_error(&endpoint, e))?;
        let response = check_status(&endpoint, response).await?;
        let body = response.text().await.map_err(|e| http_error(&endpoint, e))?;

        Execution::from_ndjson(&body).map_err(|e| ToolError::InvalidResponse {
            endpoint,
            reason: e.to_string(),
        })
    }

    async fn kill_sandbox(&self, api_key: &str, sandbox_id: &str) -> Result<(), ToolError> {
        let endpoint = format!("{}/sandboxes/{}", self.api_url, sandbox_id);
        let response = self
            .client
            .delete(&endpoint)
            .header("X-API-KEY", api_key)
            .send()
            .await
            .map_err(|e| http_error(&endpoint, e))?;

        check_status(&endpoint, response).await?;
        tracing::debug!("Killed sandbox {}", sandbox_id);
        Ok(())
    }

    /// Create a sandbox, run `code` in it, and kill it whatever the outcome
    pub async fn execute(&self, code: &str) -> Result<Execution, ToolError> {
        let api_key = self.api_key()?;
        let sandbox = self.create_sandbox(api_key).await?;

        let outcome = self.run_code(&sandbox, code).await;
        if let Err(e) = self.kill_sandbox(api_key, &sandbox.sandbox_id).await {
            tracing::warn!("Failed to kill sandbox {}: {}", sandbox.sandbox_id, e);
        }

        let execution = outcome?;
        tracing::info!(
            "Sandbox logs: stdout={:?} stderr={:?}",
            execution.logs.stdout,
            execution.logs.stderr
        );
        Ok(execution)
    }
}

fn http_error(endpoint: &str, e: reqwest::Error) -> ToolError {
    ToolError::Http {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ToolError::Http {
        endpoint: endpoint.to_string(),
        reason: format!("status {}: {}", status, body),
    })
}

#[async_trait]
impl AgentTool for CodeSandboxTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        schema_for!(ExecuteCodeRequest).to_value()
    }

    async fn invoke(&self, input: &str, _config: &RunConfig) -> Result<Value, ToolError> {
        let execution = self.execute(input).await?;
        serde_json::to_value(execution).map_err(|e| ToolError::InvalidResponse {
            endpoint: self.api_url.clone(),
            reason: e.to_string(),
        })
    }
}
