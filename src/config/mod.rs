/// Configuration system for code-rag
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Tree walking and chunking configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Agent tool configuration (web search, code sandbox)
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "BAAI/bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Explicit tokenizer.json to size chunks with. Downloaded from the model's
    /// Hugging Face repository when unset.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    /// Directory where model files are cached between runs
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,
}

/// Tree walking and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// File extensions (without the dot) that are read and extracted
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Name prefix marking private files and directories, which are skipped
    #[serde(default = "default_private_prefix")]
    pub private_prefix: String,

    /// Chunk size in embedding-model tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens shared by consecutive chunks of one document
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Skip unreadable or non-UTF-8 files with a warning instead of failing the walk
    #[serde(default)]
    pub skip_unreadable: bool,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Collection (LanceDB table) name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// LanceDB directory. A scratch directory removed with the index is used when unset.
    #[serde(default)]
    pub lancedb_path: Option<PathBuf>,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of chunks returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Agent tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Default number of web search results per call
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Tavily API base URL
    #[serde(default = "default_tavily_api_url")]
    pub tavily_api_url: String,

    /// Tavily API key (usually supplied via TAVILY_API_KEY)
    #[serde(default, skip_serializing)]
    pub tavily_api_key: Option<String>,

    /// E2B control-plane API URL
    #[serde(default = "default_e2b_api_url")]
    pub e2b_api_url: String,

    /// Domain sandboxes are reachable under
    #[serde(default = "default_e2b_domain")]
    pub e2b_domain: String,

    /// E2B API key (usually supplied via E2B_API_KEY)
    #[serde(default, skip_serializing)]
    pub e2b_api_key: Option<String>,

    /// Sandbox template to boot
    #[serde(default = "default_e2b_template")]
    pub e2b_template: String,

    /// Sandbox lifetime in seconds, enforced by E2B
    #[serde(default = "default_sandbox_timeout")]
    pub sandbox_timeout_secs: u64,
}

// Default value functions
fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_model_cache_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_model_cache_path()
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_private_prefix() -> String {
    "__".to_string()
}

fn default_chunk_size() -> usize {
    100
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_collection_name() -> String {
    "code-rag-chroma".to_string()
}

fn default_top_k() -> usize {
    4
}

fn default_max_search_results() -> usize {
    10
}

fn default_tavily_api_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_e2b_api_url() -> String {
    "https://api.e2b.dev".to_string()
}

fn default_e2b_domain() -> String {
    "e2b.app".to_string()
}

fn default_e2b_template() -> String {
    "code-interpreter-v1".to_string()
}

fn default_sandbox_timeout() -> u64 {
    300
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            batch_size: default_batch_size(),
            tokenizer_path: None,
            cache_dir: default_model_cache_dir(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            private_prefix: default_private_prefix(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            skip_unreadable: false,
        }
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            lancedb_path: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_search_results: default_max_search_results(),
            tavily_api_url: default_tavily_api_url(),
            tavily_api_key: None,
            e2b_api_url: default_e2b_api_url(),
            e2b_domain: default_e2b_domain(),
            e2b_api_key: None,
            e2b_template: default_e2b_template(),
            sandbox_timeout_secs: default_sandbox_timeout(),
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> RagError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, RagError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be greater than 0"));
        }

        if self.indexing.extensions.is_empty() {
            return Err(invalid("indexing.extensions", "must list at least one extension"));
        }

        if let Some(ext) = self
            .indexing
            .extensions
            .iter()
            .find(|ext| !crate::indexer::is_supported_extension(ext))
        {
            return Err(invalid(
                "indexing.extensions",
                format!("no grammar available for '{}'", ext),
            ));
        }

        if self.indexing.private_prefix.is_empty() {
            return Err(invalid("indexing.private_prefix", "must not be empty"));
        }

        if self.indexing.chunk_size == 0 {
            return Err(invalid("indexing.chunk_size", "must be greater than 0"));
        }

        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(invalid(
                "indexing.chunk_overlap",
                format!(
                    "must be smaller than chunk_size ({}), got {}",
                    self.indexing.chunk_size, self.indexing.chunk_overlap
                ),
            ));
        }

        if self.vector_db.collection_name.trim().is_empty() {
            return Err(invalid("vector_db.collection_name", "must not be empty"));
        }

        if self.search.top_k == 0 {
            return Err(invalid("search.top_k", "must be greater than 0"));
        }

        if self.tools.max_search_results == 0 {
            return Err(invalid("tools.max_search_results", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("CODE_RAG_MODEL") {
            self.embedding.model_name = model;
        }

        if let Ok(batch_size) = std::env::var("CODE_RAG_BATCH_SIZE")
            && let Ok(size) = batch_size.parse()
        {
            self.embedding.batch_size = size;
        }

        if let Ok(path) = std::env::var("CODE_RAG_TOKENIZER_PATH") {
            self.embedding.tokenizer_path = Some(PathBuf::from(path));
        }

        if let Ok(extensions) = std::env::var("CODE_RAG_EXTENSIONS") {
            self.indexing.extensions = extensions
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect();
        }

        if let Ok(chunk_size) = std::env::var("CODE_RAG_CHUNK_SIZE")
            && let Ok(size) = chunk_size.parse()
        {
            self.indexing.chunk_size = size;
        }

        if let Ok(overlap) = std::env::var("CODE_RAG_CHUNK_OVERLAP")
            && let Ok(size) = overlap.parse()
        {
            self.indexing.chunk_overlap = size;
        }

        if let Ok(path) = std::env::var("CODE_RAG_LANCEDB_PATH") {
            self.vector_db.lancedb_path = Some(PathBuf::from(path));
        }

        if let Ok(top_k) = std::env::var("CODE_RAG_TOP_K")
            && let Ok(k) = top_k.parse()
        {
            self.search.top_k = k;
        }

        if let Ok(max_results) = std::env::var("CODE_RAG_MAX_SEARCH_RESULTS")
            && let Ok(n) = max_results.parse()
        {
            self.tools.max_search_results = n;
        }

        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            self.tools.tavily_api_key = Some(key);
        }

        if let Ok(key) = std::env::var("E2B_API_KEY") {
            self.tools.e2b_api_key = Some(key);
        }
    }

    /// Load from `path` (or the default location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, RagError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, RagError> {
        Self::load(None)
    }
}

#[cfg(test)]
mod tests;
