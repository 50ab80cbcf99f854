use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// A selectable embedding model
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Name used in configuration
    pub name: &'static str,
    pub model: EmbeddingModel,
    pub dimension: usize,
    /// Hugging Face repository holding the model's `tokenizer.json`
    pub tokenizer_repo: &'static str,
}

pub static SUPPORTED_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "all-MiniLM-L6-v2",
        model: EmbeddingModel::AllMiniLML6V2,
        dimension: 384,
        tokenizer_repo: "sentence-transformers/all-MiniLM-L6-v2",
    },
    ModelSpec {
        name: "BAAI/bge-small-en-v1.5",
        model: EmbeddingModel::BGESmallENV15,
        dimension: 384,
        tokenizer_repo: "BAAI/bge-small-en-v1.5",
    },
    ModelSpec {
        name: "BAAI/bge-base-en-v1.5",
        model: EmbeddingModel::BGEBaseENV15,
        dimension: 768,
        tokenizer_repo: "BAAI/bge-base-en-v1.5",
    },
];

/// Look up a model by name; the `BAAI/` organization prefix is optional
pub fn model_spec(name: &str) -> Option<&'static ModelSpec> {
    SUPPORTED_MODELS.iter().find(|spec| {
        spec.name.eq_ignore_ascii_case(name)
            || spec
                .name
                .strip_prefix("BAAI/")
                .is_some_and(|short| short.eq_ignore_ascii_case(name))
    })
}

/// FastEmbed-based embedding provider, all-MiniLM-L6-v2 by default
pub struct FastEmbedManager {
    // fastembed needs `&mut` to embed
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: &'static str,
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::from_config(&EmbeddingConfig::default())
    }

    /// Create the provider named by the embedding configuration
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::with_model_name(&config.model_name, Some(config.cache_dir.clone()))
    }

    pub fn with_model_name(name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let spec = model_spec(name).ok_or_else(|| EmbeddingError::UnknownModel(name.to_string()))?;
        tracing::info!("Initializing FastEmbed model: {}", spec.name);

        let mut options = InitOptions::default();
        options.model_name = spec.model.clone();
        options.show_download_progress = true;
        if let Some(cache_dir) = cache_dir {
            options.cache_dir = cache_dir;
        }

        let embedding_model =
            TextEmbedding::try_new(options).context("Failed to initialize FastEmbed model")?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            dimension: spec.dimension,
            model_name: spec.name,
        })
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::GenerationFailed("embedding model lock poisoned".into()))?;
        let embeddings = model
            .embed(texts, None)
            .context("Failed to generate embeddings")?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_spec_lookup() {
        let spec = model_spec("all-MiniLM-L6-v2").unwrap();
        assert_eq!(spec.dimension, 384);
        assert!(matches!(spec.model, EmbeddingModel::AllMiniLML6V2));

        assert_eq!(model_spec("bge-base-en-v1.5").unwrap().dimension, 768);
        assert_eq!(model_spec("baai/BGE-small-en-v1.5").unwrap().dimension, 384);
        assert!(model_spec("text-embedding-3-large").is_none());
    }

    #[test]
    fn test_supported_models_have_tokenizers() {
        for spec in SUPPORTED_MODELS {
            assert!(spec.tokenizer_repo.contains('/'));
            assert!(spec.dimension > 0);
        }
    }

    #[test]
    fn test_unknown_model_rejected() {
        let result = FastEmbedManager::with_model_name("no-such-model", None);
        let err = result.err().unwrap();
        assert!(err.to_string().contains("Unknown embedding model"));
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn test_embedding_generation() {
        let manager = FastEmbedManager::new().unwrap();
        let texts = vec![
            "def main():\n    print(\"Hello, world!\")".to_string(),
            "GREETING = \"hello\"".to_string(),
        ];

        let embeddings = manager.embed_batch(texts).unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
        assert_eq!(embeddings[1].len(), 384);
        assert_eq!(manager.model_name(), "all-MiniLM-L6-v2");
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn test_empty_batch() {
        let manager = FastEmbedManager::new().unwrap();
        let embeddings = manager.embed_batch(vec![]).unwrap();
        assert_eq!(embeddings.len(), 0);
    }

    #[test]
    #[ignore = "downloads the embedding model"]
    fn test_with_model_bge_base() {
        let manager = FastEmbedManager::with_model_name("BAAI/bge-base-en-v1.5", None).unwrap();
        assert_eq!(manager.dimension(), 768);
    }
}
