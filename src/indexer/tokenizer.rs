use crate::config::EmbeddingConfig;
use crate::embedding::model_spec;
use crate::error::{EmbeddingError, RagError};
use anyhow::{Context, Result};
use hf_hub::api::sync::ApiBuilder;
use tokenizers::Tokenizer;

/// Token boundaries used to size chunks
pub trait ChunkTokenizer: Send + Sync {
    /// Byte offsets `(start, end)` of every token in `text`, without special tokens
    fn token_offsets(&self, text: &str) -> Result<Vec<(usize, usize)>>;

    /// Number of tokens in `text`
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.token_offsets(text)?.len())
    }
}

impl ChunkTokenizer for Tokenizer {
    fn token_offsets(&self, text: &str) -> Result<Vec<(usize, usize)>> {
        let encoding = self
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Failed to tokenize text: {}", e))?;
        Ok(encoding.get_offsets().to_vec())
    }
}

/// Load the tokenizer matching the configured embedding model.
///
/// An explicit `tokenizer_path` wins; otherwise `tokenizer.json` is fetched from
/// the model's Hugging Face repository into the model cache.
pub fn load_tokenizer(config: &EmbeddingConfig) -> Result<Tokenizer> {
    let file = match &config.tokenizer_path {
        Some(path) => path.clone(),
        None => {
            let spec = model_spec(&config.model_name)
                .ok_or_else(|| RagError::from(EmbeddingError::UnknownModel(config.model_name.clone())))?;

            tracing::info!("Fetching tokenizer for {} from {}", spec.name, spec.tokenizer_repo);
            let api = ApiBuilder::new()
                .with_cache_dir(config.cache_dir.clone())
                .with_progress(false)
                .build()
                .context("Failed to create Hugging Face client")?;
            api.model(spec.tokenizer_repo.to_string())
                .get("tokenizer.json")
                .map_err(|e| EmbeddingError::TokenizerLoadFailed(e.to_string()))?
        }
    };

    tracing::debug!("Loading tokenizer from {}", file.display());
    let mut tokenizer = Tokenizer::from_file(&file)
        .map_err(|e| EmbeddingError::TokenizerLoadFailed(format!("{}: {}", file.display(), e)))?;

    // Every token must be counted, including past the model's max length
    tokenizer
        .with_truncation(None)
        .map_err(|e| EmbeddingError::TokenizerLoadFailed(e.to_string()))?;
    tokenizer.with_padding(None);

    Ok(tokenizer)
}
