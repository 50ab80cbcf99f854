//! Core library client for code-rag
//!
//! `RagClient` runs the indexing pipeline (walk, extract, chunk, embed, index)
//! on demand and hands back an owned retriever over the result. Nothing is read
//! or indexed until [`RagClient::build_index`] is called.

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager};
use crate::error::EmbeddingError;
use crate::indexer::{ChunkTokenizer, CodeChunker, FileWalker, WalkOutput, load_tokenizer};
use crate::retriever::CodeRetriever;
use crate::types::{Document, IndexStats};
use crate::vector_db::{LanceVectorDB, VectorDatabase};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Main client for building code indexes
///
/// # Example
///
/// ```no_run
/// use code_rag::RagClient;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = RagClient::new().await?;
///     let (retriever, stats) = client.build_index(".").await?;
///     println!("Indexed {} chunks from {} files", stats.chunks, stats.files_read);
///
///     for doc in retriever.retrieve("where is the prompt defined").await? {
///         println!("{}: {}", doc.metadata.file, doc.content);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RagClient {
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) chunker: Arc<CodeChunker>,
    pub(crate) config: Arc<Config>,
}

impl RagClient {
    /// Create a client from the default configuration sources
    pub async fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Create a client, loading the configured embedding model and its tokenizer
    pub async fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::info!("Initializing RAG client");
        tracing::debug!("Embedding model: {}", config.embedding.model_name);
        tracing::debug!(
            "Chunk size: {} tokens, overlap {}",
            config.indexing.chunk_size,
            config.indexing.chunk_overlap
        );

        // Model and tokenizer loading may download files and block
        let embedding_config = config.embedding.clone();
        let (embedding_provider, tokenizer) = tokio::task::spawn_blocking(move || {
            let provider = FastEmbedManager::from_config(&embedding_config)
                .context("Failed to initialize embedding provider")?;
            let tokenizer =
                load_tokenizer(&embedding_config).context("Failed to load chunk tokenizer")?;
            anyhow::Ok((provider, tokenizer))
        })
        .await
        .context("Model loading task panicked")??;

        Self::with_components(config, Arc::new(embedding_provider), Arc::new(tokenizer))
    }

    /// Create a client from an already constructed embedder and tokenizer
    pub fn with_components(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        tokenizer: Arc<dyn ChunkTokenizer>,
    ) -> Result<Self> {
        config.validate()?;

        let chunker = CodeChunker::new(
            config.indexing.chunk_size,
            config.indexing.chunk_overlap,
            tokenizer,
        )?;

        Ok(Self {
            embedding_provider,
            chunker: Arc::new(chunker),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.dimension()
    }

    /// Walk `root` and extract its documents
    pub async fn collect_documents(&self, root: impl AsRef<Path>) -> Result<WalkOutput> {
        let indexing = &self.config.indexing;
        let walker = FileWalker::new(root.as_ref())
            .with_extensions(indexing.extensions.clone())
            .with_private_prefix(indexing.private_prefix.clone())
            .with_skip_unreadable(indexing.skip_unreadable);

        tokio::task::spawn_blocking(move || walker.walk())
            .await
            .context("Failed to spawn file walker task")?
    }

    /// Split documents into token-bounded chunks
    pub async fn chunk_documents(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        let chunker = Arc::clone(&self.chunker);
        tokio::task::spawn_blocking(move || chunker.split_documents(documents))
            .await
            .context("Failed to spawn chunking task")?
    }

    /// Embed chunk contents in configured batches, one vector per chunk
    pub async fn embed_documents(&self, chunks: &[Document]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.embedding.batch_size;
        let dimension = self.embedding_provider.dimension();
        let mut all_embeddings = Vec::with_capacity(chunks.len());

        for (i, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let expected = texts.len();
            tracing::debug!("Embedding batch {} ({} chunks)", i + 1, expected);

            let provider = Arc::clone(&self.embedding_provider);
            let embeddings = tokio::task::spawn_blocking(move || provider.embed_batch(texts))
                .await
                .context("Embedding task panicked")??;

            if embeddings.len() != expected {
                return Err(EmbeddingError::GenerationFailed(format!(
                    "provider returned {} embeddings for {} texts",
                    embeddings.len(),
                    expected
                ))
                .into());
            }
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: bad.len(),
                }
                .into());
            }

            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    /// Build a fresh vector index for the tree at `root`.
    ///
    /// Any failure aborts the run; no partial index is returned.
    pub async fn build_index(&self, root: impl AsRef<Path>) -> Result<(CodeRetriever, IndexStats)> {
        let vector_db = LanceVectorDB::from_config(&self.config.vector_db)
            .await
            .context("Failed to initialize LanceDB vector database")?;
        self.build_index_with(root, Arc::new(vector_db)).await
    }

    /// Build the index into the given vector database, replacing its collection
    pub async fn build_index_with(
        &self,
        root: impl AsRef<Path>,
        vector_db: Arc<dyn VectorDatabase>,
    ) -> Result<(CodeRetriever, IndexStats)> {
        let start = Instant::now();
        let root = root.as_ref();
        tracing::info!("Indexing {}", root.display());

        let walked = self.collect_documents(root).await?;
        let documents = walked.documents.len();

        let chunks = self.chunk_documents(walked.documents).await?;
        let chunk_count = chunks.len();
        tracing::info!("Split {} documents into {} chunks", documents, chunk_count);

        let embeddings = self.embed_documents(&chunks).await?;

        vector_db.initialize(self.embedding_provider.dimension()).await?;
        let stored = vector_db.store_embeddings(embeddings, chunks).await?;

        let stats = IndexStats {
            files_read: walked.files_read,
            documents,
            chunks: chunk_count,
            embeddings: stored,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Indexed {} chunks from {} files in {}ms",
            stats.embeddings,
            stats.files_read,
            stats.duration_ms
        );

        let retriever = CodeRetriever::new(
            Arc::clone(&self.embedding_provider),
            vector_db,
            self.config.search.top_k,
        );
        Ok((retriever, stats))
    }
}
