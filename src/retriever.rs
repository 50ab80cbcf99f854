use crate::embedding::EmbeddingProvider;
use crate::error::EmbeddingError;
use crate::types::Document;
use crate::vector_db::VectorDatabase;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Read-only handle over a built vector index.
///
/// Cloning is cheap; clones share the same index.
#[derive(Clone)]
pub struct CodeRetriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_db: Arc<dyn VectorDatabase>,
    top_k: usize,
}

impl CodeRetriever {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_db: Arc<dyn VectorDatabase>,
        top_k: usize,
    ) -> Self {
        Self {
            embedding_provider,
            vector_db,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Top-k indexed documents most similar to `query`, closest first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        self.retrieve_k(query, self.top_k).await
    }

    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let provider = Arc::clone(&self.embedding_provider);
        let text = query.to_string();
        let mut embeddings = tokio::task::spawn_blocking(move || provider.embed_batch(vec![text]))
            .await
            .context("Embedding task panicked")??;

        let query_vector = match embeddings.pop() {
            Some(vector) if embeddings.is_empty() => vector,
            _ => {
                return Err(EmbeddingError::GenerationFailed(
                    "expected exactly one query embedding".to_string(),
                )
                .into());
            }
        };

        let expected = self.embedding_provider.dimension();
        if query_vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: query_vector.len(),
            }
            .into());
        }

        let documents = self.vector_db.search(query_vector, k).await?;
        tracing::debug!("Retrieved {} documents for query", documents.len());
        Ok(documents)
    }

    /// Number of chunks in the underlying index
    pub async fn indexed_count(&self) -> Result<usize> {
        self.vector_db.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitType;
    use std::sync::Mutex;

    struct FixedEmbedder {
        vectors: usize,
        dimension: usize,
    }

    impl EmbeddingProvider for FixedEmbedder {
        fn embed_batch(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.5; self.dimension]; self.vectors])
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[derive(Default)]
    struct RecordingDb {
        limits: Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl VectorDatabase for RecordingDb {
        async fn initialize(&self, _dimension: usize) -> Result<()> {
            Ok(())
        }

        async fn store_embeddings(
            &self,
            embeddings: Vec<Vec<f32>>,
            _documents: Vec<Document>,
        ) -> Result<usize> {
            Ok(embeddings.len())
        }

        async fn search(&self, _query_vector: Vec<f32>, limit: usize) -> Result<Vec<Document>> {
            self.limits.lock().unwrap().push(limit);
            Ok((0..limit.min(2))
                .map(|i| Document::new(format!("V{} = {}", i, i), UnitType::Identifier, "a.py"))
                .collect())
        }

        async fn count(&self) -> Result<usize> {
            Ok(2)
        }
    }

    fn retriever(vectors: usize, dimension: usize) -> (CodeRetriever, Arc<RecordingDb>) {
        let db = Arc::new(RecordingDb::default());
        let retriever = CodeRetriever::new(
            Arc::new(FixedEmbedder { vectors, dimension }),
            db.clone(),
            4,
        );
        (retriever, db)
    }

    #[tokio::test]
    async fn test_retrieve_uses_top_k() {
        let (retriever, db) = retriever(1, 3);

        let docs = retriever.retrieve("constants").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(*db.limits.lock().unwrap(), vec![4]);

        retriever.retrieve_k("constants", 1).await.unwrap();
        assert_eq!(*db.limits.lock().unwrap(), vec![4, 1]);
        assert_eq!(retriever.indexed_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_rejects_wrong_dimension() {
        let (retriever, _) = retriever(1, 5);
        let err = retriever.retrieve("anything").await.unwrap_err();
        assert!(err.to_string().contains("expected 3, got 5"));
    }

    #[tokio::test]
    async fn test_retrieve_rejects_missing_embedding() {
        let (retriever, _) = retriever(0, 3);
        assert!(retriever.retrieve("anything").await.is_err());
    }

    #[test]
    fn test_with_top_k() {
        let (retriever, _) = retriever(1, 3);
        assert_eq!(retriever.with_top_k(7).top_k(), 7);
    }
}
