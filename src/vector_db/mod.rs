// LanceDB is the embedded vector index, rebuilt on every run
pub mod lance_client;
pub use lance_client::LanceVectorDB;

use crate::types::Document;
use anyhow::Result;

/// Trait for vector database operations
#[async_trait::async_trait]
pub trait VectorDatabase: Send + Sync {
    /// Create an empty collection, replacing any previous one of the same name
    async fn initialize(&self, dimension: usize) -> Result<()>;

    /// Store one embedding per document, returning the number stored
    async fn store_embeddings(
        &self,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<Document>,
    ) -> Result<usize>;

    /// Documents nearest to the query vector, closest first
    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<Document>>;

    /// Number of stored embeddings
    async fn count(&self) -> Result<usize>;
}
