//! LanceDB vector database client
//!
//! The collection is recreated by `initialize`, so every indexing run starts
//! from an empty table. Unless a path is configured the database lives in a
//! scratch directory removed when the client is dropped.

use crate::config::VectorDbConfig;
use crate::error::{EmbeddingError, VectorDbError};
use crate::types::{Document, UnitType};
use crate::vector_db::VectorDatabase;
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::Table;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use tempfile::TempDir;

/// LanceDB vector database implementation (embedded, no server required)
pub struct LanceVectorDB {
    connection: Connection,
    table_name: String,
    db_path: String,
    // Dropped after the connection
    _scratch_dir: Option<TempDir>,
}

impl LanceVectorDB {
    /// Create a database in a fresh scratch directory
    pub async fn scratch(table_name: &str) -> Result<Self> {
        let scratch_dir = TempDir::with_prefix("code-rag-lancedb-")
            .context("Failed to create scratch directory for LanceDB")?;
        let db_path = scratch_dir.path().to_string_lossy().to_string();

        let mut db = Self::with_path(&db_path, table_name).await?;
        db._scratch_dir = Some(scratch_dir);
        Ok(db)
    }

    /// Create a new LanceDB instance with custom path
    pub async fn with_path(db_path: &str, table_name: &str) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {}", db_path);

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| VectorDbError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            connection,
            table_name: table_name.to_string(),
            db_path: db_path.to_string(),
            _scratch_dir: None,
        })
    }

    /// Open the database described by the configuration
    pub async fn from_config(config: &VectorDbConfig) -> Result<Self> {
        match &config.lancedb_path {
            Some(path) => {
                Self::with_path(&path.to_string_lossy(), &config.collection_name).await
            }
            None => Self::scratch(&config.collection_name).await,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Create schema for the embeddings table
    fn create_schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("unit_type", DataType::Utf8, false),
            Field::new("file", DataType::Utf8, false),
        ]))
    }

    async fn get_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .with_context(|| format!("Failed to open table '{}'", self.table_name))
    }

    /// Convert embeddings and documents to a RecordBatch; ids continue from `first_id`
    fn create_record_batch(
        embeddings: Vec<Vec<f32>>,
        documents: &[Document],
        first_id: usize,
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let dimension = embeddings[0].len();

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            embeddings
                .into_iter()
                .map(|v| Some(v.into_iter().map(Some))),
            dimension as i32,
        );

        let id_array = StringArray::from(
            documents
                .iter()
                .enumerate()
                .map(|(i, d)| format!("{}:{}", d.metadata.file, first_id + i))
                .collect::<Vec<_>>(),
        );
        let content_array = StringArray::from(
            documents
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>(),
        );
        let unit_type_array = StringArray::from(
            documents
                .iter()
                .map(|d| d.metadata.unit_type.as_str())
                .collect::<Vec<_>>(),
        );
        let file_array = StringArray::from(
            documents
                .iter()
                .map(|d| d.metadata.file.as_str())
                .collect::<Vec<_>>(),
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(vector_array),
                Arc::new(id_array),
                Arc::new(content_array),
                Arc::new(unit_type_array),
                Arc::new(file_array),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| VectorDbError::SearchFailed(format!("missing column '{}'", name)).into())
    }

    fn batch_to_documents(batch: &RecordBatch) -> Result<Vec<Document>> {
        let content = Self::string_column(batch, "content")?;
        let unit_type = Self::string_column(batch, "unit_type")?;
        let file = Self::string_column(batch, "file")?;

        (0..batch.num_rows())
            .map(|i| -> Result<Document> {
                let kind: UnitType = unit_type
                    .value(i)
                    .parse()
                    .map_err(VectorDbError::SearchFailed)?;
                Ok(Document::new(content.value(i), kind, file.value(i)))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl VectorDatabase for LanceVectorDB {
    async fn initialize(&self, dimension: usize) -> Result<()> {
        tracing::info!(
            "Initializing LanceDB with dimension {} at {}",
            dimension,
            self.db_path
        );

        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")?;

        if table_names.contains(&self.table_name) {
            tracing::info!("Dropping existing table '{}'", self.table_name);
            self.connection
                .drop_table(&self.table_name, &[])
                .await
                .context("Failed to drop table")?;
        }

        let schema = Self::create_schema(dimension);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches =
            RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema.clone());

        self.connection
            .create_table(&self.table_name, Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::CollectionCreationFailed {
                collection: self.table_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("Created table '{}'", self.table_name);
        Ok(())
    }

    async fn store_embeddings(
        &self,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<Document>,
    ) -> Result<usize> {
        if embeddings.len() != documents.len() {
            return Err(VectorDbError::LengthMismatch {
                embeddings: embeddings.len(),
                documents: documents.len(),
            }
            .into());
        }
        if embeddings.is_empty() {
            return Ok(0);
        }

        let dimension = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            }
            .into());
        }

        let table = self.get_table().await?;
        let current_count = table
            .count_rows(None)
            .await
            .context("Failed to count rows before store")?;

        let schema = Self::create_schema(dimension);
        let batch = Self::create_record_batch(embeddings, &documents, current_count, schema.clone())?;
        let count = batch.num_rows();

        let batches = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);
        table
            .add(Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::StoreFailed(e.to_string()))?;

        tracing::debug!("Stored {} embeddings in '{}'", count, self.table_name);
        Ok(count)
    }

    async fn search(&self, query_vector: Vec<f32>, limit: usize) -> Result<Vec<Document>> {
        let table = self.get_table().await?;

        if limit == 0 || table.count_rows(None).await.context("Failed to count rows")? == 0 {
            return Ok(Vec::new());
        }

        let stream = table
            .vector_search(query_vector)
            .map_err(|e| VectorDbError::SearchFailed(e.to_string()))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| VectorDbError::SearchFailed(e.to_string()))?;

        let results: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut documents = Vec::new();
        for batch in &results {
            documents.extend(Self::batch_to_documents(batch)?);
        }

        tracing::debug!("Vector search returned {} documents", documents.len());
        Ok(documents)
    }

    async fn count(&self) -> Result<usize> {
        let table = self.get_table().await?;
        let count = table
            .count_rows(None)
            .await
            .context("Failed to count rows")?;
        Ok(count)
    }
}
