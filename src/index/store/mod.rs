
use super::{ChunkMetadata, EmbeddingRecord};
use crate::RagError;
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "chunks";

/// Vector store over a LanceDB dataset directory.
///
/// One store instance corresponds to exactly one on-disk dataset. Builds
/// create a fresh store in a staging directory; the query path opens the
/// current persisted one read-only. Nothing here mutates an existing
/// dataset in place.
pub struct VectorStore {
    connection: Connection,
    vector_dimension: usize,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Create a fresh dataset at `dir` with an empty chunks table.
    #[inline]
    pub async fn create(dir: &Path, vector_dimension: usize) -> crate::Result<Self> {
        debug!("Creating LanceDB dataset at {}", dir.display());

        std::fs::create_dir_all(dir).map_err(|e| {
            RagError::Index(format!("Failed to create index directory: {}", e))
        })?;

        let connection = Self::connect(dir).await?;

        connection
            .create_empty_table(TABLE_NAME, Self::schema(vector_dimension))
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to create chunks table: {}", e)))?;

        info!(
            "Created empty chunks table with {} dimensions",
            vector_dimension
        );

        Ok(Self {
            connection,
            vector_dimension,
        })
    }

    /// Open an existing dataset, detecting the vector dimension from the
    /// stored schema. Fails if the dataset or its chunks table is missing.
    #[inline]
    pub async fn open(dir: &Path) -> crate::Result<Self> {
        debug!("Opening LanceDB dataset at {}", dir.display());

        if !dir.is_dir() {
            return Err(RagError::Index(format!(
                "No persisted index at {}",
                dir.display()
            )));
        }

        let connection = Self::connect(dir).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&TABLE_NAME.to_string()) {
            return Err(RagError::Index(format!(
                "Dataset at {} has no chunks table",
                dir.display()
            )));
        }

        let vector_dimension = Self::detect_vector_dimension(&connection).await?;
        debug!("Detected vector dimension: {}", vector_dimension);

        Ok(Self {
            connection,
            vector_dimension,
        })
    }

    async fn connect(dir: &Path) -> crate::Result<Connection> {
        let uri = format!("file://{}", dir.display());
        lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to connect to LanceDB: {}", e)))
    }

    /// Length of every vector in this dataset.
    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn detect_vector_dimension(connection: &Connection) -> crate::Result<usize> {
        let table = connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to open chunks table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RagError::Index(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RagError::Index(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("source_file", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Store a batch of embedding records.
    #[inline]
    pub async fn store_embeddings_batch(
        &self,
        records: Vec<EmbeddingRecord>,
    ) -> crate::Result<()> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        debug!("Storing batch of {} embeddings", records.len());

        let record_batch = self.create_record_batch(&records)?;

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to open chunks table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to insert embeddings: {}", e)))?;

        info!("Stored {} embeddings", records.len());
        Ok(())
    }

    fn create_record_batch(&self, records: &[EmbeddingRecord]) -> crate::Result<RecordBatch> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        for record in records {
            if record.vector.len() != vector_dim {
                return Err(RagError::Index(format!(
                    "Vector dimension mismatch: expected {}, got {}",
                    vector_dim,
                    record.vector.len()
                )));
            }
        }

        let mut ids = Vec::with_capacity(len);
        let mut source_files = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for record in records {
            ids.push(record.id.as_str());
            source_files.push(record.metadata.source_file.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
            flat_values.extend_from_slice(&record.vector);
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| RagError::Index(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(source_files)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Self::schema(vector_dim), arrays)
            .map_err(|e| RagError::Index(format!("Failed to create record batch: {}", e)))
    }

    /// Search for the nearest stored chunks to the query vector.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> crate::Result<Vec<SearchResult>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to open chunks table: {}", e)))?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let results = query
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> crate::Result<Vec<SearchResult>> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| RagError::Index(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = Self::parse_search_batch(&batch_result)?;
            search_results.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    fn parse_search_batch(batch: &RecordBatch) -> crate::Result<Vec<SearchResult>> {
        let mut search_results = Vec::new();
        let num_rows = batch.num_rows();

        let source_files = Self::string_column(batch, "source_file")?;
        let contents = Self::string_column(batch, "content")?;
        let created_ats = Self::string_column(batch, "created_at")?;

        let chunk_indices = batch
            .column_by_name("chunk_index")
            .ok_or_else(|| RagError::Index("Missing chunk_index column".to_string()))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| RagError::Index("Invalid chunk_index column type".to_string()))?;

        // Distance column is added by LanceDB on vector searches
        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..num_rows {
            let metadata = ChunkMetadata {
                source_file: source_files.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                content: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            };

            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            // Convert distance to similarity score (higher is better)
            let similarity_score = 1.0 - distance;

            search_results.push(SearchResult {
                metadata,
                similarity_score,
                distance,
            });
        }

        Ok(search_results)
    }

    fn string_column<'a>(
        batch: &'a RecordBatch,
        name: &str,
    ) -> crate::Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .ok_or_else(|| RagError::Index(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| RagError::Index(format!("Invalid {} column type", name)))
    }

    /// Get the total number of stored chunks.
    #[inline]
    pub async fn count_chunks(&self) -> crate::Result<u64> {
        let table = self
            .connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to open chunks table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}
