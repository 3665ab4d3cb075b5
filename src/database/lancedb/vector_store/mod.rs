#[cfg(test)]
mod tests;

use super::{EmbeddingRecord, VectorMetadata};
use crate::database::sqlite::models::DocumentType;
use crate::{HrError, config::Config};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use itertools::Itertools;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "hr_embeddings";

/// Vector database store using LanceDB for similarity search
#[derive(Clone)]
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub metadata: VectorMetadata,
    /// `1 - cosine distance`, higher is closer
    pub similarity_score: f32,
    pub distance: f32,
}

/// Restricts a similarity search to one organization and optionally to some types
#[derive(Debug, Clone)]
pub struct SearchFilter<'a> {
    pub organization_id: &'a str,
    pub document_types: Option<&'a [DocumentType]>,
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl VectorStore {
    /// Open the vector database configured for this installation
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self, HrError> {
        Self::new(
            &config.vector_database_path(),
            config.indexing.embedding_dimension as usize,
        )
        .await
    }

    /// Open (or create) the store at `db_path` with a fixed vector dimension
    ///
    /// An existing table with a different dimension is rejected rather than
    /// rebuilt; use [`VectorStore::open_and_reset`] to start over.
    #[inline]
    pub async fn new(db_path: &Path, vector_dimension: usize) -> Result<Self, HrError> {
        let store = Self::connect(db_path, vector_dimension).await?;
        store.initialize_table().await?;

        info!(
            "Vector store initialized with {} dimensions",
            store.vector_dimension
        );
        Ok(store)
    }

    /// Open the store at `db_path` and drop every stored vector
    #[inline]
    pub async fn open_and_reset(db_path: &Path, vector_dimension: usize) -> Result<Self, HrError> {
        let store = Self::connect(db_path, vector_dimension).await?;
        store.reset().await?;
        Ok(store)
    }

    async fn connect(db_path: &Path, vector_dimension: usize) -> Result<Self, HrError> {
        if vector_dimension == 0 {
            return Err(HrError::Store(
                "Vector dimension must be greater than 0".to_string(),
            ));
        }

        debug!("Initializing LanceDB at path: {:?}", db_path);
        std::fs::create_dir_all(db_path).map_err(|e| {
            HrError::Store(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension,
        })
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn initialize_table(&self) -> Result<(), HrError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            let existing = self.detect_existing_vector_dimension().await?;
            if existing != self.vector_dimension {
                return Err(HrError::Store(format!(
                    "Vector table has dimension {} but {} is configured; reset the vector store to rebuild",
                    existing, self.vector_dimension
                )));
            }
            debug!("Embeddings table already exists with {} dimensions", existing);
            return Ok(());
        }

        self.create_table().await
    }

    async fn create_table(&self) -> Result<(), HrError> {
        self.connection
            .create_empty_table(&self.table_name, self.create_schema())
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to create table: {}", e)))?;

        info!(
            "Embeddings table created with {} dimensions",
            self.vector_dimension
        );
        Ok(())
    }

    async fn open_table(&self) -> Result<Table, HrError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to open table: {}", e)))
    }

    /// Detect vector dimension from existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<usize, HrError> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| HrError::Store(format!("Failed to get table schema: {}", e)))?;

        schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                HrError::Store("Could not find vector column or determine dimension".to_string())
            })
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("document_type", DataType::Utf8, false),
            Field::new("document_id", DataType::Utf8, false),
            Field::new("organization_id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("updated_at", DataType::Utf8, false),
        ]))
    }

    /// Insert records, replacing any existing rows with the same ids
    #[inline]
    pub async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), HrError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        if let Some(bad) = records
            .iter()
            .find(|r| r.vector.len() != self.vector_dimension)
        {
            return Err(HrError::Store(format!(
                "Vector for {} has dimension {}, expected {}",
                bad.id,
                bad.vector.len(),
                self.vector_dimension
            )));
        }

        let record_batch = self.create_record_batch(records)?;
        let table = self.open_table().await?;

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        Self::delete_ids(&table, &ids).await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to insert embeddings: {}", e)))?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    fn create_record_batch(&self, records: &[EmbeddingRecord]) -> Result<RecordBatch, HrError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * self.vector_dimension);
        let mut document_types = Vec::with_capacity(len);
        let mut document_ids = Vec::with_capacity(len);
        let mut organization_ids = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut updated_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            document_types.push(record.metadata.document_type.as_str());
            document_ids.push(record.metadata.document_id.as_str());
            organization_ids.push(record.metadata.organization_id.as_str());
            contents.push(record.metadata.content.as_str());
            updated_ats.push(record.metadata.updated_at.as_str());
        }

        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| HrError::Store(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(document_types)),
            Arc::new(StringArray::from(document_ids)),
            Arc::new(StringArray::from(organization_ids)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(updated_ats)),
        ];

        RecordBatch::try_new(self.create_schema(), arrays)
            .map_err(|e| HrError::Store(format!("Failed to create record batch: {}", e)))
    }

    fn filter_predicate(filter: &SearchFilter<'_>) -> String {
        let organization = format!("organization_id = {}", quote(filter.organization_id));
        match filter.document_types {
            Some(types) => format!(
                "{} AND document_type IN ({})",
                organization,
                types.iter().map(|t| quote(t.as_str())).join(", ")
            ),
            None => organization,
        }
    }

    /// Top `limit` vectors by cosine similarity, closest first
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: &SearchFilter<'_>,
    ) -> Result<Vec<SearchResult>, HrError> {
        if query_vector.len() != self.vector_dimension {
            return Err(HrError::Store(format!(
                "Query vector has dimension {}, expected {}",
                query_vector.len(),
                self.vector_dimension
            )));
        }
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self.open_table().await?;
        let results = table
            .vector_search(query_vector)
            .map_err(|e| HrError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .only_if(Self::filter_predicate(filter))
            .limit(limit)
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to execute search: {}", e)))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| HrError::Store(format!("Failed to read result stream: {}", e)))?;

        let mut search_results = Vec::new();
        for batch in &batches {
            search_results.extend(Self::parse_search_batch(batch)?);
        }
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray, HrError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| HrError::Store(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| HrError::Store(format!("Invalid {} column type", name)))
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, HrError> {
        let document_types = Self::string_column(batch, "document_type")?;
        let document_ids = Self::string_column(batch, "document_id")?;
        let organization_ids = Self::string_column(batch, "organization_id")?;
        let contents = Self::string_column(batch, "content")?;
        let updated_ats = Self::string_column(batch, "updated_at")?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        (0..batch.num_rows())
            .map(|row| {
                let document_type = document_types.value(row).parse::<DocumentType>()?;
                let distance = distances
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                Ok(SearchResult {
                    metadata: VectorMetadata {
                        document_type,
                        document_id: document_ids.value(row).to_string(),
                        organization_id: organization_ids.value(row).to_string(),
                        content: contents.value(row).to_string(),
                        updated_at: updated_ats.value(row).to_string(),
                    },
                    similarity_score: 1.0 - distance,
                    distance,
                })
            })
            .collect()
    }

    async fn delete_ids(table: &Table, ids: &[&str]) -> Result<(), HrError> {
        if ids.is_empty() {
            return Ok(());
        }
        let predicate = format!("id IN ({})", ids.iter().map(|id| quote(id)).join(", "));
        table
            .delete(&predicate)
            .await
            .map_err(|e| HrError::Store(format!("Failed to delete embeddings: {}", e)))?;
        Ok(())
    }

    /// Delete vectors by id; unknown ids are ignored
    #[inline]
    pub async fn delete(&self, ids: &[&str]) -> Result<(), HrError> {
        let table = self.open_table().await?;
        Self::delete_ids(&table, ids).await?;
        debug!("Deleted {} embeddings", ids.len());
        Ok(())
    }

    /// Count vectors of one organization, optionally of one type
    #[inline]
    pub async fn count(
        &self,
        organization_id: &str,
        document_type: Option<DocumentType>,
    ) -> Result<u64, HrError> {
        let types = document_type.map(|t| [t]);
        let filter = SearchFilter {
            organization_id,
            document_types: types.as_ref().map(|t| t.as_slice()),
        };

        let table = self.open_table().await?;
        let count = table
            .count_rows(Some(Self::filter_predicate(&filter)))
            .await
            .map_err(|e| HrError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Compact the table and prune old versions
    #[inline]
    pub async fn optimize(&self) -> Result<(), HrError> {
        debug!("Optimizing vector database");

        let table = self.open_table().await?;
        table
            .optimize(lancedb::table::OptimizeAction::All)
            .await
            .map_err(|e| HrError::Store(format!("Failed to optimize table: {}", e)))?;

        info!("Vector database optimization completed");
        Ok(())
    }

    /// Drop every vector and recreate the table with the configured dimension
    #[inline]
    pub async fn reset(&self) -> Result<(), HrError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| HrError::Store(format!("Failed to list tables for drop: {}", e)))?;

        if table_names.contains(&self.table_name) {
            info!("Dropping existing embeddings table");
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| HrError::Store(format!("Failed to drop table: {}", e)))?;
        }

        self.create_table().await
    }
}
