use super::*;
use crate::config::IndexingConfig;
use tempfile::TempDir;

const DIMENSION: usize = 4;

async fn create_test_store() -> (VectorStore, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::new(&temp_dir.path().join("vectors"), DIMENSION)
        .await
        .expect("should create vector store");
    (store, temp_dir)
}

fn record(
    document_type: DocumentType,
    document_id: &str,
    organization_id: &str,
    vector: Vec<f32>,
) -> EmbeddingRecord {
    EmbeddingRecord::new(
        document_type,
        document_id,
        organization_id,
        format!("Content of {}", document_id),
        vector,
    )
}

#[tokio::test]
async fn vector_store_initialization() {
    let (store, _temp_dir) = create_test_store().await;
    assert_eq!(store.table_name, TABLE_NAME);
    assert_eq!(store.vector_dimension(), DIMENSION);
    assert_eq!(
        store
            .count("org-1", None)
            .await
            .expect("should count embeddings"),
        0
    );
}

#[tokio::test]
async fn from_config_uses_vector_directory() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        indexing: IndexingConfig {
            embedding_dimension: 8,
            ..IndexingConfig::default()
        },
        ..Config::default()
    };

    let store = VectorStore::from_config(&config)
        .await
        .expect("should create vector store");
    assert_eq!(store.vector_dimension(), 8);
    assert!(config.vector_database_path().exists());
}

#[tokio::test]
async fn upsert_replaces_existing_vector() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .upsert(&[record(
            DocumentType::Employee,
            "e1",
            "org-1",
            vec![1.0, 0.0, 0.0, 0.0],
        )])
        .await
        .expect("should store embedding");

    let mut replacement = record(DocumentType::Employee, "e1", "org-1", vec![0.0, 1.0, 0.0, 0.0]);
    replacement.metadata.content = "Updated content".to_string();
    store
        .upsert(&[replacement])
        .await
        .expect("should replace embedding");

    assert_eq!(
        store
            .count("org-1", Some(DocumentType::Employee))
            .await
            .expect("should count"),
        1
    );

    let filter = SearchFilter {
        organization_id: "org-1",
        document_types: None,
    };
    let results = store
        .search(&[0.0, 1.0, 0.0, 0.0], 5, &filter)
        .await
        .expect("should search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.content, "Updated content");
    assert!(results[0].similarity_score > 0.99);
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let (store, _temp_dir) = create_test_store().await;

    let result = store
        .upsert(&[record(DocumentType::Shift, "s1", "org-1", vec![1.0, 0.0])])
        .await;
    assert!(matches!(result, Err(HrError::Store(_))));

    let filter = SearchFilter {
        organization_id: "org-1",
        document_types: None,
    };
    assert!(store.search(&[1.0], 3, &filter).await.is_err());
}

#[tokio::test]
async fn search_ranks_by_cosine_similarity_and_filters() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .upsert(&[
            record(DocumentType::Employee, "near", "org-1", vec![1.0, 0.1, 0.0, 0.0]),
            record(DocumentType::Employee, "far", "org-1", vec![0.0, 0.0, 1.0, 0.0]),
            record(DocumentType::Attendance, "mid", "org-1", vec![1.0, 1.0, 0.0, 0.0]),
            record(DocumentType::Employee, "other-org", "org-2", vec![1.0, 0.0, 0.0, 0.0]),
        ])
        .await
        .expect("should store embeddings");

    let filter = SearchFilter {
        organization_id: "org-1",
        document_types: None,
    };
    let results = store
        .search(&[1.0, 0.0, 0.0, 0.0], 10, &filter)
        .await
        .expect("should search");

    let ids: Vec<&str> = results
        .iter()
        .map(|r| r.metadata.document_id.as_str())
        .collect();
    assert_eq!(ids, vec!["near", "mid", "far"]);
    assert!(
        results
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score)
    );

    let employees_only = [DocumentType::Employee];
    let filter = SearchFilter {
        organization_id: "org-1",
        document_types: Some(&employees_only),
    };
    let results = store
        .search(&[1.0, 0.0, 0.0, 0.0], 1, &filter)
        .await
        .expect("should search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.document_id, "near");
    assert_eq!(results[0].metadata.document_type, DocumentType::Employee);
}

#[tokio::test]
async fn delete_by_id() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .upsert(&[
            record(DocumentType::Shift, "s1", "org-1", vec![1.0, 0.0, 0.0, 0.0]),
            record(DocumentType::Shift, "s2", "org-1", vec![0.0, 1.0, 0.0, 0.0]),
        ])
        .await
        .expect("should store embeddings");

    let id = EmbeddingRecord::vector_id(DocumentType::Shift, "s1");
    store.delete(&[id.as_str()]).await.expect("should delete");
    store
        .delete(&["SHIFT:unknown"])
        .await
        .expect("unknown ids are ignored");

    assert_eq!(
        store
            .count("org-1", Some(DocumentType::Shift))
            .await
            .expect("should count"),
        1
    );
}

#[tokio::test]
async fn dimension_mismatch_on_reopen() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("vectors");

    VectorStore::new(&path, DIMENSION)
        .await
        .expect("should create vector store");

    let reopened = VectorStore::new(&path, DIMENSION * 2).await;
    assert!(matches!(reopened, Err(HrError::Store(_))));

    let reset = VectorStore::open_and_reset(&path, DIMENSION * 2)
        .await
        .expect("should reset vector store");
    assert_eq!(reset.vector_dimension(), DIMENSION * 2);

    VectorStore::new(&path, DIMENSION * 2)
        .await
        .expect("reset table has the new dimension");
}

#[tokio::test]
async fn optimize_after_writes() {
    let (store, _temp_dir) = create_test_store().await;
    store
        .upsert(&[record(
            DocumentType::Employee,
            "e1",
            "org-1",
            vec![0.5, 0.5, 0.5, 0.5],
        )])
        .await
        .expect("should store embedding");

    store.optimize().await.expect("should optimize");
}
