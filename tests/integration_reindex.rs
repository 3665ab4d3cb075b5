#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end reindexing of a seeded organization with in-process providers

use async_trait::async_trait;
use chrono::NaiveDate;
use hr_assist::chat::TextGenerator;
use hr_assist::config::Config;
use hr_assist::database::Database;
use hr_assist::database::lancedb::vector_store::VectorStore;
use hr_assist::database::sqlite::models::{DocumentFilter, DocumentType, EmployeeUpdate};
use hr_assist::database::sqlite::queries::{EmbeddingQueries, EmployeeQueries};
use hr_assist::embeddings::{Embedder, Providers};
use hr_assist::seed::{SeedOptions, seed_demo};
use hr_assist::{HrAssistant, HrError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const DIMENSION: usize = 8;

/// Deterministic bag-of-bytes embedding; fails on the listed call numbers
struct FakeEmbedder {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl FakeEmbedder {
    fn new(fail_on: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> hr_assist::Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(HrError::EmbeddingProvider("connection reset".to_string()));
        }

        let mut vector = vec![0.0f32; DIMENSION];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % DIMENSION] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }
}

struct SilentGenerator;

#[async_trait]
impl TextGenerator for SilentGenerator {
    async fn generate(&self, _prompt: &str, _system: &str) -> hr_assist::Result<String> {
        Ok(String::new())
    }
}

struct Setup {
    _temp_dir: TempDir,
    assistant: HrAssistant,
}

async fn setup(days: u32, fail_on: Vec<usize>) -> Setup {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.indexing.embedding_dimension = DIMENSION as u32;

    let database = Database::initialize_from_config_dir(temp_dir.path())
        .await
        .expect("should create database");
    let vector_store = VectorStore::new(&config.vector_database_path(), DIMENSION)
        .await
        .expect("should create vector store");

    seed_demo(
        &database,
        &SeedOptions {
            days,
            ..SeedOptions::demo(NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date"))
        },
    )
    .await
    .expect("should seed demo data");

    let providers = Providers {
        embedder: Arc::new(FakeEmbedder::new(fail_on)),
        generator: Arc::new(SilentGenerator),
    };

    Setup {
        _temp_dir: temp_dir,
        assistant: HrAssistant::with_components(config, database, vector_store, providers),
    }
}

async fn employee_ids(assistant: &HrAssistant) -> Vec<String> {
    let organization = assistant
        .resolve_organization("demo-company")
        .await
        .expect("demo organization exists");
    let mut ids: Vec<String> =
        EmployeeQueries::list_by_organization(assistant.database().pool(), &organization.id)
            .await
            .expect("should list employees")
            .into_iter()
            .map(|e| e.id)
            .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn demo_company_employees_reach_full_coverage() {
    let setup = setup(0, Vec::new()).await;

    let summary = setup
        .assistant
        .reindex(
            "demo-company",
            Some(DocumentType::Employee),
            &DocumentFilter::default(),
            |_| {},
        )
        .await
        .expect("should reindex");

    assert_eq!(summary.success, 3);
    assert_eq!(summary.failed, 0);

    let stats = setup
        .assistant
        .embedding_stats("demo-company", Some(DocumentType::Employee))
        .await
        .expect("should compute coverage");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_documents, 3);
    assert!((stats[0].coverage_percent - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn failure_on_second_document_is_isolated() {
    let setup = setup(0, vec![2]).await;

    let summary = setup
        .assistant
        .reindex(
            "demo-company",
            Some(DocumentType::Employee),
            &DocumentFilter::default(),
            |_| {},
        )
        .await
        .expect("should reindex");

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);

    let ids = employee_ids(&setup.assistant).await;
    assert_eq!(summary.failures[0].document_id, ids[1]);

    let store = setup.assistant.store();
    for (index, id) in ids.iter().enumerate() {
        let stored = store
            .get(DocumentType::Employee, id)
            .await
            .expect("should query ledger");
        assert_eq!(stored.is_some(), index != 1, "employee {}", index + 1);
    }

    let stats = setup
        .assistant
        .embedding_stats("demo-company", Some(DocumentType::Employee))
        .await
        .expect("should compute coverage");
    assert_eq!(stats[0].up_to_date, 2);
    assert_eq!(stats[0].needs_indexing, 1);
}

#[tokio::test]
async fn repeated_reindex_does_not_duplicate() {
    let setup = setup(2, Vec::new()).await;

    for _ in 0..2 {
        let summary = setup
            .assistant
            .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
            .await
            .expect("should reindex");
        assert_eq!(summary.success, 15);
        assert_eq!(summary.failed, 0);
    }

    let organization = setup
        .assistant
        .resolve_organization("demo-company")
        .await
        .expect("demo organization exists");
    let store = setup.assistant.store();
    for (document_type, expected) in [
        (DocumentType::Employee, 3),
        (DocumentType::Attendance, 6),
        (DocumentType::Shift, 6),
    ] {
        assert_eq!(
            store
                .count_by_type(document_type, &organization.id)
                .await
                .expect("should count ledger"),
            expected
        );
        assert_eq!(
            store
                .vector_store()
                .count(&organization.id, Some(document_type))
                .await
                .expect("should count vectors"),
            expected
        );
    }
}

#[tokio::test]
async fn stale_only_reindex_picks_up_changed_records() {
    let setup = setup(0, Vec::new()).await;
    let assistant = &setup.assistant;

    assistant
        .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
        .await
        .expect("should reindex");

    let ids = employee_ids(assistant).await;
    EmployeeQueries::update(
        assistant.database().pool(),
        &ids[0],
        EmployeeUpdate {
            position: Some("Engineering Manager".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("should update employee");
    sqlx::query("UPDATE employees SET updated_at = '2999-01-01 00:00:00' WHERE id = ?")
        .bind(&ids[0])
        .execute(assistant.database().pool())
        .await
        .expect("should touch employee");

    let stats = assistant
        .embedding_stats("demo-company", Some(DocumentType::Employee))
        .await
        .expect("should compute coverage");
    assert_eq!(stats[0].needs_indexing, 1);

    let mut progress = Vec::new();
    let summary = assistant
        .reindex(
            "demo-company",
            None,
            &DocumentFilter {
                stale_only: true,
                ..Default::default()
            },
            |p| progress.push((p.document_type, p.document_id)),
        )
        .await
        .expect("should reindex stale documents");

    assert_eq!(summary.success, 1);
    assert_eq!(progress, vec![(DocumentType::Employee, ids[0].clone())]);

    let entry = assistant
        .store()
        .get(DocumentType::Employee, &ids[0])
        .await
        .expect("should query ledger")
        .expect("embedding exists");
    assert!(entry.content.contains("Position: Engineering Manager"));
}

#[tokio::test]
async fn deleted_employee_embeddings_are_purged() {
    let setup = setup(2, Vec::new()).await;
    let assistant = &setup.assistant;

    assistant
        .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
        .await
        .expect("should reindex");

    let ids = employee_ids(assistant).await;
    EmployeeQueries::delete(assistant.database().pool(), &ids[2])
        .await
        .expect("should delete employee");

    let stats = assistant
        .embedding_stats("demo-company", None)
        .await
        .expect("should compute coverage");
    let orphaned: Vec<u64> = stats.iter().map(|s| s.orphaned).collect();
    assert_eq!(orphaned, vec![1, 2, 2]);

    let purged = assistant
        .purge_orphans("demo-company", None)
        .await
        .expect("should purge");
    assert_eq!(purged, 5);

    let organization = assistant
        .resolve_organization("demo-company")
        .await
        .expect("demo organization exists");
    let remaining = EmbeddingQueries::list_by_type(
        assistant.database().pool(),
        DocumentType::Employee,
        &organization.id,
    )
    .await
    .expect("should list embeddings");
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|e| e.document_id != ids[2]));
}

#[tokio::test]
async fn unknown_organization_is_not_found() {
    let setup = setup(0, Vec::new()).await;

    let result = setup
        .assistant
        .reindex("no-such-company", None, &DocumentFilter::default(), |_| {})
        .await;

    assert!(matches!(
        result,
        Err(HrError::NotFound {
            entity: "Organization",
            ..
        })
    ));
}

#[tokio::test]
async fn storage_only_assistant_reports_and_purges() {
    let setup = setup(1, Vec::new()).await;
    setup
        .assistant
        .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
        .await
        .expect("should reindex");

    let storage = HrAssistant::open_storage(setup.assistant.config().clone())
        .await
        .expect("should open stores without providers");

    let stats = storage
        .embedding_stats("demo-company", None)
        .await
        .expect("should compute coverage");
    assert_eq!(stats.len(), 3);
    assert!(stats.iter().all(|s| s.is_complete()));

    let purged = storage
        .purge_orphans("demo-company", None)
        .await
        .expect("should purge");
    assert_eq!(purged, 0);

    let reindex = storage
        .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
        .await;
    assert!(matches!(reindex, Err(HrError::Config(_))));
    assert!(matches!(
        storage.chat("demo-company", "Berapa karyawan?", &[]).await,
        Err(HrError::Config(_))
    ));
}

#[tokio::test]
async fn dimension_change_is_recovered_by_reset() {
    let setup = setup(2, Vec::new()).await;
    setup
        .assistant
        .reindex("demo-company", None, &DocumentFilter::default(), |_| {})
        .await
        .expect("should reindex");

    let mut config = setup.assistant.config().clone();
    config.indexing.embedding_dimension = 16;

    let reopened = HrAssistant::open_storage(config.clone()).await;
    assert!(matches!(reopened, Err(HrError::Store(_))));

    let (assistant, cleared) = HrAssistant::open_and_reset(config.clone())
        .await
        .expect("should reset");
    assert_eq!(cleared, 15);

    let stats = assistant
        .embedding_stats("demo-company", None)
        .await
        .expect("should compute coverage");
    for stats in &stats {
        assert_eq!(stats.total_embeddings, 0, "{}", stats.document_type);
        assert_eq!(stats.up_to_date, 0);
        assert_eq!(stats.needs_indexing, stats.total_documents);
        assert!(stats.coverage_percent.abs() < f64::EPSILON);
    }

    let organization = assistant
        .resolve_organization("demo-company")
        .await
        .expect("demo organization exists");
    assert_eq!(
        assistant
            .store()
            .vector_store()
            .count(&organization.id, None)
            .await
            .expect("should count vectors"),
        0
    );
    assert_eq!(assistant.store().vector_store().vector_dimension(), 16);

    let stale = EmbeddingQueries::list_by_type(
        assistant.database().pool(),
        DocumentType::Employee,
        &organization.id,
    )
    .await
    .expect("should list embeddings");
    assert!(stale.is_empty());

    HrAssistant::open_storage(config)
        .await
        .expect("reset table matches the configured dimension");
}
