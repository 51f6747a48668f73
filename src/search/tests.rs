use super::*;
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

const TEST_SCRIPT: &str = "
CREATE TABLE activities (
    activity_id VARCHAR(50) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    duration_min INT,
    duration_max INT,
    kid_friendliness_score INT,
    cost INT,
    description TEXT
);
INSERT INTO activities VALUES
    ('act-001', 'Tower Tour', 60, 120, 8, 35, 'Guided tour'),
    ('act-002', 'River Cruise', 45, 90, 6, 25, 'Boat trip'),
    ('act-003', 'Theatre Night', 120, 180, 2, 95, 'West End show');
";

#[derive(Default)]
struct FailingEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _query: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RetrievalError::Embedding("transport error".to_string()))
    }
}

struct StubCompiler {
    predicate: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubCompiler {
    fn returning(predicate: Option<&str>) -> Self {
        Self {
            predicate: predicate.map(str::to_string),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            predicate: None,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FilterCompiler for StubCompiler {
    async fn compile(&self, _constraints: &[String], _schema: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RetrievalError::Compilation(
                "malformed compiler response".to_string(),
            ));
        }
        Ok(self.predicate.clone())
    }
}

struct TestPipeline {
    pipeline: SearchPipeline,
    embedder: Arc<FailingEmbedder>,
    compiler: Arc<StubCompiler>,
    _script: NamedTempFile,
}

fn pipeline_with(compiler: StubCompiler) -> TestPipeline {
    let mut script = NamedTempFile::new().expect("Failed to create temp file");
    script
        .write_all(TEST_SCRIPT.as_bytes())
        .expect("Failed to write script");

    let mut config = Config::default();
    config.bootstrap_script = script.path().to_path_buf();

    let embedder = Arc::new(FailingEmbedder::default());
    let compiler = Arc::new(compiler);
    let connections = Arc::new(ConnectionManager::new(&config));
    let pipeline = SearchPipeline::new(
        embedder.clone(),
        compiler.clone(),
        connections,
        &config,
    );

    TestPipeline {
        pipeline,
        embedder,
        compiler,
        _script: script,
    }
}

#[tokio::test]
async fn empty_semantic_query_never_reaches_the_embedder() {
    let t = pipeline_with(StubCompiler::returning(None));

    let activities = t
        .pipeline
        .find_activities("", &[])
        .await
        .expect("Search should succeed");

    assert_eq!(t.embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(t.compiler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(activities.len(), 3);
}

#[tokio::test]
async fn whitespace_semantic_query_is_treated_as_empty() {
    let t = pipeline_with(StubCompiler::returning(None));

    t.pipeline
        .find_activities("   ", &[])
        .await
        .expect("Search should succeed");

    assert_eq!(t.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedding_failure_degrades_to_unranked_results() {
    let t = pipeline_with(StubCompiler::returning(None));

    let activities = t
        .pipeline
        .find_activities("adventure", &[])
        .await
        .expect("Search should succeed despite embedding failure");

    assert_eq!(t.embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(activities.len(), 3);
}

#[tokio::test]
async fn compilation_failure_degrades_to_unfiltered_results() {
    let t = pipeline_with(StubCompiler::failing());

    let activities = t
        .pipeline
        .find_activities("", &["cost < 30".to_string()])
        .await
        .expect("Search should succeed despite compilation failure");

    assert_eq!(t.compiler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(activities.len(), 3);
}

#[tokio::test]
async fn compiled_predicate_filters_results() {
    let t = pipeline_with(StubCompiler::returning(Some("cost < 30")));

    let activities = t
        .pipeline
        .find_activities("", &["cost < 30".to_string()])
        .await
        .expect("Search should succeed");

    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].activity_id, "act-002");
}

#[test]
fn response_from_success_carries_activities_only() {
    let response = SearchResponse::from(Ok(Vec::new()));
    assert_eq!(response.activities, Some(Vec::new()));
    assert!(response.error_message.is_none());
}

#[test]
fn response_from_error_carries_message_only() {
    let response = SearchResponse::from(Err(RetrievalError::Query(
        "Database error: syntax error".to_string(),
    )));
    assert!(response.activities.is_none());
    assert_eq!(
        response.error_message.as_deref(),
        Some("Query failure: Database error: syntax error")
    );
}
