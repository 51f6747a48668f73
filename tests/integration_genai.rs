#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Model-endpoint contract tests against a mocked HTTP server.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lyla_retrieval::RetrievalError;
use lyla_retrieval::config::GenAiConfig;
use lyla_retrieval::embeddings::{Embedder, GenAiEmbedder};
use lyla_retrieval::filter::{FilterCompiler, LlmFilterCompiler};
use lyla_retrieval::genai::GenerativeClient;
use lyla_retrieval::schema::activities_schema;

const TEST_DIMENSION: usize = 8;

fn config_for(server: &MockServer) -> GenAiConfig {
    let uri = url::Url::parse(&server.uri()).expect("Mock server URI should parse");

    GenAiConfig {
        protocol: "http".to_string(),
        host: uri.host_str().expect("Mock server has a host").to_string(),
        port: uri.port().expect("Mock server has a port"),
        api_key: Some("test-key".to_string()),
        embedding_model: "text-embedding-005".to_string(),
        generation_model: "gemini-2.5-flash".to_string(),
        embedding_dimension: TEST_DIMENSION as u32,
    }
}

fn client_for(server: &MockServer) -> GenerativeClient {
    GenerativeClient::new(&config_for(server))
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1)
}

#[tokio::test]
async fn embedding_round_trip() {
    let server = MockServer::start().await;
    let values: Vec<f32> = (0..TEST_DIMENSION).map(|i| i as f32 * 0.1).collect();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/text-embedding-005:embedContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("family adventure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": { "values": values }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = GenAiEmbedder::new(client_for(&server));
    let vector = embedder
        .embed("family adventure")
        .await
        .expect("Embedding should succeed");

    assert_eq!(vector.len(), TEST_DIMENSION);
    assert!((vector[1] - 0.1).abs() < 1e-6);
}

#[tokio::test]
async fn wrong_dimension_is_a_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/text-embedding-005:embedContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": { "values": [0.1, 0.2] }
        })))
        .mount(&server)
        .await;

    let embedder = GenAiEmbedder::new(client_for(&server));
    let result = embedder.embed("adventure").await;

    assert!(matches!(result, Err(RetrievalError::Embedding(_))));
}

#[tokio::test]
async fn server_error_surfaces_as_embedding_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/text-embedding-005:embedContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let embedder = GenAiEmbedder::new(client_for(&server));
    let result = embedder.embed("adventure").await;

    assert!(matches!(result, Err(RetrievalError::Embedding(_))));
}

#[tokio::test]
async fn predicate_compilation_round_trip_with_fenced_json() {
    let server = MockServer::start().await;
    let fenced = "```json\n{\"justification\": \"duration_max bounds the trip length\", \
                  \"where\": \"duration_max <= 960 AND cost < 1000\"}\n```";

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_string_contains("duration_max"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": fenced } ] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let compiler = LlmFilterCompiler::new(client_for(&server));
    let predicate = compiler
        .compile(
            &[
                "duration_max <= 960".to_string(),
                "cost < 1000".to_string(),
            ],
            activities_schema(),
        )
        .await
        .expect("Compilation should succeed");

    assert_eq!(
        predicate.as_deref(),
        Some("duration_max <= 960 AND cost < 1000")
    );
}

#[tokio::test]
async fn non_json_model_output_is_a_compilation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "the clause is cost < 1000" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let compiler = LlmFilterCompiler::new(client_for(&server));
    let result = compiler
        .compile(&["cost < 1000".to_string()], activities_schema())
        .await;

    assert!(matches!(result, Err(RetrievalError::Compilation(_))));
}

#[tokio::test]
async fn predicate_with_unknown_column_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text":
                    "{\"justification\": \"guess\", \"where\": \"price < 1000\"}" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let compiler = LlmFilterCompiler::new(client_for(&server));
    let result = compiler
        .compile(&["cost < 1000".to_string()], activities_schema())
        .await;

    assert!(matches!(result, Err(RetrievalError::Compilation(_))));
}
