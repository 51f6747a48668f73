use super::*;
use crate::config::GenAiConfig;

fn test_config() -> GenAiConfig {
    GenAiConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        api_key: Some("test-key".to_string()),
        embedding_model: "embed-model".to_string(),
        generation_model: "gen-model".to_string(),
        embedding_dimension: 768,
    }
}

#[test]
fn client_configuration() {
    let client = GenerativeClient::new(&test_config()).expect("Failed to create client");

    assert_eq!(client.embedding_model, "embed-model");
    assert_eq!(client.generation_model, "gen-model");
    assert_eq!(client.embedding_dimension, 768);
    assert_eq!(client.api_key.as_deref(), Some("test-key"));
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let client = GenerativeClient::new(&test_config())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(1);

    assert_eq!(client.retry_attempts, 1);
}

#[test]
fn embedding_url_includes_model_and_operation() {
    let client = GenerativeClient::new(&test_config()).expect("Failed to create client");
    let url = client
        .base_url
        .join(&format!(
            "/v1beta/models/{}:embedContent",
            client.embedding_model
        ))
        .expect("Failed to join URL");

    assert_eq!(
        url.as_str(),
        "http://test-host:1234/v1beta/models/embed-model:embedContent"
    );
}

#[test]
fn generation_response_parses_multiple_parts() {
    let raw = r#"{
        "candidates": [
            {"content": {"parts": [{"text": "{\"justification\": \"x\", "}, {"text": "\"where\": \"cost < 10\"}"}]}}
        ]
    }"#;
    let parsed: GenerateResponse = serde_json::from_str(raw).expect("Failed to parse");
    let text: String = parsed.candidates[0]
        .content
        .parts
        .iter()
        .map(|p| p.text.clone())
        .collect();
    assert_eq!(text, "{\"justification\": \"x\", \"where\": \"cost < 10\"}");
}
