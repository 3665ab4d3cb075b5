use super::*;

fn config() -> OllamaConfig {
    OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        embedding_model: "test-embed".to_string(),
        generation_model: "test-chat".to_string(),
    }
}

#[test]
fn client_configuration() {
    let client = OllamaClient::new(&config(), Duration::from_secs(5), 512)
        .expect("Failed to create client");

    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.generation_model, "test-chat");
    assert_eq!(client.max_input_tokens, 512);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
}

#[test]
fn default_config_targets_local_ollama() {
    let client = OllamaClient::new(&OllamaConfig::default(), Duration::from_secs(1), 2000)
        .expect("Failed to create client");

    assert_eq!(client.base_url.as_str(), "http://localhost:11434/");
}

#[test]
fn invalid_host_is_rejected() {
    let config = OllamaConfig {
        host: String::new(),
        ..config()
    };
    assert!(OllamaClient::new(&config, Duration::from_secs(5), 512).is_err());
}

#[test]
fn request_bodies_match_ollama_api() {
    let embed = serde_json::to_value(EmbedRequest {
        model: "m",
        input: "hello",
    })
    .expect("can serialize");
    assert_eq!(embed, serde_json::json!({"model": "m", "input": "hello"}));

    let generate = serde_json::to_value(GenerateRequest {
        model: "m",
        prompt: "p",
        system: "s",
        stream: false,
    })
    .expect("can serialize");
    assert_eq!(
        generate,
        serde_json::json!({"model": "m", "prompt": "p", "system": "s", "stream": false})
    );
}

#[tokio::test]
async fn empty_text_fails_without_network() {
    let client = OllamaClient::new(&config(), Duration::from_secs(1), 512)
        .expect("Failed to create client");

    let result = client.embed("  ").await;
    assert!(matches!(result, Err(HrError::EmbeddingProvider(_))));
}

#[tokio::test]
async fn unreachable_server_maps_to_provider_errors() {
    let config = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..config()
    };
    let client =
        OllamaClient::new(&config, Duration::from_secs(2), 512).expect("Failed to create client");

    assert!(matches!(
        client.embed("Budi").await,
        Err(HrError::EmbeddingProvider(_))
    ));
    assert!(matches!(
        client.generate("question", "system").await,
        Err(HrError::Generation(_))
    ));
}
