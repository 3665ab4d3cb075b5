use super::load_existing_config as load_existing_config_impl;
use super::*;

#[test]
fn load_existing_config() {
    let config = load_existing_config_impl().expect("config loaded successfully");
    assert!(!config.ollama.host.is_empty());
    assert!(config.ollama.port > 0);
    assert!(!config.ollama.embedding_model.is_empty());
    assert!(config.indexing.page_size > 0);
}

#[test]
fn provider_selection_index() {
    assert_eq!(provider_index(ProviderKind::Ollama), 0);
    assert_eq!(provider_index(ProviderKind::Gemini), 1);
}

#[test]
fn unreachable_ollama_reports_failure() {
    let ollama = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..OllamaConfig::default()
    };
    assert!(!test_ollama_connection(&ollama));
}
