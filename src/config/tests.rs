use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let original_config = Config {
            provider: ProviderKind::Ollama,
            ollama: OllamaConfig {
                protocol: "https".to_string(),
                host: "test-host".to_string(),
                port: 8080,
                embedding_model: "test-embed".to_string(),
                generation_model: "test-chat".to_string(),
            },
            ..Config::default()
        };

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let result: Result<Config, toml::de::Error> = toml::from_str(r#"provider = "openai""#);
        assert!(result.is_err());
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            provider = "gemini"

            [ollama]
            protocol = "http"
            host = "localhost"
            port = 11434
            embedding_model = "nomic-embed-text:latest"
            generation_model = "llama3.1:8b"

            [gemini]
            base_url = "https://generativelanguage.googleapis.com"
            embedding_model = "text-embedding-004"
            generation_model = "gemini-2.0-flash"
            api_key_env = "MY_GEMINI_KEY"

            [indexing]
            page_size = 25
            embedding_dimension = 768
            max_embedding_tokens = 1024
            request_timeout_secs = 30

            [chat]
            top_k = 5
            min_similarity = 0.25
            max_history_turns = 3
            max_context_chars = 8000
            attendance_window_days = 14
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse valid toml");
        assert!(config.validate().is_ok());
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.gemini.api_key_env, "MY_GEMINI_KEY");
        assert_eq!(config.indexing.page_size, 25);
        assert_eq!(config.chat.attendance_window_days, 14);
    }
}
