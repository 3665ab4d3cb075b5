use super::*;

#[test]
fn token_estimate_counts_words_and_punctuation() {
    assert_eq!(estimate_token_count(""), 0);
    assert_eq!(estimate_token_count("one two three"), 4);
    assert!(estimate_token_count("Salary: Rp 15.000.000.") > estimate_token_count("Salary Rp"));
}

#[test]
fn short_text_is_not_truncated() {
    let text = "Budi Santoso works in Engineering.";
    assert_eq!(truncate_to_token_budget(text, 100), text);
}

#[test]
fn long_text_is_truncated_at_word_boundary() {
    let text = "word ".repeat(1000);
    let truncated = truncate_to_token_budget(&text, 30);

    assert!(estimate_token_count(&truncated) <= 30);
    assert!(!truncated.is_empty());
    assert!(truncated.split_whitespace().all(|w| w == "word"));
    assert!(!truncated.ends_with(' '));
}

#[test]
fn truncation_handles_multibyte_text() {
    let text = "Karyawan tetap — gaji pokok Rp 9.000.000 ".repeat(200);
    let truncated = truncate_to_token_budget(&text, 50);
    assert!(estimate_token_count(&truncated) <= 50);
    assert!(text.starts_with(&truncated));
}

#[test]
fn empty_text_is_not_embeddable() {
    assert!(matches!(
        ensure_embeddable("   \n"),
        Err(HrError::EmbeddingProvider(_))
    ));
    assert!(ensure_embeddable("Employee").is_ok());
}

#[test]
fn gemini_without_api_key_is_a_config_error() {
    let config = Config {
        provider: ProviderKind::Gemini,
        gemini: crate::config::GeminiConfig {
            api_key_env: "HR_ASSIST_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..crate::config::GeminiConfig::default()
        },
        ..Config::default()
    };

    assert!(matches!(build_providers(&config), Err(HrError::Config(_))));
}

#[test]
fn ollama_providers_build_without_network() {
    let config = Config::default();
    assert!(build_providers(&config).is_ok());
}
