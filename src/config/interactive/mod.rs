#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, GeminiConfig, OllamaConfig, ProviderKind, get_config_dir};

const PROVIDERS: [ProviderKind; 2] = [ProviderKind::Ollama, ProviderKind::Gemini];

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 HR Assist Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    let labels = ["Ollama (local)", "Gemini (hosted)"];
    let provider_index = Select::new()
        .with_prompt("Embedding and chat provider")
        .default(provider_index(config.provider))
        .items(&labels)
        .interact()?;
    config.provider = PROVIDERS[provider_index];

    eprintln!();
    match config.provider {
        ProviderKind::Ollama => {
            eprintln!("{}", style("Ollama Configuration").bold().yellow());
            eprintln!("Configure your local Ollama instance for embeddings and answers.");
            eprintln!();
            configure_ollama(&mut config.ollama)?;
        }
        ProviderKind::Gemini => {
            eprintln!("{}", style("Gemini Configuration").bold().yellow());
            eprintln!("The API key is read from an environment variable, never stored.");
            eprintln!();
            configure_gemini(&mut config.gemini)?;
        }
    }

    let previous_dimension = config.indexing.embedding_dimension;
    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension of the chosen model")
        .default(config.indexing.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;
    config.indexing.set_embedding_dimension(dimension)?;
    if dimension != previous_dimension {
        eprintln!(
            "{}",
            style("⚠ Existing embeddings use a different dimension.").yellow()
        );
        eprintln!("Run 'hr-assist reset' and then reindex every organization.");
    }

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_provider_connection(&config) {
        eprintln!("{}", style("✓ Provider reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the provider").yellow()
        );
        eprintln!("You can continue, but make sure it is available before reindexing.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load(get_config_dir()?).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();
    eprintln!("  Provider: {}", style(config.provider).cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    match config.ollama.ollama_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!(
        "  Embedding Model: {}",
        style(&config.ollama.embedding_model).cyan()
    );
    eprintln!(
        "  Generation Model: {}",
        style(&config.ollama.generation_model).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Gemini Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.gemini.base_url).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.gemini.embedding_model).cyan()
    );
    eprintln!(
        "  Generation Model: {}",
        style(&config.gemini.generation_model).cyan()
    );
    let key_state = if config.gemini.api_key().is_some() {
        style("set").green()
    } else {
        style("not set").red()
    };
    eprintln!(
        "  API Key: ${} ({})",
        style(&config.gemini.api_key_env).cyan(),
        key_state
    );

    eprintln!();
    eprintln!("{}", style("Indexing:").bold().yellow());
    eprintln!("  Page Size: {}", style(config.indexing.page_size).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.indexing.embedding_dimension).cyan()
    );
    eprintln!(
        "  Max Embedding Tokens: {}",
        style(config.indexing.max_embedding_tokens).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Chat:").bold().yellow());
    eprintln!("  Top K: {}", style(config.chat.top_k).cyan());
    eprintln!(
        "  Min Similarity: {}",
        style(config.chat.min_similarity).cyan()
    );
    eprintln!(
        "  History Turns: {}",
        style(config.chat.max_history_turns).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn provider_index(kind: ProviderKind) -> usize {
    PROVIDERS.iter().position(|&p| p == kind).unwrap_or(0)
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_model = prompt_model("Embedding model", &ollama.embedding_model)?;
    let generation_model = prompt_model("Chat model", &ollama.generation_model)?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_embedding_model(embedding_model)?;
    ollama.set_generation_model(generation_model)?;

    Ok(())
}

fn configure_gemini(gemini: &mut GeminiConfig) -> Result<()> {
    let embedding_model = prompt_model("Embedding model", &gemini.embedding_model)?;
    let generation_model = prompt_model("Chat model", &gemini.generation_model)?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(gemini.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Variable name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    gemini.embedding_model = embedding_model;
    gemini.generation_model = generation_model;
    gemini.api_key_env = api_key_env;
    gemini.validate()?;

    Ok(())
}

fn prompt_model(prompt: &str, current: &str) -> Result<String> {
    let model: String = Input::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(model)
}

fn test_provider_connection(config: &Config) -> bool {
    match config.provider {
        ProviderKind::Ollama => test_ollama_connection(&config.ollama),
        ProviderKind::Gemini => config.gemini.api_key().is_some(),
    }
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
