// Configuration management module
// TOML settings for providers, indexing and chat retrieval

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ChatConfig, Config, ConfigError, GeminiConfig, IndexingConfig, OllamaConfig, ProviderKind,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}

/// Load the configuration from the default directory
#[inline]
pub fn load_default() -> anyhow::Result<Config> {
    Config::load(get_config_dir()?)
}
