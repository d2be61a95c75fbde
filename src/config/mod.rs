// Configuration management module
// TOML settings plus the interactive setup flow

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    API_KEY_ENV, CompletionConfig, Config, ConfigError, EmbeddingConfig, RetrievalConfig,
    ServerConfig,
};
