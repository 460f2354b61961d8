//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::adapter::CompletionAdapter;
use crate::chat::SessionConfig;
use crate::chat::commands::parse_f32_in_range;
use crate::types::{Model, Temperature};
use crate::{Error, Result};

/// Command-line arguments for the groqchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: llama-3.3-70b-versatile)", "MODEL")]
    pub model: Option<String>,

    /// Persona for the conversation.
    #[arrrg(optional, "Persona (system prompt) for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Sampling temperature, validated when resolved into a [`ChatConfig`].
    #[arrrg(optional, "Sampling temperature 0.0-1.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: server limit)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Alternate API base URL.
    #[arrrg(optional, "API base URL (default: $GROQ_BASE_URL or Groq)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// Directory that /export writes into.
    #[arrrg(optional, "Directory for /export (default: current directory)", "DIR")]
    pub export_dir: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model selected at start-up.
    pub model: Model,

    /// Persona override; the default persona applies when unset.
    pub system_prompt: Option<String>,

    /// Sampling temperature selected at start-up.
    pub temperature: Temperature,

    /// Maximum tokens per response; the server decides when unset.
    pub max_tokens: Option<u32>,

    /// Base URL override; `$GROQ_BASE_URL` or the public endpoint applies when unset.
    pub base_url: Option<String>,

    /// Request timeout override.
    pub timeout: Option<Duration>,

    /// Directory that `/export` writes into when no directory is given.
    pub export_dir: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: llama-3.3-70b-versatile
    /// - Temperature: 0.7
    /// - Export directory: the current directory
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_prompt: None,
            temperature: Temperature::default(),
            max_tokens: None,
            base_url: None,
            timeout: None,
            export_dir: PathBuf::from("."),
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the persona.
    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: impl Into<Temperature>) -> Self {
        self.temperature = temperature.into();
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Copies the start-up selections into a fresh session's settings.
    pub fn apply_to(&self, config: &mut SessionConfig) {
        config.set_model(self.model);
        config.set_temperature(self.temperature);
        if let Some(prompt) = &self.system_prompt {
            config.set_system_prompt(prompt.clone());
        }
    }

    /// The adapter for this configuration, reading credentials from the environment.
    pub fn adapter(&self) -> CompletionAdapter {
        CompletionAdapter::from_env()
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout)
            .with_max_tokens(self.max_tokens)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(model) = args.model {
            config.model = model.parse()?;
        }
        if let Some(value) = args.temperature {
            let value = parse_f32_in_range(value.trim(), Temperature::MIN, Temperature::MAX)
                .map_err(|err| {
                    Error::validation(
                        format!("--temperature {err}, got {value}"),
                        Some("temperature".to_string()),
                    )
                })?;
            config.temperature = Temperature::new(value);
        }
        if args.timeout == Some(0) {
            return Err(Error::validation(
                "--timeout must be at least one second",
                Some("timeout".to_string()),
            ));
        }
        config.system_prompt = args.system.filter(|prompt| !prompt.trim().is_empty());
        config.max_tokens = args.max_tokens;
        config.base_url = args.base_url;
        config.timeout = args.timeout.map(Duration::from_secs);
        if let Some(dir) = args.export_dir {
            config.export_dir = PathBuf::from(dir);
        }
        config.use_color = !args.no_color;
        Ok(config)
    }
}
