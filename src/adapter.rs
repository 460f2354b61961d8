//! Credential lookup and construction of a model client bound to session settings.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::SessionConfig;
use crate::client::{API_KEY_ENV, BASE_URL_ENV, Completions, Groq};
use crate::client_logger::ClientLogger;
use crate::stream::TextStream;
use crate::types::{ChatCompletionRequest, Message, Model, Temperature};
use crate::{Error, Result};

/// Hands out clients bound to the current session settings.
///
/// `get_client` is called once per exchange.  It must be cheap and must not touch the
/// network; a missing credential is reported as [`Error::Configuration`].
pub trait ClientProvider: Send + Sync {
    /// The completion backend the bound client talks to.
    type Client: Completions;

    /// Returns a client bound to `config`'s model and temperature.
    fn get_client(&self, config: &SessionConfig) -> Result<ChatModel<Self::Client>>;
}

/// A completion backend bound to one model and temperature.
#[derive(Debug, Clone)]
pub struct ChatModel<C> {
    client: C,
    model: Model,
    temperature: Temperature,
    max_tokens: Option<u32>,
}

impl<C: Completions> ChatModel<C> {
    /// Binds `client` to `config`'s model and temperature.
    pub fn new(client: C, config: &SessionConfig) -> Self {
        Self {
            client,
            model: config.model(),
            temperature: config.temperature(),
            max_tokens: None,
        }
    }

    /// Caps reply length.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The bound model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// The bound temperature.
    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// The request that [`ChatModel::stream`] would send for `messages`.
    pub fn request(&self, messages: Vec<Message>) -> ChatCompletionRequest {
        ChatCompletionRequest::new(self.model, messages, self.temperature)
            .with_max_tokens(self.max_tokens)
            .streaming()
    }

    /// Streams a reply to `messages`.
    pub async fn stream(&self, messages: Vec<Message>) -> Result<TextStream> {
        let chunks = self.client.stream_chat(self.request(messages)).await?;
        Ok(TextStream::new(chunks))
    }
}

/// The production [`ClientProvider`]: reads the key from the environment and talks to
/// Groq.
#[derive(Clone, Default)]
pub struct CompletionAdapter {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_tokens: Option<u32>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl CompletionAdapter {
    /// Reads `GROQ_API_KEY` and `GROQ_BASE_URL` from the environment.
    ///
    /// A missing key is not an error here; it is reported by every call to
    /// [`ClientProvider::get_client`] so that the session stays usable.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()),
            base_url: env::var(BASE_URL_ENV).ok().filter(|url| !url.trim().is_empty()),
            ..Self::default()
        }
    }

    /// An adapter with an explicit key (or none).
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// Overrides the base URL.  `None` keeps the current one.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps reply length for every bound client.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Attaches a logger to every client handed out.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// True if a credential is available.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ClientProvider for CompletionAdapter {
    type Client = Groq;

    fn get_client(&self, config: &SessionConfig) -> Result<ChatModel<Groq>> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(Error::configuration(format!(
                "API key not found. Please set {API_KEY_ENV} in your environment."
            )));
        };
        let mut client = Groq::with_options(Some(api_key), self.base_url.clone(), self.timeout)?;
        if let Some(logger) = &self.logger {
            client = client.with_logger(Arc::clone(logger));
        }
        Ok(ChatModel::new(client, config).with_max_tokens(self.max_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_configuration_error() {
        let adapter = CompletionAdapter::with_api_key(None);
        assert!(!adapter.has_credential());
        let err = adapter.get_client(&SessionConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn client_is_bound_to_config() {
        let adapter = CompletionAdapter::with_api_key(Some("gsk_test".to_string()))
            .with_max_tokens(Some(512));
        let mut config = SessionConfig::default();
        config.set_model(Model::Llama31Instant);
        config.set_temperature(0.3);

        let model = adapter.get_client(&config).unwrap();
        assert_eq!(model.model(), Model::Llama31Instant);
        assert_eq!(model.temperature().value(), 0.3);

        let request = model.request(vec![Message::user("hi")]);
        assert_eq!(request.model, Model::Llama31Instant);
        assert_eq!(request.max_tokens, Some(512));
        assert!(request.stream);
    }

    #[test]
    fn later_config_changes_do_not_rebind() {
        let adapter = CompletionAdapter::with_api_key(Some("gsk_test".to_string()));
        let mut config = SessionConfig::default();
        let model = adapter.get_client(&config).unwrap();
        config.set_model(Model::Llama31Instant);
        assert_eq!(model.model(), Model::Llama33Versatile);
    }

    #[test]
    fn invalid_base_url_surfaces() {
        let adapter = CompletionAdapter::with_api_key(Some("gsk_test".to_string()))
            .with_base_url(Some("::::".to_string()));
        assert!(adapter.get_client(&SessionConfig::default()).is_err());
    }
}
