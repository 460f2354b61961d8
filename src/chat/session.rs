//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the session state and runs
//! one streamed exchange at a time against the completion backend.

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Duration;

use futures::StreamExt;

use crate::adapter::{ChatModel, ClientProvider, CompletionAdapter};
use crate::chat::export;
use crate::chat::{ConversationHistory, SessionConfig, SessionState, SessionStore};
use crate::client::Completions;
use crate::observability::{
    EXCHANGES_COMPLETED, EXCHANGES_FAILED, EXCHANGES_INTERRUPTED, EXCHANGES_UNCONFIGURED,
};
use crate::render::Renderer;
use crate::stream::Reply;
use crate::types::{Message, Model, Temperature, Usage};
use crate::{Error, Result};

/// A chat session that owns conversation state and drives exchanges.
///
/// History only ever grows by whole exchanges: a prompt and its reply are appended
/// together once the reply has been fully received, and a failed or interrupted exchange
/// leaves history exactly as it was.
pub struct ChatSession<P: ClientProvider = CompletionAdapter> {
    provider: P,
    state: SessionState,
    usage_totals: Usage,
    last_turn_usage: Option<Usage>,
    request_count: u64,
    failed_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The selected model.
    pub model: Model,
    /// The sampling temperature.
    pub temperature: Temperature,
    /// The persona sent with each request.
    pub system_prompt: String,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Total prompt tokens across all completed exchanges.
    pub total_prompt_tokens: u64,
    /// Total completion tokens across all completed exchanges.
    pub total_completion_tokens: u64,
    /// Total number of requests attempted.
    pub total_requests: u64,
    /// Requests that failed or were interrupted.
    pub failed_requests: u64,
    /// Prompt tokens for the last completed exchange, if reported.
    pub last_turn_prompt_tokens: Option<u64>,
    /// Completion tokens for the last completed exchange, if reported.
    pub last_turn_completion_tokens: Option<u64>,
}

impl<P: ClientProvider> ChatSession<P> {
    /// Starts a session with default settings.
    pub fn new(provider: P) -> Self {
        Self::from_store(provider, SessionStore::new())
    }

    /// Starts a session from `store`, initializing it if nothing has yet.
    pub fn from_store(provider: P, mut store: SessionStore) -> Self {
        store.initialize();
        Self {
            provider,
            state: store.into_state().unwrap_or_default(),
            usage_totals: Usage::default(),
            last_turn_usage: None,
            request_count: 0,
            failed_count: 0,
        }
    }

    /// Sends `prompt` and streams the reply through `renderer`.
    ///
    /// Returns `Ok(None)` without contacting the backend when the prompt is blank, and
    /// `Ok(Some(reply))` once the exchange has been appended to history.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no client can be bound, [`Error::Abort`] when
    /// the renderer asks to stop, and the transport error otherwise.  History is
    /// unchanged in every error case.
    pub async fn send_streaming(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }
        let outgoing = self
            .state
            .history
            .outgoing(self.state.config.system_prompt(), prompt);
        let model = match self.provider.get_client(&self.state.config) {
            Ok(model) => model,
            Err(err) => {
                EXCHANGES_UNCONFIGURED.click();
                return Err(err);
            }
        };

        self.request_count = self.request_count.saturating_add(1);
        match stream_reply(&model, outgoing, renderer).await {
            Ok(reply) => {
                if let Some(usage) = reply.usage {
                    self.last_turn_usage = Some(usage);
                    self.usage_totals = self.usage_totals + usage;
                }
                self.state.history.push_exchange(prompt, reply.text.clone());
                EXCHANGES_COMPLETED.click();
                Ok(Some(reply.text))
            }
            Err(err) => {
                self.failed_count = self.failed_count.saturating_add(1);
                if err.is_abort() {
                    EXCHANGES_INTERRUPTED.click();
                } else {
                    EXCHANGES_FAILED.click();
                }
                Err(err)
            }
        }
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.state.history.clear();
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.state.history.len()
    }

    /// The conversation so far.
    pub fn history(&self) -> &ConversationHistory {
        &self.state.history
    }

    /// The current settings.
    pub fn config(&self) -> &SessionConfig {
        &self.state.config
    }

    /// Everything the session owns.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) {
        self.state.config.set_model(model);
    }

    /// Returns the current model.
    pub fn model(&self) -> Model {
        self.state.config.model()
    }

    /// Sets the sampling temperature, clamped into range.
    pub fn set_temperature(&mut self, temperature: impl Into<Temperature>) {
        self.state.config.set_temperature(temperature);
    }

    /// Returns the current temperature.
    pub fn temperature(&self) -> Temperature {
        self.state.config.temperature()
    }

    /// Sets the persona, or restores the default one with `None`.
    ///
    /// Stored messages are untouched; the change applies from the next request.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        match prompt {
            Some(prompt) => self.state.config.set_system_prompt(prompt),
            None => self.state.config.reset_system_prompt(),
        }
    }

    /// Returns the current persona.
    pub fn system_prompt(&self) -> &str {
        self.state.config.system_prompt()
    }

    /// Writes the conversation to a dated export file inside `dir`.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        export::write_export(&self.state.history, dir)
    }

    /// Replaces the conversation with the export at `path`.
    ///
    /// Returns the number of messages loaded.  On error history is unchanged.
    pub fn import_from(&mut self, path: &Path) -> Result<usize> {
        let history = export::read_import(path)?;
        self.state.history = history;
        Ok(self.state.history.len())
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let config = &self.state.config;
        SessionStats {
            model: config.model(),
            temperature: config.temperature(),
            system_prompt: config.system_prompt().to_string(),
            message_count: self.message_count(),
            total_prompt_tokens: self.usage_totals.prompt_tokens,
            total_completion_tokens: self.usage_totals.completion_tokens,
            total_requests: self.request_count,
            failed_requests: self.failed_count,
            last_turn_prompt_tokens: self.last_turn_usage.map(|usage| usage.prompt_tokens),
            last_turn_completion_tokens: self
                .last_turn_usage
                .map(|usage| usage.completion_tokens),
        }
    }
}

/// How often a pending request or fragment checks the renderer's interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

async fn stream_reply<C: Completions>(
    model: &ChatModel<C>,
    messages: Vec<Message>,
    renderer: &mut dyn Renderer,
) -> Result<Reply> {
    let result = receive_reply(model, messages, renderer).await;
    if matches!(&result, Err(err) if err.is_abort()) {
        renderer.print_interrupted();
    }
    result
}

async fn receive_reply<C: Completions>(
    model: &ChatModel<C>,
    messages: Vec<Message>,
    renderer: &mut dyn Renderer,
) -> Result<Reply> {
    let mut text = interruptible(&*renderer, model.stream(messages)).await??;
    renderer.start_reply();
    while let Some(fragment) = interruptible(&*renderer, text.next()).await? {
        renderer.print_text(&fragment?);
    }
    if renderer.should_interrupt() {
        return Err(interrupted());
    }
    renderer.finish_response();
    Ok(text.into_reply())
}

/// Drives `future` to completion unless the renderer asks to stop first.
async fn interruptible<F: Future>(renderer: &dyn Renderer, future: F) -> Result<F::Output> {
    let mut future = pin!(future);
    let mut poll = tokio::time::interval(INTERRUPT_POLL);
    loop {
        if renderer.should_interrupt() {
            return Err(interrupted());
        }
        tokio::select! {
            biased;
            output = &mut future => return Ok(output),
            _ = poll.tick() => {}
        }
    }
}

fn interrupted() -> Error {
    Error::abort("reply interrupted; nothing was added to history")
}
