//! Session-scoped state: the conversation history and the user-editable settings.
//!
//! A [`SessionStore`] is created empty when a session starts and lazily initialized on
//! first access.  Everything afterwards mutates the [`SessionState`] in place through the
//! operations defined here; nothing is persisted when the session ends.

use crate::types::{Message, MessageRole, Model, Temperature};

/// Persona used until the user sets their own.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, professional AI assistant. Answer concisely and accurately.";

/// User-editable settings of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    model: Model,
    temperature: Temperature,
    system_prompt: String,
}

impl SessionConfig {
    /// The selected model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Selects a model.
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// The sampling temperature.
    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Sets the sampling temperature, clamping it into range.
    pub fn set_temperature(&mut self, temperature: impl Into<Temperature>) {
        self.temperature = temperature.into();
    }

    /// The persona sent as the system message of every request.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Replaces the persona.  Affects future requests only.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    /// Restores the default persona.
    pub fn reset_system_prompt(&mut self) {
        self.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            temperature: Temperature::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// The visible conversation: user prompts and assistant replies, in order.
///
/// System messages never live here; the persona is synthesized for each request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from user/assistant messages.
    ///
    /// Returns `None` if any message is a system message.
    pub fn from_messages(messages: Vec<Message>) -> Option<Self> {
        if messages
            .iter()
            .any(|message| message.role() == MessageRole::System)
        {
            None
        } else {
            Some(Self { messages })
        }
    }

    /// Appends a completed exchange.  Both messages are added, in order.
    pub fn push_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.messages.reserve(2);
        self.messages.push(Message::user(prompt));
        self.messages.push(Message::assistant(reply));
    }

    /// Drops every message.
    pub fn clear(&mut self) {
        self.messages = Vec::new();
    }

    /// The messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates the messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The message list for the next request: persona, history, then `prompt`.
    pub fn outgoing(&self, system_prompt: &str, prompt: &str) -> Vec<Message> {
        let mut outgoing = Vec::with_capacity(self.messages.len() + 2);
        outgoing.push(Message::system(system_prompt));
        outgoing.extend(self.messages.iter().cloned());
        outgoing.push(Message::user(prompt));
        outgoing
    }
}

/// Everything one session owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// The conversation so far.
    pub history: ConversationHistory,
    /// The current settings.
    pub config: SessionConfig,
}

/// Lazily initialized holder of a session's state.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: Option<SessionState>,
}

impl SessionStore {
    /// A store whose state has not been initialized yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the state with defaults on first call; later calls return the
    /// existing state untouched.
    pub fn initialize(&mut self) -> &mut SessionState {
        self.state.get_or_insert_with(SessionState::default)
    }

    /// The state, if it has been initialized.
    pub fn get(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// Ends the session, handing back its state.
    pub fn into_state(self) -> Option<SessionState> {
        self.state
    }
}
