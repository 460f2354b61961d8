//! Chat application module for interactive conversations with Groq-hosted models.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! groqchat client library. It supports:
//!
//! - Streaming responses with real-time token display
//! - Slash commands for model, temperature and persona selection
//! - Export and import of the conversation as JSON
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`state`]: session state with lazy initialization
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the exchange flow and session controls
//! - [`commands`]: slash command parsing
//! - [`export`]: the JSON export file

mod commands;
mod config;
pub mod export;
mod session;
mod state;

pub use crate::render::{PlainTextRenderer, Renderer, render_transcript};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use export::EXPORT_MIME_TYPE;
pub use session::{ChatSession, SessionStats};
pub use state::{
    ConversationHistory, DEFAULT_SYSTEM_PROMPT, SessionConfig, SessionState, SessionStore,
};
