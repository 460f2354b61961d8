// Public modules
pub mod adapter;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod stream;
pub mod types;

// Re-exports
pub use adapter::{ChatModel, ClientProvider, CompletionAdapter};
pub use chat::{ChatSession, ConversationHistory, DEFAULT_SYSTEM_PROMPT, SessionState};
pub use client::{ChunkStream, Completions, Groq};
pub use client_logger::ClientLogger;
pub use error::{Error, ErrorKind, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer, render_transcript};
pub use stream::{Reply, TextStream};
pub use types::*;
