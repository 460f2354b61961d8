// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod finish_reason;
pub mod message;
pub mod model;
pub mod temperature;
pub mod usage;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, GroqExtension};
pub use chat_completion_request::ChatCompletionRequest;
pub use finish_reason::FinishReason;
pub use message::{Message, MessageRole};
pub use model::Model;
pub use temperature::Temperature;
pub use usage::Usage;
