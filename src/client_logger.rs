//! Logging trait for completion client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Groq`](crate::Groq) client.

use crate::{ChatCompletionChunk, ChatCompletionRequest};

/// A trait for logging completion client operations.
///
/// Implement this trait to capture and record all API interactions, including the
/// outgoing request and every streamed chunk.
///
/// # Example
///
/// ```rust,ignore
/// use groqchat::{ChatCompletionChunk, ChatCompletionRequest, ClientLogger};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &ChatCompletionRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &ChatCompletionChunk) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log an individual streamed chunk.
    ///
    /// Called once for every chunk decoded from the event stream, in order.
    fn log_stream_chunk(&self, chunk: &ChatCompletionChunk);
}
