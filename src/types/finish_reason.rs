use serde::{Deserialize, Serialize};

/// Why the model stopped generating.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the reply or a stop sequence.
    Stop,

    /// The reply hit `max_tokens`.
    Length,

    /// The model asked for a tool call.
    ToolCalls,

    /// Output was withheld by a content filter.
    ContentFilter,

    /// Any reason this client does not know about.
    #[serde(other)]
    Other,
}
