use serde::{Deserialize, Serialize};

use crate::types::{FinishReason, Usage};

/// The incremental content of one streamed choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Present on the first chunk of a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The next fragment of reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice within a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Index of the choice; the chat client only requests one.
    #[serde(default)]
    pub index: u32,

    /// The fragment carried by this chunk.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the last chunk of the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Groq's vendor extension block, which carries usage on the final chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqExtension {
    /// Server-side request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Token usage for the whole reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A single `chat.completion.chunk` event of a streamed reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Completion identifier shared by every chunk of a reply.
    #[serde(default)]
    pub id: String,

    /// The model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Streamed choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Usage, when the server reports it in the OpenAI position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Usage and request id, when the server reports them in Groq's position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqExtension>,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying one text fragment.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
            ..Self::default()
        }
    }

    /// Create the closing chunk of a reply.
    pub fn finished(id: impl Into<String>, reason: FinishReason, usage: Option<Usage>) -> Self {
        Self {
            id: id.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some(reason),
            }],
            x_groq: usage.map(|usage| GroqExtension {
                id: None,
                usage: Some(usage),
            }),
            ..Self::default()
        }
    }

    /// The text fragment of the first choice, if it carries non-empty text.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// The finish reason of the first choice, if this is its last chunk.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }

    /// Usage reported on this chunk in either position.
    pub fn usage(&self) -> Option<Usage> {
        self.x_groq
            .as_ref()
            .and_then(|ext| ext.usage)
            .or(self.usage)
    }
}
