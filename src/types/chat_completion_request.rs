use serde::{Deserialize, Serialize};

use crate::types::{Message, Model, Temperature};

/// Body of a `POST chat/completions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// The model that generates the reply.
    pub model: Model,

    /// The ordered conversation, persona first.
    pub messages: Vec<Message>,

    /// Sampling temperature.
    pub temperature: Temperature,

    /// Upper bound on reply tokens; the server default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the reply is streamed as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a new non-streaming request.
    pub fn new(model: Model, messages: Vec<Message>, temperature: Temperature) -> Self {
        Self {
            model,
            messages,
            temperature,
            max_tokens: None,
            stream: false,
        }
    }

    /// Set the maximum reply tokens.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request a streamed reply.
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = ChatCompletionRequest::new(
            Model::Llama31Instant,
            vec![Message::system("Be brief."), Message::user("Hi")],
            Temperature::new(0.5),
        )
        .streaming();

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "llama-3.1-8b-instant",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ],
                "temperature": 0.5,
                "stream": true
            })
        );
    }

    #[test]
    fn request_with_max_tokens() {
        let request = ChatCompletionRequest::new(
            Model::default(),
            vec![Message::user("Hi")],
            Temperature::default(),
        )
        .with_max_tokens(Some(256));
        let value = to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], json!(256));
        assert_eq!(value["stream"], json!(false));
    }
}
