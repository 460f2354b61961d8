use std::fmt;

use serde::{Deserialize, Serialize};

/// Role type for a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System (persona) role.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl MessageRole {
    /// The wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message of a conversation.
///
/// Serialized as `{"role": "...", "content": "..."}`, which is both the shape the
/// completion API expects and the shape of an exported transcript record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// An instruction steering the assistant; never stored in history.
    System {
        /// The persona text.
        content: String,
    },

    /// A prompt submitted by the user.
    User {
        /// The prompt text.
        content: String,
    },

    /// A reply produced by the model.
    Assistant {
        /// The reply text.
        content: String,
    },
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    /// The role of this message.
    pub fn role(&self) -> MessageRole {
        match self {
            Message::System { .. } => MessageRole::System,
            Message::User { .. } => MessageRole::User,
            Message::Assistant { .. } => MessageRole::Assistant,
        }
    }

    /// The text of this message.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn message_wire_shape() {
        assert_eq!(
            to_value(Message::user("Hello")).unwrap(),
            json!({"role": "user", "content": "Hello"})
        );
        assert_eq!(
            to_value(Message::system("Be brief")).unwrap(),
            json!({"role": "system", "content": "Be brief"})
        );
    }

    #[test]
    fn message_deserialization() {
        let message: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "Hi there"})).unwrap();
        assert_eq!(message, Message::assistant("Hi there"));
        assert_eq!(message.role(), MessageRole::Assistant);
        assert_eq!(message.content(), "Hi there");
    }

    #[test]
    fn unknown_role_rejected() {
        let result = serde_json::from_value::<Message>(json!({"role": "tool", "content": "x"}));
        assert!(result.is_err());
    }
}
