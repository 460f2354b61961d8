use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A model identifier accepted by the chat surface.
///
/// The set is closed: anything that does not parse into one of these variants is
/// rejected, so a session's selected model is always a supported one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// Llama 3.1 8B, tuned for latency.
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama31Instant,

    /// Llama 3.3 70B, the general-purpose default.
    #[default]
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33Versatile,
}

impl Model {
    /// Every supported model, in display order.
    pub const ALL: [Model; 2] = [Model::Llama31Instant, Model::Llama33Versatile];

    /// The identifier sent to the API.
    pub fn id(&self) -> &'static str {
        match self {
            Model::Llama31Instant => "llama-3.1-8b-instant",
            Model::Llama33Versatile => "llama-3.3-70b-versatile",
        }
    }

    /// The human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Model::Llama31Instant => "Llama 3.1 8B (Fast)",
            Model::Llama33Versatile => "Llama 3.3 70B (Smart)",
        }
    }

    /// Comma-separated list of supported identifiers, for error messages.
    pub fn supported_ids() -> String {
        Self::ALL
            .iter()
            .map(Model::id)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|model| model.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::validation(
                    format!(
                        "unsupported model '{s}' (supported: {})",
                        Self::supported_ids()
                    ),
                    Some("model".to_string()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_versatile() {
        assert_eq!(Model::default(), Model::Llama33Versatile);
    }

    #[test]
    fn model_serialization() {
        let json = serde_json::to_string(&Model::Llama31Instant).unwrap();
        assert_eq!(json, r#""llama-3.1-8b-instant""#);

        let model: Model = serde_json::from_str(r#""llama-3.3-70b-versatile""#).unwrap();
        assert_eq!(model, Model::Llama33Versatile);
    }

    #[test]
    fn parse_known_and_unknown() {
        assert_eq!(
            "llama-3.1-8b-instant".parse::<Model>().unwrap(),
            Model::Llama31Instant
        );
        assert_eq!(
            " LLAMA-3.3-70B-VERSATILE ".parse::<Model>().unwrap(),
            Model::Llama33Versatile
        );
        let err = "gpt-4o".parse::<Model>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("llama-3.1-8b-instant"));
    }

    #[test]
    fn labels() {
        assert_eq!(Model::Llama31Instant.label(), "Llama 3.1 8B (Fast)");
        assert_eq!(Model::Llama33Versatile.label(), "Llama 3.3 70B (Smart)");
        assert_eq!(Model::Llama33Versatile.to_string(), "llama-3.3-70b-versatile");
    }
}
