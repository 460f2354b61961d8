//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use crate::types::{Model, Temperature};

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Change the model.
    Model(Model),

    /// List the supported models.
    Models,

    /// Set the sampling temperature.
    Temperature(Temperature),

    /// Raise the temperature by one step.
    TemperatureUp,

    /// Lower the temperature by one step.
    TemperatureDown,

    /// Set the persona.
    /// `None` restores the default persona.
    System(Option<String>),

    /// Export the conversation into a directory (the configured one when `None`).
    Export(Option<String>),

    /// Replace the conversation with an exported file.
    Import(String),

    /// Replay the whole transcript.
    History,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (message count, token usage, etc.).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use groqchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model llama-3.1-8b-instant").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "model" => match argument {
            Some(id) => match id.parse::<Model>() {
                Ok(model) => ChatCommand::Model(model),
                Err(err) => ChatCommand::Invalid(err.to_string()),
            },
            None => ChatCommand::Invalid(format!(
                "/model requires a model id ({})",
                Model::supported_ids()
            )),
        },
        "models" => ChatCommand::Models,
        "temperature" | "temp" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("up") => ChatCommand::TemperatureUp,
            Some(arg) if arg.eq_ignore_ascii_case("down") => ChatCommand::TemperatureDown,
            Some(arg) => match parse_f32_in_range(arg, Temperature::MIN, Temperature::MAX) {
                Ok(value) => ChatCommand::Temperature(Temperature::new(value)),
                Err(err) => ChatCommand::Invalid(format!("/temperature {err}")),
            },
            None => ChatCommand::Invalid("/temperature requires a value".to_string()),
        },
        "system" => ChatCommand::System(argument.map(|s| s.to_string())),
        "export" => ChatCommand::Export(argument.map(|s| s.to_string())),
        "import" => match argument {
            Some(arg) => ChatCommand::Import(arg.to_string()),
            None => ChatCommand::Invalid("/import requires a file path".to_string()),
        },
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

pub(crate) fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min:.1} and {max:.1}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min:.1} and {max:.1}"))
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /model <id>            Change the model (e.g., /model llama-3.1-8b-instant)
  /models                List supported models
  /temperature <v>       Set temperature 0.0-1.0 (or 'up'/'down' by 0.1)
  /system [prompt]       Set the persona (no argument restores the default)
  /export [dir]          Save the conversation as chat_export_YYYYMMDD.json
  /import <file>         Replace the conversation with an exported file
  /history               Show the full conversation
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model llama-3.1-8b-instant"),
            Some(ChatCommand::Model(Model::Llama31Instant))
        );
        assert_eq!(
            parse_command("/model   llama-3.3-70b-versatile  "),
            Some(ChatCommand::Model(Model::Llama33Versatile))
        );
        assert_eq!(parse_command("/models"), Some(ChatCommand::Models));
    }

    #[test]
    fn parse_model_rejects_unknown() {
        let Some(ChatCommand::Invalid(message)) = parse_command("/model gpt-4o") else {
            panic!("expected an invalid command");
        };
        assert!(message.contains("llama-3.1-8b-instant"));
        assert!(message.contains("llama-3.3-70b-versatile"));

        assert!(matches!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_system() {
        assert_eq!(
            parse_command("/system You are a pirate."),
            Some(ChatCommand::System(Some("You are a pirate.".to_string())))
        );
        assert_eq!(parse_command("/system"), Some(ChatCommand::System(None)));
        assert_eq!(parse_command("/system   "), Some(ChatCommand::System(None)));
    }

    #[test]
    fn parse_temperature() {
        assert_eq!(
            parse_command("/temperature 0.2"),
            Some(ChatCommand::Temperature(Temperature::new(0.2)))
        );
        assert_eq!(
            parse_command("/temperature 1"),
            Some(ChatCommand::Temperature(Temperature::new(1.0)))
        );
        assert_eq!(
            parse_command("/temperature up"),
            Some(ChatCommand::TemperatureUp)
        );
        assert_eq!(
            parse_command("/temp DOWN"),
            Some(ChatCommand::TemperatureDown)
        );
        for bad in ["/temperature 1.5", "/temperature -0.1", "/temperature warm", "/temperature NaN"] {
            assert!(
                matches!(parse_command(bad), Some(ChatCommand::Invalid(_))),
                "{bad}"
            );
        }
        assert!(matches!(
            parse_command("/temperature"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_export_import() {
        assert_eq!(parse_command("/export"), Some(ChatCommand::Export(None)));
        assert_eq!(
            parse_command("/export /tmp/chats"),
            Some(ChatCommand::Export(Some("/tmp/chats".to_string())))
        );
        assert_eq!(
            parse_command("/import chat_export_20240305.json"),
            Some(ChatCommand::Import("chat_export_20240305.json".to_string()))
        );
        assert!(matches!(
            parse_command("/import"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stats_history_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid("Unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert!(parse_command("Hello!").is_none());
        assert!(parse_command("what does /clear do?").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        for command in ["/clear", "/model", "/temperature", "/system", "/export", "/quit"] {
            assert!(help.contains(command), "{command}");
        }
    }
}
