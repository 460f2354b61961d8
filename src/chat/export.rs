//! Export of the conversation as a JSON file, and import of such a file.
//!
//! The file is a pretty-printed array of `{"role", "content"}` records named
//! `chat_export_YYYYMMDD.json` after the local date.

use std::fs;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::chat::ConversationHistory;
use crate::observability::{EXPORTS, IMPORTS};
use crate::types::Message;
use crate::{Error, Result};

/// Media type of an export file.
pub const EXPORT_MIME_TYPE: &str = "application/json";

/// Serializes `history` with two-space indentation.
pub fn export_json(history: &ConversationHistory) -> Result<String> {
    Ok(serde_json::to_string_pretty(history.messages())?)
}

/// `chat_export_YYYYMMDD.json` for `date`.
pub fn export_file_name(date: Date) -> Result<String> {
    let stamp = date
        .format(format_description!("[year][month][day]"))
        .map_err(|e| Error::validation(format!("cannot format export date: {e}"), None))?;
    Ok(format!("chat_export_{stamp}.json"))
}

/// Today's date in the local timezone, or in UTC when the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Writes `history` into `dir` and returns the path written.
///
/// An existing export from the same day is overwritten.
pub fn write_export(history: &ConversationHistory, dir: &Path) -> Result<PathBuf> {
    write_export_dated(history, dir, today())
}

pub(crate) fn write_export_dated(
    history: &ConversationHistory,
    dir: &Path,
    date: Date,
) -> Result<PathBuf> {
    let path = dir.join(export_file_name(date)?);
    let json = export_json(history)?;
    fs::write(&path, json)
        .map_err(|e| Error::io(format!("cannot write {}: {e}", path.display()), e))?;
    EXPORTS.click();
    Ok(path)
}

/// Parses an export back into a history.
///
/// Anything other than an array of user and assistant records is rejected.
pub fn import_json(json: &str) -> Result<ConversationHistory> {
    let messages: Vec<Message> = serde_json::from_str(json)
        .map_err(|e| Error::validation(format!("not a chat export: {e}"), None))?;
    ConversationHistory::from_messages(messages).ok_or_else(|| {
        Error::validation(
            "chat exports may only contain user and assistant messages",
            Some("role".to_string()),
        )
    })
}

/// Reads and parses the export at `path`.
pub fn read_import(path: &Path) -> Result<ConversationHistory> {
    let json = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("cannot read {}: {e}", path.display()), e))?;
    let history = import_json(&json)?;
    IMPORTS.click();
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn sample(pairs: usize) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        for i in 0..pairs {
            history.push_exchange(format!("question {i}"), format!("answer \"{i}\"\n"));
        }
        history
    }

    #[test]
    fn file_name_is_dated() {
        let date = Date::from_calendar_date(2024, Month::March, 5).unwrap();
        assert_eq!(export_file_name(date).unwrap(), "chat_export_20240305.json");
    }

    #[test]
    fn json_is_pretty_array_of_records() {
        let mut history = ConversationHistory::new();
        history.push_exchange("hi", "hello");
        let json = export_json(&history).unwrap();
        assert_eq!(
            json,
            "[\n  {\n    \"role\": \"user\",\n    \"content\": \"hi\"\n  },\n  {\n    \"role\": \"assistant\",\n    \"content\": \"hello\"\n  }\n]"
        );
    }

    #[test]
    fn empty_history_exports_empty_array() {
        assert_eq!(export_json(&ConversationHistory::new()).unwrap(), "[]");
    }

    #[test]
    fn export_round_trip() {
        for pairs in [0, 1, 3] {
            let history = sample(pairs);
            let json = export_json(&history).unwrap();
            let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
            assert_eq!(records.len(), 2 * pairs);
            for (record, message) in records.iter().zip(history.iter()) {
                assert_eq!(record["role"], message.role().as_str());
                assert_eq!(record["content"], message.content());
            }
            assert_eq!(import_json(&json).unwrap(), history);
        }
    }

    #[test]
    fn import_rejects_system_records() {
        let json = r#"[{"role": "system", "content": "You are a pirate."}]"#;
        let err = import_json(json).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn import_rejects_garbage() {
        assert!(import_json("{\"role\": \"user\"}").unwrap_err().is_validation());
        assert!(import_json("[{\"role\": \"tool\", \"content\": \"x\"}]").is_err());
    }

    #[test]
    fn write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let history = sample(2);
        let date = Date::from_calendar_date(2025, Month::December, 31).unwrap();
        let path = write_export_dated(&history, dir.path(), date).unwrap();
        assert_eq!(path, dir.path().join("chat_export_20251231.json"));
        assert_eq!(read_import(&path).unwrap(), history);
    }

    #[test]
    fn write_does_not_mutate_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = sample(1);
        let before = history.clone();
        write_export(&history, dir.path()).unwrap();
        assert_eq!(history, before);
    }

    #[test]
    fn missing_directory_is_local_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = write_export(&sample(1), &missing).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Local);
    }
}
