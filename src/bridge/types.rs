//! Data types shared by the command bridge

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One package row as reported by winget.
///
/// The serialized field names follow the JSON the executor produces for
/// listing commands (`Id`, `Name`, `Version`, `Source`, `Available`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(default, rename = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, rename = "Available", skip_serializing_if = "Option::is_none")]
    pub available: Option<String>,
}

impl PackageRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            source: None,
            available: None,
        }
    }

    pub fn has_upgrade(&self) -> bool {
        self.available.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Outcome of one dispatched command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    /// Captured stdout, or the JSON package array for listing commands.
    pub output: Option<String>,
    pub error: Option<String>,
    pub code: Option<i32>,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            code: Some(0),
        }
    }

    pub fn failed(error: impl Into<String>, code: i32) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            code: Some(code),
        }
    }

    /// Human readable one-liner for the status bar.
    pub fn summary(&self, action: &str) -> String {
        if self.success {
            format!("{} completed.", action)
        } else {
            let reason = self
                .error
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .and_then(|e| e.lines().last())
                .unwrap_or("unknown error");
            match self.code {
                Some(code) => format!("{} failed ({}): {}", action, code, reason),
                None => format!("{} failed: {}", action, reason),
            }
        }
    }
}

/// `key: value` fields parsed from `winget show`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDetail {
    pub fields: Vec<(String, String)>,
}

impl PackageDetail {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Failures the bridge cannot absorb: the executor itself is unusable.
///
/// A command that runs and exits non-zero is not an error here; it comes
/// back as a `CommandResult` with `success == false`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("executor task aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_from_tool_json() {
        let json = r#"{"Id":"Mozilla.Firefox","Name":"Mozilla Firefox","Version":"120.0"}"#;
        let record: PackageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "Mozilla.Firefox");
        assert_eq!(record.name, "Mozilla Firefox");
        assert_eq!(record.source, None);
        assert!(!record.has_upgrade());
    }

    #[test]
    fn summary_uses_last_error_line() {
        let result = CommandResult::failed("first\nAccess is denied\n", 5);
        assert_eq!(result.summary("Install"), "Install failed (5): Access is denied");
        assert_eq!(CommandResult::ok("").summary("Install"), "Install completed.");
    }

    #[test]
    fn detail_lookup_ignores_case() {
        let detail = PackageDetail {
            fields: vec![("Publisher".into(), "Mozilla".into())],
        };
        assert_eq!(detail.get("publisher"), Some("Mozilla"));
        assert_eq!(detail.get("Homepage"), None);
    }
}
