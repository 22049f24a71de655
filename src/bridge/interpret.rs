//! Turn a `CommandResult` into what the caller asked for.
//!
//! The caller picks the mode from the verb it issued; nothing here guesses
//! whether a payload is JSON or prose. Failed commands and unreadable
//! payloads both come back empty, so one bad response shows up as "no
//! results" rather than an error. The caller reports `result.error` itself.

use super::parser::parse_package_detail;
use super::types::{CommandResult, PackageDetail, PackageRecord};

/// List mode: the payload is a JSON array of package objects.
pub fn as_packages(result: &CommandResult) -> Vec<PackageRecord> {
    if !result.success {
        return Vec::new();
    }
    let Some(payload) = result.output.as_deref() else {
        return Vec::new();
    };
    if payload.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<PackageRecord>>(payload) {
        Ok(packages) => packages,
        Err(e) => {
            log::warn!(
                "failed to parse winget package list ({}): {:.120}",
                e,
                payload
            );
            Vec::new()
        }
    }
}

/// Text mode: the payload verbatim.
pub fn as_text(result: &CommandResult) -> String {
    if !result.success {
        return String::new();
    }
    result.output.clone().unwrap_or_default()
}

/// Text mode followed by `key: value` parsing, for `show`.
pub fn as_detail(result: &CommandResult) -> PackageDetail {
    parse_package_detail(&as_text(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_yields_empty_list() {
        let result = CommandResult {
            success: false,
            output: None,
            error: Some("boom".into()),
            code: Some(1),
        };
        assert!(as_packages(&result).is_empty());
        assert_eq!(as_text(&result), "");
    }

    #[test]
    fn failed_result_ignores_payload() {
        let result = CommandResult {
            success: false,
            output: Some(r#"[{"Id":"A","Name":"A","Version":"1"}]"#.into()),
            error: None,
            code: Some(1),
        };
        assert!(as_packages(&result).is_empty());
        assert_eq!(as_text(&result), "");
    }

    #[test]
    fn malformed_payload_yields_empty_list() {
        let result = CommandResult::ok("Name  Id  Version\n---- not json");
        assert!(as_packages(&result).is_empty());
    }

    #[test]
    fn empty_success_yields_empty_values() {
        let result = CommandResult {
            success: true,
            ..Default::default()
        };
        assert!(as_packages(&result).is_empty());
        assert_eq!(as_text(&result), "");
    }

    #[test]
    fn parses_json_package_list() {
        let result = CommandResult::ok(
            r#"[{"Id":"Mozilla.Firefox","Name":"Mozilla Firefox","Version":"120.0"}]"#,
        );
        let packages = as_packages(&result);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, "Mozilla.Firefox");
    }

    #[test]
    fn text_mode_returns_payload_verbatim() {
        let result = CommandResult::ok("Name   Argument\n winget https://cdn.winget.microsoft.com/cache\n");
        assert_eq!(
            as_text(&result),
            "Name   Argument\n winget https://cdn.winget.microsoft.com/cache\n"
        );
    }
}
