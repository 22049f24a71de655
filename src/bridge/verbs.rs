//! Argument templates for every winget verb the front end issues.

use std::path::Path;

const ACCEPT_SOURCE: &str = "--accept-source-agreements";
const ACCEPT_PACKAGE: &str = "--accept-package-agreements";

/// A package-manager operation together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Search { query: String },
    ListInstalled { source: String },
    ListUpgrades,
    Install { id: String },
    Uninstall { id: String },
    Upgrade { id: String },
    UpgradeAll { include_unknown: bool },
    Pin { id: String },
    Unpin { id: String },
    ListPins,
    ListSources,
    ResetSources,
    Export { path: String },
    Import { path: String },
    Show { id: String },
}

impl Verb {
    pub fn export(path: &Path) -> Self {
        Verb::Export {
            path: path.display().to_string(),
        }
    }

    pub fn import(path: &Path) -> Self {
        Verb::Import {
            path: path.display().to_string(),
        }
    }

    /// Short label used in status messages and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Verb::Search { .. } => "Search",
            Verb::ListInstalled { .. } => "List installed",
            Verb::ListUpgrades => "Check upgrades",
            Verb::Install { .. } => "Install",
            Verb::Uninstall { .. } => "Uninstall",
            Verb::Upgrade { .. } => "Upgrade",
            Verb::UpgradeAll { .. } => "Bulk upgrade",
            Verb::Pin { .. } => "Pin",
            Verb::Unpin { .. } => "Unpin",
            Verb::ListPins => "List pins",
            Verb::ListSources => "List sources",
            Verb::ResetSources => "Reset sources",
            Verb::Export { .. } => "Export",
            Verb::Import { .. } => "Import",
            Verb::Show { .. } => "Show",
        }
    }

    /// The exact argument list passed to winget.
    pub fn args(&self) -> Vec<String> {
        let args: Vec<&str> = match self {
            Verb::Search { query } => vec!["search", required(query)],
            Verb::ListInstalled { source } => vec!["list", "--source", required(source)],
            Verb::ListUpgrades => vec!["upgrade"],
            Verb::Install { id } => vec!["install", "--id", required(id), ACCEPT_SOURCE, ACCEPT_PACKAGE],
            Verb::Uninstall { id } => vec!["uninstall", "--id", required(id)],
            Verb::Upgrade { id } => vec!["upgrade", "--id", required(id), ACCEPT_SOURCE, ACCEPT_PACKAGE],
            Verb::UpgradeAll { include_unknown } => {
                let mut args = vec!["upgrade", "--all"];
                if *include_unknown {
                    args.push("--include-unknown");
                }
                args.extend([ACCEPT_SOURCE, ACCEPT_PACKAGE]);
                args
            }
            Verb::Pin { id } => vec!["pin", "add", "--id", required(id)],
            Verb::Unpin { id } => vec!["pin", "remove", "--id", required(id)],
            Verb::ListPins => vec!["pin", "list"],
            Verb::ListSources => vec!["source", "list"],
            Verb::ResetSources => vec!["source", "reset", "--force"],
            Verb::Export { path } => vec!["export", "-o", required(path)],
            Verb::Import { path } => vec!["import", "-i", required(path), ACCEPT_SOURCE, ACCEPT_PACKAGE],
            Verb::Show { id } => vec!["show", "--id", required(id)],
        };
        args.into_iter().map(String::from).collect()
    }
}

/// Required parameters must be supplied by the caller; an empty one is a bug
/// at the call site.
fn required(value: &str) -> &str {
    debug_assert!(!value.trim().is_empty(), "required winget parameter is empty");
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_appends_agreement_flags() {
        let args = Verb::Install { id: "Git.Git".into() }.args();
        assert_eq!(
            args,
            [
                "install",
                "--id",
                "Git.Git",
                "--accept-source-agreements",
                "--accept-package-agreements"
            ]
        );
    }

    #[test]
    fn upgrade_all_includes_unknown_on_request() {
        let with = Verb::UpgradeAll { include_unknown: true }.args();
        let without = Verb::UpgradeAll { include_unknown: false }.args();
        assert_eq!(with[..3], ["upgrade", "--all", "--include-unknown"]);
        assert!(!without.iter().any(|a| a == "--include-unknown"));
        assert!(without.iter().any(|a| a == "--accept-package-agreements"));
    }

    #[test]
    fn text_verbs_have_fixed_templates() {
        assert_eq!(Verb::ListPins.args(), ["pin", "list"]);
        assert_eq!(Verb::ListSources.args(), ["source", "list"]);
        assert_eq!(Verb::ResetSources.args(), ["source", "reset", "--force"]);
        assert_eq!(Verb::Show { id: "7zip.7zip".into() }.args(), ["show", "--id", "7zip.7zip"]);
    }

    #[test]
    fn file_verbs_carry_the_picked_path() {
        let export = Verb::export(Path::new("packages.json")).args();
        assert_eq!(export, ["export", "-o", "packages.json"]);
        let import = Verb::import(Path::new("packages.json")).args();
        assert_eq!(import[..3], ["import", "-i", "packages.json"]);
        assert_eq!(import.len(), 5);
    }

    #[test]
    fn list_installed_filters_by_source() {
        let args = Verb::ListInstalled { source: "winget".into() }.args();
        assert_eq!(args, ["list", "--source", "winget"]);
    }
}
