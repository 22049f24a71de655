//! Which argument lists the executor is willing to hand to winget.

/// Strict allowlist keyed on the first argument.
pub fn is_command_allowed(args: &[String]) -> bool {
    let Some(verb) = args.first() else {
        return false;
    };
    let has = |flag: &str| args.iter().any(|a| a == flag);

    match verb.as_str() {
        "list" | "search" | "upgrade" | "pin" | "source" => true,
        "install" => has("--id") && has("--accept-source-agreements") && has("--accept-package-agreements"),
        "uninstall" | "show" => has("--id"),
        "export" => has("-o"),
        "import" => has("-i"),
        _ => false,
    }
}

/// Commands whose progress is worth showing live in the console.
pub fn is_streamable(args: &[String]) -> bool {
    let has = |flag: &str| args.iter().any(|a| a == flag);
    match args.first().map(String::as_str) {
        Some("install") | Some("uninstall") | Some("import") => true,
        Some("upgrade") => has("--id") || has("--all"),
        _ => false,
    }
}

/// Commands whose stdout is a package table to be turned into JSON.
pub fn is_package_listing(args: &[String]) -> bool {
    matches!(args.first().map(String::as_str), Some("list") | Some("search") | Some("upgrade"))
        && !is_streamable(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::verbs::Verb;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_bridge_verb_is_allowed() {
        let verbs = [
            Verb::Search { query: "git".into() },
            Verb::ListInstalled { source: "winget".into() },
            Verb::ListUpgrades,
            Verb::Install { id: "Git.Git".into() },
            Verb::Uninstall { id: "Git.Git".into() },
            Verb::Upgrade { id: "Git.Git".into() },
            Verb::UpgradeAll { include_unknown: true },
            Verb::Pin { id: "Git.Git".into() },
            Verb::Unpin { id: "Git.Git".into() },
            Verb::ListPins,
            Verb::ListSources,
            Verb::ResetSources,
            Verb::Export { path: "out.json".into() },
            Verb::Import { path: "in.json".into() },
            Verb::Show { id: "Git.Git".into() },
        ];
        for verb in verbs {
            assert!(is_command_allowed(&verb.args()), "{:?} should be allowed", verb);
        }
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert!(!is_command_allowed(&[]));
        assert!(!is_command_allowed(&strings(&["settings"])));
        assert!(!is_command_allowed(&strings(&["install", "--id", "Git.Git"])));
        assert!(!is_command_allowed(&strings(&["uninstall", "Git.Git"])));
        assert!(!is_command_allowed(&strings(&["export", "out.json"])));
    }

    #[test]
    fn classifies_streaming_and_listing() {
        let upgrades = Verb::ListUpgrades.args();
        let upgrade_all = Verb::UpgradeAll { include_unknown: false }.args();
        assert!(is_package_listing(&upgrades));
        assert!(!is_streamable(&upgrades));
        assert!(is_streamable(&upgrade_all));
        assert!(!is_package_listing(&upgrade_all));
        assert!(is_streamable(&Verb::Install { id: "a".into() }.args()));
        assert!(!is_streamable(&Verb::ListPins.args()));
        assert!(!is_package_listing(&Verb::Show { id: "a".into() }.args()));
    }
}
