//! Shell scripts generated from the installed package list

use super::types::PackageRecord;

/// Daily 2 AM bulk upgrade, registered as a Windows scheduled task.
pub const SCHEDULED_UPGRADE_COMMAND: &str = "Register-ScheduledTask -Action (New-ScheduledTaskAction -Execute 'winget' -Argument 'upgrade --all --include-unknown --accept-source-agreements --accept-package-agreements') -Trigger (New-ScheduledTaskTrigger -Daily -At 2am) -TaskName \"WingetAutoUpdate\" -User \"System\" -RunLevel Highest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// `winget install` for every package
    Reinstall,
    /// `winget uninstall` for every package
    Cleanup,
}

impl ScriptKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScriptKind::Reinstall => "Reinstall script",
            ScriptKind::Cleanup => "Cleanup script",
        }
    }

    pub fn build(&self, packages: &[PackageRecord]) -> String {
        match self {
            ScriptKind::Reinstall => reinstall_script(packages),
            ScriptKind::Cleanup => cleanup_script(packages),
        }
    }
}

fn per_package(packages: &[PackageRecord], verb: &str) -> String {
    packages
        .iter()
        .map(|p| format!("winget {} --id {} -e", verb, p.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One exact-id `winget install` line per package, in list order.
pub fn reinstall_script(packages: &[PackageRecord]) -> String {
    per_package(packages, "install")
}

/// One exact-id `winget uninstall` line per package, in list order.
pub fn cleanup_script(packages: &[PackageRecord]) -> String {
    per_package(packages, "uninstall")
}
