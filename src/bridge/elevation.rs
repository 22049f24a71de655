//! Privilege checks and relaunch requests

/// Whether this process already runs with administrative rights.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// `net session` only succeeds from an elevated token.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    duct::cmd!("net", "session")
        .stdout_null()
        .stderr_null()
        .unchecked()
        .run()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
pub fn is_elevated() -> bool {
    false
}

/// Ask the platform to start an elevated copy of this executable.
///
/// Returns `true` when the platform accepted the request. The elevated copy
/// is a separate process; this one keeps running until the caller quits.
pub fn request_elevation() -> bool {
    let exe = match std::env::current_exe() {
        Ok(exe) if !exe.as_os_str().is_empty() => exe,
        _ => return false,
    };

    let expr = relaunch_command(&exe.to_string_lossy());
    match expr.stdout_null().stderr_null().unchecked().start() {
        Ok(_) => true,
        Err(e) => {
            log::warn!("elevation request rejected: {}", e);
            false
        }
    }
}

#[cfg(windows)]
fn relaunch_command(exe: &str) -> duct::Expression {
    let script = format!("Start-Process -FilePath '{}' -Verb RunAs", exe.replace('\'', "''"));
    duct::cmd!("powershell", "-NoProfile", "-NonInteractive", "-Command", script)
}

#[cfg(not(windows))]
fn relaunch_command(exe: &str) -> duct::Expression {
    duct::cmd!("pkexec", exe)
}
