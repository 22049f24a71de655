use anyhow::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only text log of every command the executor ran or refused.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one entry:
    /// `[2025-01-31 14:02:11] ACTION: EXECUTE | DETAILS: winget search git | RESULT: SUCCESS`
    pub fn record(&self, action: &str, details: &str, result: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let now = Local::now();
        let entry = format!(
            "[{}] ACTION: {} | DETAILS: {} | RESULT: {}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            action,
            details,
            result
        );

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }

    /// Like `record`, but a failed write is only logged. Auditing never
    /// changes the outcome of a command.
    pub fn record_or_warn(&self, action: &str, details: &str, result: &str) {
        if let Err(e) = self.record(action, details, result) {
            log::warn!("failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    /// Whole log, or `None` when nothing has been written yet.
    pub fn read(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }
        fs::read_to_string(&self.path).ok()
    }
}
