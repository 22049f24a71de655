//! Default executor: runs winget as a child process
//!
//! stdout and stderr are drained on two threads so that a chatty stderr
//! cannot stall stdout. Streamable commands publish every line to the line
//! bus as it arrives; the captured text is returned once the child exits.

use super::audit::AuditLog;
use super::elevation;
use super::executor::{CommandExecutor, LineBus, LineChannel, LineEvent, SubscriptionId};
use super::parser::{clean_terminal_output, is_progress_noise, parse_package_table};
use super::policy::{is_command_allowed, is_package_listing, is_streamable};
use super::types::{BridgeError, CommandResult};
use crate::config::Config;
use async_trait::async_trait;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::sync::mpsc;

const BLOCKED_MESSAGE: &str = "Command blocked by security policy";

/// Force UTF-8 so package names survive the pipe.
const PWSH_UTF8_PRELUDE: &str = "$OutputEncoding = [Console]::InputEncoding = [Console]::OutputEncoding = New-Object System.Text.UTF8Encoding;";

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    use_powershell: bool,
    audit: AuditLog,
    bus: Arc<LineBus>,
}

impl ProcessExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.program.clone(),
            use_powershell: config.use_powershell,
            audit: AuditLog::new(config.audit_log.clone()),
            bus: Arc::new(LineBus::new()),
        }
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn build_command(&self, args: &[String]) -> Command {
        let mut cmd = if self.use_powershell {
            let mut cmd = Command::new("pwsh");
            let script = format!("{} {}", PWSH_UTF8_PRELUDE, self.command_line(&quote_all(args)));
            cmd.args(["-NoProfile", "-NonInteractive", "-Command", &script]);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(args);
            cmd
        };
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        configure_child(&mut cmd);
        cmd
    }

    /// Blocking body of `execute`; runs on the blocking pool.
    fn run_blocking(&self, args: Vec<String>) -> Result<CommandResult, BridgeError> {
        let command_line = self.command_line(&args);

        if !is_command_allowed(&args) {
            log::warn!("refusing to run `{}`", command_line);
            self.audit
                .record_or_warn("BLOCKED", &command_line, "Security violation: command not allowed");
            return Ok(CommandResult::failed(BLOCKED_MESSAGE, -1));
        }

        let streamable = is_streamable(&args);
        log::debug!("running `{}` (streamable: {})", command_line, streamable);

        let mut child = match self.build_command(&args).spawn() {
            Ok(child) => child,
            Err(e) => {
                self.audit.record_or_warn("ERROR", &command_line, &e.to_string());
                return Err(BridgeError::Spawn {
                    program: self.program.clone(),
                    source: e,
                });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let bus = streamable.then(|| Arc::clone(&self.bus));
        let stdout_handle = std::thread::spawn(move || read_stream_lines(stdout, bus, LineChannel::Stdout));
        let bus = streamable.then(|| Arc::clone(&self.bus));
        let stderr_handle = std::thread::spawn(move || read_stream_lines(stderr, bus, LineChannel::Stderr));

        let all_stdout = stdout_handle.join().unwrap_or_default();
        let all_stderr = stderr_handle.join().unwrap_or_default();

        let status = child.wait().map_err(|e| BridgeError::Io {
            program: self.program.clone(),
            source: e,
        })?;
        let success = status.success();
        let code = status.code().unwrap_or(0);

        self.audit.record_or_warn(
            "EXECUTE",
            &command_line,
            if success { "SUCCESS" } else { "FAILURE" },
        );

        let mut output = all_stdout;
        if success && is_package_listing(&args) {
            let upgrade_listing = args.first().is_some_and(|a| a == "upgrade");
            let packages = parse_package_table(&output, upgrade_listing);
            match serde_json::to_string(&packages) {
                Ok(json) => output = json,
                Err(e) => log::warn!("failed to encode package table: {}", e),
            }
        }

        let error = if success {
            None
        } else if all_stderr.trim().is_empty() {
            // winget reports most failures on stdout
            Some(clean_terminal_output(&output))
        } else {
            Some(all_stderr)
        };

        Ok(CommandResult {
            success,
            output: Some(output),
            error,
            code: Some(code),
        })
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, args: Vec<String>) -> Result<CommandResult, BridgeError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.run_blocking(args))
            .await
            .map_err(|e| BridgeError::Aborted(e.to_string()))?
    }

    fn subscribe(&self, channel: LineChannel, sender: mpsc::UnboundedSender<LineEvent>) -> SubscriptionId {
        self.bus.subscribe(channel, sender)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }

    async fn check_elevation(&self) -> bool {
        tokio::task::spawn_blocking(elevation::is_elevated)
            .await
            .unwrap_or(false)
    }

    async fn request_elevation(&self) -> bool {
        tokio::task::spawn_blocking(elevation::request_elevation)
            .await
            .unwrap_or(false)
    }

    async fn read_audit_log(&self) -> Option<String> {
        let audit = self.audit.clone();
        tokio::task::spawn_blocking(move || audit.read())
            .await
            .ok()
            .flatten()
    }
}

/// Single-quote arguments for the PowerShell command string.
fn quote_all(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|a| {
            if a.chars().all(|c| c.is_ascii_alphanumeric() || "-._".contains(c)) {
                a.clone()
            } else {
                format!("'{}'", a.replace('\'', "''"))
            }
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn configure_child(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.pre_exec(|| {
            // do not outlive the front end
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }
}

#[cfg(windows)]
fn configure_child(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(any(target_os = "linux", windows)))]
fn configure_child(_cmd: &mut Command) {}

/// Read `stream` to the end, returning everything it produced.
///
/// `\n`-terminated lines are cleaned and, when a bus is given, published on
/// `channel`. Text followed by a bare `\r` is a spinner or progress redraw;
/// it is overwritten by whatever comes next and never published.
fn read_stream_lines(stream: Option<impl Read>, bus: Option<Arc<LineBus>>, channel: LineChannel) -> String {
    let mut result = String::new();
    let Some(mut reader) = stream else {
        return result;
    };

    let emit = |raw: &str, result: &mut String| {
        let cleaned = clean_terminal_output(raw);
        if is_progress_noise(&cleaned) {
            return;
        }
        if let Some(bus) = &bus {
            bus.publish(LineEvent {
                channel,
                text: cleaned.clone(),
            });
        }
        result.push_str(&cleaned);
        result.push('\n');
    };

    let mut buffer = [0u8; 1024];
    let mut pending: Vec<u8> = Vec::new();
    let mut line_buffer = String::new();
    let mut carriage = false;

    while let Ok(n) = reader.read(&mut buffer) {
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buffer[..n]);
        // hold back an incomplete UTF-8 sequence split across reads
        let valid_up_to = match std::str::from_utf8(&pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        let chunk = String::from_utf8_lossy(&pending[..valid_up_to]).into_owned();
        pending.drain(..valid_up_to);

        for c in chunk.chars() {
            match c {
                '\n' => {
                    emit(&line_buffer, &mut result);
                    line_buffer.clear();
                    carriage = false;
                }
                '\r' => carriage = true,
                _ => {
                    if carriage {
                        line_buffer.clear();
                        carriage = false;
                    }
                    line_buffer.push(c);
                }
            }
        }
    }
    if !pending.is_empty() {
        line_buffer.push_str(&String::from_utf8_lossy(&pending));
    }
    if !line_buffer.is_empty() && !carriage {
        emit(&line_buffer, &mut result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with_receiver(channel: LineChannel) -> (Arc<LineBus>, mpsc::UnboundedReceiver<LineEvent>) {
        let bus = Arc::new(LineBus::new());
        let (tx, rx) = mpsc::unbounded_channel();
        bus.subscribe(channel, tx);
        (bus, rx)
    }

    #[test]
    fn publishes_lines_in_order_and_drops_redraws() {
        let (bus, mut rx) = bus_with_receiver(LineChannel::Stdout);
        let input: &[u8] = b"Found Git [Git.Git]\r\n  -\r  \\\r  |\rDownloading\n\x1b[32mSuccessfully installed\x1b[0m";
        let captured = read_stream_lines(Some(input), Some(bus), LineChannel::Stdout);

        assert_eq!(rx.try_recv().unwrap().text, "Found Git [Git.Git]");
        assert_eq!(rx.try_recv().unwrap().text, "Downloading");
        assert_eq!(rx.try_recv().unwrap().text, "Successfully installed");
        assert!(rx.try_recv().is_err());
        assert_eq!(captured, "Found Git [Git.Git]\nDownloading\nSuccessfully installed\n");
    }

    #[test]
    fn without_bus_only_captures() {
        let input: &[u8] = b"Name Id\n";
        let captured = read_stream_lines(Some(input), None, LineChannel::Stderr);
        assert_eq!(captured, "Name Id\n");
    }

    #[test]
    fn keeps_multibyte_chars_split_across_reads() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }
        let text = "Visual Studio Code…\n";
        let captured = read_stream_lines(Some(Trickle(text.as_bytes())), None, LineChannel::Stdout);
        assert_eq!(captured, text);
    }

    #[test]
    fn quotes_arguments_for_powershell() {
        let args = vec!["export".to_string(), "-o".to_string(), "C:\\My Files\\pkgs.json".to_string()];
        assert_eq!(quote_all(&args), ["export", "-o", "'C:\\My Files\\pkgs.json'"]);
    }
}
