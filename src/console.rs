//! Live console: the running tool's output lines, classified and buffered
//!
//! Both executor channels feed one queue, so lines are appended one at a
//! time in arrival order. Order is kept within a channel; stdout and stderr
//! lines may interleave.

use crate::bridge::{CommandExecutor, LineChannel, LineEvent, SubscriptionId};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Output,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub severity: Severity,
}

/// stderr is always an error. On stdout, any mention of "successfully"
/// marks a success line.
pub fn classify(event: &LineEvent) -> Severity {
    match event.channel {
        LineChannel::Stderr => Severity::Error,
        LineChannel::Stdout if event.text.to_lowercase().contains("successfully") => Severity::Success,
        LineChannel::Stdout => Severity::Output,
    }
}

/// Reducer: the buffer after one more line has arrived.
pub fn apply(mut buffer: Vec<ConsoleLine>, event: LineEvent) -> Vec<ConsoleLine> {
    let severity = classify(&event);
    buffer.push(ConsoleLine {
        text: event.text,
        severity,
    });
    buffer
}

struct Subscription {
    executor: Arc<dyn CommandExecutor>,
    ids: [SubscriptionId; 2],
    rx: mpsc::UnboundedReceiver<LineEvent>,
}

#[derive(Default)]
pub struct ConsoleStream {
    lines: Vec<ConsoleLine>,
    subscription: Option<Subscription>,
}

impl ConsoleStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening to both channels. Calling it again while active does
    /// nothing.
    pub fn activate(&mut self, executor: Arc<dyn CommandExecutor>) {
        if self.subscription.is_some() {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let ids = [
            executor.subscribe(LineChannel::Stdout, tx.clone()),
            executor.subscribe(LineChannel::Stderr, tx),
        ];
        self.subscription = Some(Subscription { executor, ids, rx });
    }

    /// Stop listening. Lines already buffered stay; lines still queued are
    /// dropped.
    pub fn deactivate(&mut self) {
        if let Some(sub) = self.subscription.take() {
            for id in sub.ids {
                sub.executor.unsubscribe(id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn append(&mut self, event: LineEvent) {
        let lines = std::mem::take(&mut self.lines);
        self.lines = apply(lines, event);
    }

    /// Move every queued line into the buffer. Returns how many arrived.
    pub fn drain(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(sub) = self.subscription.as_mut() {
            while let Ok(event) = sub.rx.try_recv() {
                pending.push(event);
            }
        }
        let count = pending.len();
        for event in pending {
            self.append(event);
        }
        count
    }

    pub fn clear(&mut self) {
        self.lines = Vec::new();
    }

    /// All buffered text, one line per row.
    pub fn copy(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Drop for ConsoleStream {
    fn drop(&mut self) {
        self.deactivate();
    }
}
