//! The executor seam: how the bridge reaches the winget process, and the
//! line bus that carries its live output.

use super::types::{BridgeError, CommandResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Which pipe of the running tool a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineChannel {
    Stdout,
    Stderr,
}

/// One line of live output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub channel: LineChannel,
    pub text: String,
}

impl LineEvent {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            channel: LineChannel::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            channel: LineChannel::Stderr,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Runs the external tool and relays its output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run winget with `args` and wait for it to exit.
    async fn execute(&self, args: Vec<String>) -> Result<CommandResult, BridgeError>;

    /// Deliver every line produced on `channel` to `sender`.
    fn subscribe(&self, channel: LineChannel, sender: mpsc::UnboundedSender<LineEvent>) -> SubscriptionId;

    /// Stop delivering to a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    async fn check_elevation(&self) -> bool;

    /// Ask the platform to relaunch elevated. `true` means the request was
    /// accepted, not that the new process is running.
    async fn request_elevation(&self) -> bool;

    async fn read_audit_log(&self) -> Option<String>;
}

/// Fan-out of line events to subscribers.
///
/// Senders that have been dropped on the receiving side are pruned on the
/// next publish.
#[derive(Debug, Default)]
pub struct LineBus {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, (LineChannel, mpsc::UnboundedSender<LineEvent>)>>,
}

impl LineBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: LineChannel, sender: mpsc::UnboundedSender<LineEvent>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.insert(id, (channel, sender));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.remove(&id);
        }
    }

    pub fn publish(&self, event: LineEvent) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        subs.retain(|_, (channel, sender)| {
            if *channel != event.channel {
                return !sender.is_closed();
            }
            sender.send(event.clone()).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_routes_by_channel() {
        let bus = LineBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe(LineChannel::Stderr, tx);

        bus.publish(LineEvent::stdout("ignored"));
        bus.publish(LineEvent::stderr("kept"));

        assert_eq!(rx.try_recv().unwrap(), LineEvent::stderr("kept"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = LineBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = bus.subscribe(LineChannel::Stdout, tx);
        bus.unsubscribe(id);
        bus.unsubscribe(id);

        bus.publish(LineEvent::stdout("late"));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receivers_are_pruned() {
        let bus = LineBus::new();
        let (tx, rx) = mpsc::unbounded_channel();
        bus.subscribe(LineChannel::Stdout, tx);
        drop(rx);

        bus.publish(LineEvent::stdout("nobody listens"));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
