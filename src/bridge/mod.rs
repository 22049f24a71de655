//! Command bridge: typed access to the winget command-line tool

pub mod audit;
pub mod elevation;
pub mod executor;
pub mod interpret;
pub mod parser;
pub mod policy;
pub mod process;
pub mod scripts;
pub mod types;
pub mod verbs;

pub use executor::{CommandExecutor, LineChannel, LineEvent, SubscriptionId};
pub use process::ProcessExecutor;
pub use scripts::ScriptKind;
pub use types::{BridgeError, CommandResult, PackageDetail, PackageRecord};
pub use verbs::Verb;

use crate::config::Config;
use crate::view::PackageHealth;
use std::path::Path;
use std::sync::Arc;

/// One method per winget verb.
///
/// Listing verbs return package records, prose verbs return text, and
/// actions return the raw `CommandResult` so the caller can report the
/// outcome. `Err` only ever means the executor itself is unusable.
#[derive(Clone)]
pub struct WingetBridge {
    executor: Arc<dyn CommandExecutor>,
    list_source: String,
    include_unknown: bool,
}

impl WingetBridge {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &Config) -> Self {
        Self {
            executor,
            list_source: config.list_source.clone(),
            include_unknown: config.include_unknown,
        }
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }

    /// Run one verb. No retries; a failure is final for this request.
    pub async fn dispatch(&self, verb: Verb) -> Result<CommandResult, BridgeError> {
        let args = verb.args();
        log::debug!("dispatch {}: winget {}", verb.label(), args.join(" "));
        let result = self.executor.execute(args).await?;
        if !result.success {
            log::debug!("{} exited with {:?}", verb.label(), result.code);
        }
        Ok(result)
    }

    async fn packages(&self, verb: Verb) -> Result<Vec<PackageRecord>, BridgeError> {
        let result = self.dispatch(verb).await?;
        Ok(interpret::as_packages(&result))
    }

    async fn text(&self, verb: Verb) -> Result<String, BridgeError> {
        let result = self.dispatch(verb).await?;
        Ok(interpret::as_text(&result))
    }

    // ===== listings =====

    pub async fn search(&self, query: &str) -> Result<Vec<PackageRecord>, BridgeError> {
        self.packages(Verb::Search {
            query: query.to_string(),
        })
        .await
    }

    pub async fn list_installed(&self) -> Result<Vec<PackageRecord>, BridgeError> {
        self.packages(Verb::ListInstalled {
            source: self.list_source.clone(),
        })
        .await
    }

    pub async fn list_upgrades(&self) -> Result<Vec<PackageRecord>, BridgeError> {
        self.packages(Verb::ListUpgrades).await
    }

    // ===== actions =====

    pub async fn install(&self, id: &str) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::Install { id: id.to_string() }).await
    }

    pub async fn uninstall(&self, id: &str) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::Uninstall { id: id.to_string() }).await
    }

    pub async fn upgrade(&self, id: &str) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::Upgrade { id: id.to_string() }).await
    }

    /// Upgrade everything in one winget run. Per-package progress is only
    /// visible on the console stream.
    pub async fn upgrade_all(&self) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::UpgradeAll {
            include_unknown: self.include_unknown,
        })
        .await
    }

    pub async fn pin(&self, id: &str) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::Pin { id: id.to_string() }).await
    }

    pub async fn unpin(&self, id: &str) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::Unpin { id: id.to_string() }).await
    }

    pub async fn reset_sources(&self) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::ResetSources).await
    }

    pub async fn export(&self, path: &Path) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::export(path)).await
    }

    pub async fn import(&self, path: &Path) -> Result<CommandResult, BridgeError> {
        self.dispatch(Verb::import(path)).await
    }

    // ===== prose =====

    pub async fn show(&self, id: &str) -> Result<String, BridgeError> {
        self.text(Verb::Show { id: id.to_string() }).await
    }

    pub async fn show_details(&self, id: &str) -> Result<PackageDetail, BridgeError> {
        let result = self.dispatch(Verb::Show { id: id.to_string() }).await?;
        Ok(interpret::as_detail(&result))
    }

    pub async fn list_pins(&self) -> Result<String, BridgeError> {
        self.text(Verb::ListPins).await
    }

    pub async fn list_sources(&self) -> Result<String, BridgeError> {
        self.text(Verb::ListSources).await
    }

    // ===== environment =====

    pub async fn read_audit_log(&self) -> Option<String> {
        self.executor.read_audit_log().await
    }

    pub async fn check_elevation(&self) -> bool {
        self.executor.check_elevation().await
    }

    pub async fn request_elevation(&self) -> bool {
        self.executor.request_elevation().await
    }

    /// Script of one winget line per installed package.
    pub async fn script(&self, kind: ScriptKind) -> Result<String, BridgeError> {
        let installed = self.list_installed().await?;
        Ok(kind.build(&installed))
    }

    /// Installed / upgradable / pinned counts, fetched concurrently.
    pub async fn health(&self) -> Result<PackageHealth, BridgeError> {
        let (installed, upgrades, pins) =
            tokio::join!(self.list_installed(), self.list_upgrades(), self.list_pins());
        Ok(PackageHealth::new(
            installed?.len(),
            upgrades?.len(),
            parser::count_table_rows(&pins?),
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::executor::LineBus;
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Reply = (Duration, Result<CommandResult, String>);

    /// Scripted executor: records every argument list and answers from the
    /// keyed replies first, then from the queue.
    #[derive(Default)]
    pub struct FakeExecutor {
        pub replies: Mutex<VecDeque<Reply>>,
        /// (argument prefix, reply); each entry answers one matching call
        pub keyed: Mutex<Vec<(Vec<String>, Reply)>>,
        pub calls: Mutex<Vec<Vec<String>>>,
        pub bus: LineBus,
        pub elevated: bool,
        pub audit: Option<String>,
    }

    impl FakeExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, result: CommandResult) -> Self {
            self.reply_after(Duration::ZERO, result)
        }

        pub fn reply_after(self, delay: Duration, result: CommandResult) -> Self {
            self.replies.lock().unwrap().push_back((delay, Ok(result)));
            self
        }

        /// Answer the first call whose arguments start with `prefix`,
        /// whatever order the calls arrive in.
        pub fn reply_to(self, prefix: &[&str], delay: Duration, result: CommandResult) -> Self {
            let prefix = prefix.iter().map(|a| a.to_string()).collect();
            self.keyed.lock().unwrap().push((prefix, (delay, Ok(result))));
            self
        }

        fn take_reply(&self, args: &[String]) -> Option<Reply> {
            let mut keyed = self.keyed.lock().unwrap();
            if let Some(pos) = keyed.iter().position(|(prefix, _)| args.starts_with(prefix)) {
                return Some(keyed.remove(pos).1);
            }
            drop(keyed);
            self.replies.lock().unwrap().pop_front()
        }

        pub fn unreachable(self) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back((Duration::ZERO, Err("executor gone".into())));
            self
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandExecutor for FakeExecutor {
        async fn execute(&self, args: Vec<String>) -> Result<CommandResult, BridgeError> {
            let next = self.take_reply(&args);
            self.calls.lock().unwrap().push(args);
            let (delay, reply) = next.unwrap_or((Duration::ZERO, Ok(CommandResult::ok(""))));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply.map_err(BridgeError::Aborted)
        }

        fn subscribe(&self, channel: LineChannel, sender: mpsc::UnboundedSender<LineEvent>) -> SubscriptionId {
            self.bus.subscribe(channel, sender)
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.bus.unsubscribe(id);
        }

        async fn check_elevation(&self) -> bool {
            self.elevated
        }

        async fn request_elevation(&self) -> bool {
            true
        }

        async fn read_audit_log(&self) -> Option<String> {
            self.audit.clone()
        }
    }

    pub fn bridge(fake: FakeExecutor) -> (WingetBridge, Arc<FakeExecutor>) {
        let fake = Arc::new(fake);
        let bridge = WingetBridge::new(fake.clone(), &Config::default());
        (bridge, fake)
    }
}
