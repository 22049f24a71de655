mod bridge;
mod config;
mod console;
mod session;
mod tui;
mod view;

use anyhow::Result;
use bridge::{ProcessExecutor, WingetBridge};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = config::Config::load_or_default()?;
    log::info!(
        "using {} (powershell: {}), audit log at {}",
        config.program,
        config.use_powershell,
        config.audit_log.display()
    );

    let executor = Arc::new(ProcessExecutor::new(&config));
    let bridge = WingetBridge::new(executor, &config);

    tui::run(config, bridge).await?;

    Ok(())
}
