//! Background tasks: each one takes a ticket, runs on tokio, and reports
//! back through the `AppEvent` channel.

use super::state::{Action, App, AppEvent, DetailsPane, Target};
use crate::bridge::{CommandResult, ScriptKind, WingetBridge};
use crate::session::View;
use tokio::sync::mpsc;

pub fn check_elevation(bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let elevated = bridge.check_elevation().await;
        let _ = tx.send(AppEvent::ElevationChecked(elevated)).await;
    });
}

pub fn request_elevation(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    if app.session.elevated() == Some(true) {
        app.session.set_status("Already running as administrator.");
        return;
    }
    app.session.set_status("Requesting administrator rights...");
    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let started = bridge.request_elevation().await;
        let _ = tx.send(AppEvent::ElevationRequested(started)).await;
    });
}

/// Run the query typed into the search box. A blank query does nothing.
pub fn search(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    let query = app.query.content().trim().to_string();
    if query.is_empty() {
        return;
    }
    let ticket = app.session.begin(format!("Searching for \"{}\"...", query));
    app.search.pending = Some(ticket);
    app.search.selected = 0;

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match bridge.search(&query).await {
            Ok(packages) => AppEvent::Listed {
                ticket,
                view: View::Search,
                packages,
            },
            Err(e) => AppEvent::Failed {
                ticket,
                message: format!("Search failed: {}", e),
            },
        };
        let _ = tx.send(event).await;
    });
}

/// (Re)load the data behind `view`.
pub fn load_view(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, view: View) {
    match view {
        View::Search => search(app, bridge, tx),
        View::Installed | View::Updates => load_list(app, bridge, tx, view),
        View::Advanced => load_advanced(app, bridge, tx),
    }
}

fn load_list(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, view: View) {
    let status = if view == View::Installed {
        "Listing installed packages..."
    } else {
        "Checking for upgrades..."
    };
    let ticket = app.session.begin(status);
    if let Some(list) = app.list_mut(view) {
        list.pending = Some(ticket);
    }

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let listed = if view == View::Installed {
            bridge.list_installed().await
        } else {
            bridge.list_upgrades().await
        };
        let event = match listed {
            Ok(packages) => AppEvent::Listed { ticket, view, packages },
            Err(e) => AppEvent::Failed {
                ticket,
                message: format!("Listing failed: {}", e),
            },
        };
        let _ = tx.send(event).await;
    });
}

fn load_advanced(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    let ticket = app.session.begin("Loading sources, pins and audit log...");
    app.advanced.pending = Some(ticket);

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let (pins, sources, audit, health) = tokio::join!(
            bridge.list_pins(),
            bridge.list_sources(),
            bridge.read_audit_log(),
            bridge.health(),
        );
        let event = match (pins, sources) {
            (Ok(pins), Ok(sources)) => AppEvent::AdvancedLoaded {
                ticket,
                pins,
                sources,
                audit,
                health: health.map_err(|e| log::warn!("health check failed: {}", e)).ok(),
            },
            (Err(e), _) | (_, Err(e)) => AppEvent::Failed {
                ticket,
                message: format!("Loading advanced settings failed: {}", e),
            },
        };
        let _ = tx.send(event).await;
    });
}

/// Open the details pane for `target` and fetch `winget show` for it.
pub fn show_details(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, target: Target) {
    let ticket = app.session.begin(format!("Loading details for {}...", target.name));
    let id = target.id.clone();
    app.details = Some(DetailsPane {
        target,
        detail: None,
        ticket,
        scroll: 0,
    });

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match bridge.show_details(&id).await {
            Ok(detail) => AppEvent::DetailsLoaded { ticket, id, detail },
            Err(e) => AppEvent::Failed {
                ticket,
                message: format!("Loading details failed: {}", e),
            },
        };
        let _ = tx.send(event).await;
    });
}

/// Fetch the installed list and turn it into a reinstall or cleanup
/// script. The finished script is handed to the clipboard by the loop.
pub fn build_script(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, kind: ScriptKind) {
    let ticket = app.session.begin(format!("Building {}...", kind.label().to_lowercase()));

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match bridge.script(kind).await {
            Ok(script) => AppEvent::ScriptReady { ticket, kind, script },
            Err(e) => AppEvent::Failed {
                ticket,
                message: format!("{} failed: {}", kind.label(), e),
            },
        };
        let _ = tx.send(event).await;
    });
}

/// Start a state-changing action. Bulk upgrade is skipped while the
/// upgrade list is empty.
pub fn run_action(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, action: Action) {
    if action == Action::UpgradeAll && app.updates.packages.is_empty() {
        app.session.set_status("No upgrades to apply.");
        return;
    }
    let ticket = app.session.begin(action.start_status());

    let bridge = bridge.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = execute(&bridge, &action).await;
        let event = match outcome {
            Ok(result) => AppEvent::ActionFinished { ticket, action, result },
            Err(e) => AppEvent::Failed {
                ticket,
                message: format!("{} aborted: {}", action.start_status().trim_end_matches("..."), e),
            },
        };
        let _ = tx.send(event).await;
    });
}

async fn execute(bridge: &WingetBridge, action: &Action) -> Result<CommandResult, crate::bridge::BridgeError> {
    match action {
        Action::Install(t) => bridge.install(&t.id).await,
        Action::Uninstall(t) => bridge.uninstall(&t.id).await,
        Action::Upgrade(t) => bridge.upgrade(&t.id).await,
        Action::UpgradeAll => bridge.upgrade_all().await,
        Action::Pin(t) => bridge.pin(&t.id).await,
        Action::Unpin(t) => bridge.unpin(&t.id).await,
        Action::ResetSources => bridge.reset_sources().await,
        Action::Export(path) => bridge.export(path).await,
        Action::Import(path) => bridge.import(path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{bridge, FakeExecutor};
    use crate::bridge::PackageRecord;
    use crate::config::Config;
    use crate::tui::input::InputBox;
    use std::time::Duration;

    async fn settle(app: &mut App, rx: &mut mpsc::Receiver<AppEvent>, events: usize) -> Vec<Option<View>> {
        let mut reloads = Vec::new();
        for _ in 0..events {
            let event = rx.recv().await.expect("event");
            reloads.push(app.apply(event));
        }
        reloads
    }

    #[tokio::test]
    async fn status_reflects_the_operation_that_resolved_last() {
        let (bridge, fake) = bridge(
            FakeExecutor::new()
                .reply_to(
                    &["search"],
                    Duration::from_millis(60),
                    CommandResult::ok(r#"[{"Id":"Mozilla.Firefox","Name":"Mozilla Firefox","Version":"120.0"}]"#),
                )
                .reply_to(
                    &["upgrade", "--all"],
                    Duration::from_millis(5),
                    CommandResult::ok("Successfully installed"),
                ),
        );
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        app.updates.packages = vec![PackageRecord::new("Git.Git", "Git", "2.42.0")];

        app.query = InputBox::with_content("firefox");
        search(&mut app, &bridge, &tx);
        run_action(&mut app, &bridge, &tx, Action::UpgradeAll);
        assert_eq!(app.session.status(), "Starting bulk upgrade...");
        assert!(app.session.loading());

        let reloads = settle(&mut app, &mut rx, 1).await;
        assert_eq!(reloads, [Some(View::Updates)]);
        assert_eq!(app.session.status(), "Bulk upgrade completed.");
        assert!(app.session.loading());

        settle(&mut app, &mut rx, 1).await;
        assert_eq!(app.session.status(), "Found 1 packages.");
        assert!(!app.session.loading());
        assert_eq!(app.search.packages[0].id, "Mozilla.Firefox");
        let calls = fake.calls();
        assert!(calls.iter().any(|c| c[..3] == ["upgrade", "--all", "--include-unknown"]));
        assert!(calls.iter().any(|c| c[..] == ["search", "firefox"]));
    }

    #[tokio::test]
    async fn blank_query_starts_nothing() {
        let (bridge, fake) = bridge(FakeExecutor::new());
        let (tx, _rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        app.query = InputBox::with_content("   ");
        search(&mut app, &bridge, &tx);
        assert!(!app.session.loading());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn bulk_upgrade_needs_pending_upgrades() {
        let (bridge, fake) = bridge(FakeExecutor::new());
        let (tx, _rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        run_action(&mut app, &bridge, &tx, Action::UpgradeAll);
        assert_eq!(app.session.status(), "No upgrades to apply.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn unreachable_executor_resolves_with_failure() {
        let (bridge, _) = bridge(FakeExecutor::new().unreachable());
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        load_view(&mut app, &bridge, &tx, View::Installed);

        settle(&mut app, &mut rx, 1).await;
        assert!(!app.session.loading());
        assert!(app.session.status().starts_with("Listing failed"));
        assert!(app.installed.packages.is_empty());
    }

    #[tokio::test]
    async fn reinstall_script_reaches_clipboard_slot() {
        let (bridge, _) = bridge(FakeExecutor::new().reply(CommandResult::ok(
            r#"[{"Id":"Git.Git","Name":"Git","Version":"2.43.0"},{"Id":"7zip.7zip","Name":"7-Zip","Version":"23.01"}]"#,
        )));
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        build_script(&mut app, &bridge, &tx, ScriptKind::Reinstall);
        assert_eq!(app.session.status(), "Building reinstall script...");

        settle(&mut app, &mut rx, 1).await;
        let (text, _) = app.clipboard.take().unwrap();
        assert_eq!(text, "winget install --id Git.Git -e\nwinget install --id 7zip.7zip -e");
    }

    #[tokio::test]
    async fn details_land_in_open_pane() {
        let (bridge, _) = bridge(FakeExecutor::new().reply(CommandResult::ok(
            "Found Git [Git.Git]\nVersion: 2.43.0\nPublisher: The Git Development Community\n",
        )));
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        let target = Target::from(&PackageRecord::new("Git.Git", "Git", "2.43.0"));
        show_details(&mut app, &bridge, &tx, target);

        settle(&mut app, &mut rx, 1).await;
        let pane = app.details.as_ref().unwrap();
        assert_eq!(pane.detail.as_ref().unwrap().get("Version"), Some("2.43.0"));
        assert_eq!(app.session.status(), "Loaded details for Git.Git.");
    }
}
