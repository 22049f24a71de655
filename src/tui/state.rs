use super::input::InputBox;
use crate::bridge::{CommandResult, PackageDetail, PackageRecord, ScriptKind};
use crate::config::Config;
use crate::console::ConsoleStream;
use crate::session::{Session, Ticket, View};
use crate::view::{FilterSortSpec, PackageHealth};
use std::path::PathBuf;

// ========== actions ==========

/// Package a user action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub name: String,
}

impl From<&PackageRecord> for Target {
    fn from(record: &PackageRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
        }
    }
}

/// A state-changing winget run started from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Install(Target),
    Uninstall(Target),
    Upgrade(Target),
    UpgradeAll,
    Pin(Target),
    Unpin(Target),
    ResetSources,
    Export(PathBuf),
    Import(PathBuf),
}

impl Action {
    pub fn start_status(&self) -> String {
        match self {
            Action::Install(t) => format!("Installing {}...", t.name),
            Action::Uninstall(t) => format!("Uninstalling {}...", t.name),
            Action::Upgrade(t) => format!("Upgrading {}...", t.name),
            Action::UpgradeAll => "Starting bulk upgrade...".to_string(),
            Action::Pin(t) => format!("Pinning {}...", t.name),
            Action::Unpin(t) => format!("Unpinning {}...", t.name),
            Action::ResetSources => "Resetting sources...".to_string(),
            Action::Export(path) => format!("Exporting packages to {}...", path.display()),
            Action::Import(path) => format!("Importing packages from {}...", path.display()),
        }
    }

    pub fn finish_status(&self, result: &CommandResult) -> String {
        let label = match self {
            Action::Install(t) => format!("Install of {}", t.name),
            Action::Uninstall(t) => format!("Uninstall of {}", t.name),
            Action::Upgrade(t) => format!("Upgrade of {}", t.name),
            Action::UpgradeAll => "Bulk upgrade".to_string(),
            Action::Pin(t) => format!("Pin of {}", t.name),
            Action::Unpin(t) => format!("Unpin of {}", t.name),
            Action::ResetSources => "Source reset".to_string(),
            Action::Export(_) => "Export".to_string(),
            Action::Import(_) => "Import".to_string(),
        };
        result.summary(&label)
    }

    /// View whose data is stale once the action has run.
    pub fn refreshes(&self) -> Option<View> {
        match self {
            Action::Install(_) | Action::Uninstall(_) | Action::Import(_) => Some(View::Installed),
            Action::Upgrade(_) | Action::UpgradeAll => Some(View::Updates),
            Action::Pin(_) | Action::Unpin(_) | Action::ResetSources => Some(View::Advanced),
            Action::Export(_) => None,
        }
    }
}

// ========== events ==========

#[derive(Debug)]
pub enum AppEvent {
    ElevationChecked(bool),
    ElevationRequested(bool),
    Listed {
        ticket: Ticket,
        view: View,
        packages: Vec<PackageRecord>,
    },
    ActionFinished {
        ticket: Ticket,
        action: Action,
        result: CommandResult,
    },
    DetailsLoaded {
        ticket: Ticket,
        id: String,
        detail: PackageDetail,
    },
    AdvancedLoaded {
        ticket: Ticket,
        pins: String,
        sources: String,
        audit: Option<String>,
        health: Option<PackageHealth>,
    },
    ScriptReady {
        ticket: Ticket,
        kind: ScriptKind,
        script: String,
    },
    /// The executor itself could not run the request.
    Failed { ticket: Ticket, message: String },
}

// ========== sub-state ==========

#[derive(Debug, Default)]
pub struct PackageList {
    pub packages: Vec<PackageRecord>,
    pub spec: FilterSortSpec,
    pub selected: usize,
    /// Latest request; older replies are dropped.
    pub pending: Option<Ticket>,
}

impl PackageList {
    pub fn visible(&self) -> Vec<&PackageRecord> {
        self.spec.apply(&self.packages)
    }

    pub fn selected_record(&self) -> Option<&PackageRecord> {
        self.visible().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    Filter,
    ExportPath,
    ImportPath,
    /// y/N before `source reset --force`
    ConfirmReset,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Search => "Search:",
            PromptKind::Filter => "Filter:",
            PromptKind::ExportPath => "Export to:",
            PromptKind::ImportPath => "Import from:",
            PromptKind::ConfirmReset => "Reset all winget sources to their defaults? (y/N)",
        }
    }
}

/// Only an explicit `y` confirms.
pub fn confirmed(answer: char) -> bool {
    answer.eq_ignore_ascii_case(&'y')
}

#[derive(Debug)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: InputBox,
}

/// Answer of the path prompt: `None` when nothing usable was entered.
pub fn picked_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

#[derive(Debug)]
pub struct DetailsPane {
    pub target: Target,
    pub detail: Option<PackageDetail>,
    pub ticket: Ticket,
    pub scroll: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancedPanel {
    #[default]
    Sources,
    Pins,
    AuditLog,
}

impl AdvancedPanel {
    pub const ALL: [AdvancedPanel; 3] = [AdvancedPanel::Sources, AdvancedPanel::Pins, AdvancedPanel::AuditLog];

    pub fn title(&self) -> &'static str {
        match self {
            AdvancedPanel::Sources => "Sources",
            AdvancedPanel::Pins => "Pins",
            AdvancedPanel::AuditLog => "Audit log",
        }
    }

    pub fn next(self) -> Self {
        match self {
            AdvancedPanel::Sources => AdvancedPanel::Pins,
            AdvancedPanel::Pins => AdvancedPanel::AuditLog,
            AdvancedPanel::AuditLog => AdvancedPanel::Sources,
        }
    }
}

#[derive(Debug, Default)]
pub struct AdvancedState {
    pub panel: AdvancedPanel,
    pub sources: String,
    pub pins: String,
    pub audit: Option<String>,
    pub health: Option<PackageHealth>,
    pub scroll: usize,
    pub pending: Option<Ticket>,
}

impl AdvancedState {
    pub fn panel_text(&self) -> &str {
        match self.panel {
            AdvancedPanel::Sources => &self.sources,
            AdvancedPanel::Pins => &self.pins,
            AdvancedPanel::AuditLog => self.audit.as_deref().unwrap_or(""),
        }
    }
}

// ========== App ==========

pub struct App {
    pub session: Session,
    pub console: ConsoleStream,
    pub query: InputBox,
    pub search: PackageList,
    pub installed: PackageList,
    pub updates: PackageList,
    pub advanced: AdvancedState,
    pub prompt: Option<Prompt>,
    pub details: Option<DetailsPane>,
    pub console_scroll_back: usize,
    /// Text waiting for the clipboard, with the status to show once copied
    pub clipboard: Option<(String, String)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let mut app = Self {
            session: Session::new(),
            console: ConsoleStream::new(),
            query: InputBox::new(),
            search: PackageList::default(),
            installed: PackageList::default(),
            updates: PackageList::default(),
            advanced: AdvancedState::default(),
            prompt: None,
            details: None,
            console_scroll_back: 0,
            clipboard: None,
            should_quit: false,
        };
        for list in [&mut app.search, &mut app.installed, &mut app.updates] {
            list.spec.sort = config.default_sort;
        }
        app.session.set_status("Ready");
        app
    }

    pub fn list(&self, view: View) -> Option<&PackageList> {
        match view {
            View::Search => Some(&self.search),
            View::Installed => Some(&self.installed),
            View::Updates => Some(&self.updates),
            View::Advanced => None,
        }
    }

    pub fn list_mut(&mut self, view: View) -> Option<&mut PackageList> {
        match view {
            View::Search => Some(&mut self.search),
            View::Installed => Some(&mut self.installed),
            View::Updates => Some(&mut self.updates),
            View::Advanced => None,
        }
    }

    pub fn current_list(&self) -> Option<&PackageList> {
        self.list(self.session.view())
    }

    pub fn current_list_mut(&mut self) -> Option<&mut PackageList> {
        self.list_mut(self.session.view())
    }

    /// Fold one background result into the state. Returns a view to reload
    /// when the event made its data stale.
    pub fn apply(&mut self, event: AppEvent) -> Option<View> {
        match event {
            AppEvent::ElevationChecked(elevated) => {
                self.session.set_elevated(elevated);
                None
            }
            AppEvent::ElevationRequested(started) => {
                self.session.set_status(if started {
                    "Elevated instance requested."
                } else {
                    "Could not request elevation."
                });
                None
            }
            AppEvent::Listed {
                ticket,
                view,
                packages,
            } => {
                let status = listed_status(view, packages.len());
                if let Some(list) = self.list_mut(view) {
                    if list.pending == Some(ticket) {
                        list.packages = packages;
                        list.pending = None;
                        list.clamp_selection();
                    }
                }
                self.session.finish(ticket, status);
                None
            }
            AppEvent::ActionFinished { ticket, action, result } => {
                self.session.finish(ticket, action.finish_status(&result));
                action.refreshes()
            }
            AppEvent::DetailsLoaded { ticket, id, detail } => {
                if let Some(pane) = self.details.as_mut() {
                    if pane.ticket == ticket && pane.target.id == id {
                        pane.detail = Some(detail);
                    }
                }
                self.session.finish(ticket, format!("Loaded details for {}.", id));
                None
            }
            AppEvent::AdvancedLoaded {
                ticket,
                pins,
                sources,
                audit,
                health,
            } => {
                if self.advanced.pending == Some(ticket) {
                    self.advanced.pins = pins;
                    self.advanced.sources = sources;
                    self.advanced.audit = audit;
                    if health.is_some() {
                        self.advanced.health = health;
                    }
                    self.advanced.pending = None;
                }
                self.session.finish(ticket, "Advanced settings loaded.");
                None
            }
            AppEvent::ScriptReady { ticket, kind, script } => {
                if script.is_empty() {
                    self.session.finish(ticket, "No installed packages found.");
                } else {
                    self.session.finish(ticket, format!("{} ready.", kind.label()));
                    self.clipboard = Some((script, format!("{} copied to clipboard!", kind.label())));
                }
                None
            }
            AppEvent::Failed { ticket, message } => {
                log::warn!("{}", message);
                for list in [&mut self.search, &mut self.installed, &mut self.updates] {
                    if list.pending == Some(ticket) {
                        list.pending = None;
                    }
                }
                if self.advanced.pending == Some(ticket) {
                    self.advanced.pending = None;
                }
                self.session.finish(ticket, message);
                None
            }
        }
    }
}

pub fn listed_status(view: View, count: usize) -> String {
    match view {
        View::Search if count == 0 => "No packages found.".to_string(),
        View::Search => format!("Found {} packages.", count),
        View::Installed => format!("Found {} installed packages.", count),
        View::Updates => format!("Found {} available upgrades.", count),
        View::Advanced => format!("Found {} entries.", count),
    }
}
