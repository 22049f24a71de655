//! Session-wide UI state: elevation, active view, loading, status line

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Search,
    Installed,
    Updates,
    Advanced,
}

impl View {
    pub const ALL: [View; 4] = [View::Search, View::Installed, View::Updates, View::Advanced];

    pub fn title(&self) -> &'static str {
        match self {
            View::Search => "Search",
            View::Installed => "Installed",
            View::Updates => "Updates",
            View::Advanced => "Advanced",
        }
    }

    pub fn next(self) -> Self {
        let idx = View::ALL.iter().position(|v| *v == self).unwrap_or(0);
        View::ALL[(idx + 1) % View::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = View::ALL.iter().position(|v| *v == self).unwrap_or(0);
        View::ALL[(idx + View::ALL.len() - 1) % View::ALL.len()]
    }
}

/// Handle for one tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Session {
    elevated: Option<bool>,
    view: View,
    status: String,
    next_ticket: u64,
    outstanding: HashSet<Ticket>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the startup check has answered.
    pub fn elevated(&self) -> Option<bool> {
        self.elevated
    }

    pub fn set_elevated(&mut self, elevated: bool) {
        self.elevated = Some(elevated);
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replace the status line.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Mark an operation as started and show `status`.
    pub fn begin(&mut self, status: impl Into<String>) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding.insert(ticket);
        self.set_status(status);
        ticket
    }

    /// Resolve an operation. Its status replaces whatever is shown, so the
    /// line always reflects the operation that resolved last.
    pub fn finish(&mut self, ticket: Ticket, status: impl Into<String>) {
        self.outstanding.remove(&ticket);
        self.set_status(status);
    }

    /// True while any tracked operation is still outstanding.
    pub fn loading(&self) -> bool {
        !self.outstanding.is_empty()
    }
}
