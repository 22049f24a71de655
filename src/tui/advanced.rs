//! Advanced view: sources, pins, audit log, package health, import/export

use super::actions;
use super::input::InputBox;
use super::layout;
use super::state::{AdvancedPanel, App, AppEvent, Prompt, PromptKind};
use super::theme;
use crate::bridge::scripts::SCHEDULED_UPGRADE_COMMAND;
use crate::bridge::{ScriptKind, WingetBridge};
use crate::session::View;
use crate::view::PackageHealth;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

pub const HINTS: &str =
    "←→ panel | ↑↓ scroll | r reload | e export | m import | R reset sources | I/C reinstall/cleanup script | S schedule";

/// Advanced view keys. Scripts and the schedule command go to the
/// clipboard; source reset asks for confirmation first.
pub fn handle_advanced_key(key: KeyEvent, app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    match key.code {
        KeyCode::Right | KeyCode::Char('l') => {
            app.advanced.panel = app.advanced.panel.next();
            app.advanced.scroll = 0;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            app.advanced.panel = app.advanced.panel.next().next();
            app.advanced.scroll = 0;
        }
        KeyCode::Up | KeyCode::Char('k') => app.advanced.scroll = app.advanced.scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => app.advanced.scroll += 1,
        KeyCode::Char('r') => actions::load_view(app, bridge, tx, View::Advanced),
        KeyCode::Char('R') => {
            app.prompt = Some(Prompt {
                kind: PromptKind::ConfirmReset,
                input: InputBox::new(),
            });
        }
        KeyCode::Char('I') => actions::build_script(app, bridge, tx, ScriptKind::Reinstall),
        KeyCode::Char('C') => actions::build_script(app, bridge, tx, ScriptKind::Cleanup),
        KeyCode::Char('S') => {
            app.clipboard = Some((
                SCHEDULED_UPGRADE_COMMAND.to_string(),
                "Schedule command copied to clipboard!".to_string(),
            ));
        }
        KeyCode::Char('e') => {
            app.prompt = Some(Prompt {
                kind: PromptKind::ExportPath,
                input: InputBox::with_content("winget-packages.json"),
            });
        }
        KeyCode::Char('m') => {
            app.prompt = Some(Prompt {
                kind: PromptKind::ImportPath,
                input: InputBox::new(),
            });
        }
        _ => {}
    }
}

/// One-line summary of the last health check.
fn health_line(health: Option<&PackageHealth>) -> Line<'static> {
    let Some(h) = health else {
        return Line::styled(" Package health: not checked yet", Style::default().fg(theme::DIM));
    };
    Line::from(vec![
        Span::styled(" Package health: ", Style::default().fg(theme::ACCENT)),
        Span::raw(format!("{} installed  ", h.installed)),
        Span::styled(
            format!("{}% up to date  ", h.up_to_date_percent()),
            Style::default().fg(theme::SUCCESS),
        ),
        Span::styled(
            format!("{}% upgradable ({})  ", h.upgrades_percent(), h.upgrades),
            Style::default().fg(theme::WARN),
        ),
        Span::styled(
            format!("{}% pinned ({})", h.pinned_percent(), h.pinned),
            Style::default().fg(theme::DIM),
        ),
    ])
}

/// Health line and panel tabs on top, the selected panel's text below.
pub fn render_advanced(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let mut tabs = Vec::new();
    for panel in AdvancedPanel::ALL {
        let style = if panel == app.advanced.panel {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::DIM)
        };
        tabs.push(Span::styled(format!(" {} ", panel.title()), style));
        tabs.push(Span::raw(" "));
    }
    if app.advanced.pending.is_some() {
        tabs.push(Span::styled(" loading...", Style::default().fg(theme::WARN)));
    }
    let top = Paragraph::new(vec![health_line(app.advanced.health.as_ref()), Line::from(tabs)])
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(top, chunks[0]);

    let text = app.advanced.panel_text();
    let lines: Vec<Line> = if text.trim().is_empty() {
        let empty = match app.advanced.panel {
            AdvancedPanel::AuditLog => "No audit log yet.",
            AdvancedPanel::Pins => "No pinned packages.",
            AdvancedPanel::Sources => "No sources loaded. Press r to reload.",
        };
        vec![Line::styled(empty, Style::default().fg(theme::DIM))]
    } else {
        text.lines().map(|l| Line::raw(l.to_string())).collect()
    };
    layout::render_scrollable_content(
        f,
        app.advanced.panel.title(),
        lines,
        app.advanced.scroll,
        Color::Yellow,
        chunks[1],
    );
}
