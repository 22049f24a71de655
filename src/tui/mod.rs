mod actions;
mod advanced;
pub mod input;
mod layout;
mod packages;
pub mod state;
mod theme;

use crate::bridge::WingetBridge;
use crate::config::Config;
use crate::console::Severity;
use crate::session::View;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    Frame, Terminal,
};
use state::{confirmed, picked_path, Action, App, AppEvent, PromptKind};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Set up the terminal, run the event loop, and restore the terminal even
/// when the loop fails.
pub async fn run(config: Config, bridge: WingetBridge) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config);
    app.console.activate(bridge.executor().clone());

    let (tx, mut rx) = mpsc::channel(32);

    // elevation is checked once per session
    actions::check_elevation(&bridge, &tx);

    let result = event_loop(&mut terminal, &mut app, &bridge, &tx, &mut rx).await;

    app.console.deactivate();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// One tick: drain console lines, draw, poll keys for 100ms, then fold
/// background results into the state.
async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    bridge: &WingetBridge,
    tx: &mpsc::Sender<AppEvent>,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        app.console.drain();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, app, bridge, tx);
                }
            }
        }

        while let Ok(event) = rx.try_recv() {
            if let Some(view) = app.apply(event) {
                actions::load_view(app, bridge, tx, view);
            }
        }

        flush_clipboard(app);

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Route a key press. Open prompts and the details popup take keys first,
/// then global keys, then the current view.
fn handle_key(key: KeyEvent, app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }
    if app.prompt.is_some() {
        handle_prompt_key(key, app, bridge, tx);
        return;
    }
    if app.details.is_some() {
        packages::handle_details_key(key, app);
        return;
    }

    let current = app.session.view();
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => switch_view(app, bridge, tx, current.next()),
        KeyCode::BackTab => switch_view(app, bridge, tx, current.prev()),
        KeyCode::Char(c @ '1'..='4') => {
            let view = View::ALL[c as usize - '1' as usize];
            switch_view(app, bridge, tx, view);
        }
        KeyCode::Char('y') => {
            app.clipboard = Some((app.console.copy(), "Console output copied to clipboard.".to_string()));
        }
        KeyCode::Char('X') => {
            app.console.clear();
            app.console_scroll_back = 0;
        }
        KeyCode::PageUp => {
            app.console_scroll_back = (app.console_scroll_back + 5).min(app.console.len());
        }
        KeyCode::PageDown => app.console_scroll_back = app.console_scroll_back.saturating_sub(5),
        KeyCode::Char('A') => actions::request_elevation(app, bridge, tx),
        _ => match current {
            View::Advanced => advanced::handle_advanced_key(key, app, bridge, tx),
            _ => packages::handle_packages_key(key, app, bridge, tx),
        },
    }
}

/// Entering Installed, Updates or Advanced refreshes its data.
fn switch_view(app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>, view: View) {
    if app.session.view() == view {
        return;
    }
    app.session.set_view(view);
    if view != View::Search {
        actions::load_view(app, bridge, tx, view);
    }
}

/// Copy whatever is waiting for the clipboard and report the outcome.
fn flush_clipboard(app: &mut App) {
    let Some((text, status)) = app.clipboard.take() else {
        return;
    };
    match layout::copy_to_clipboard(&text) {
        Ok(()) => app.session.set_status(status),
        Err(e) => {
            log::warn!("clipboard unavailable: {}", e);
            app.session.set_status("Clipboard unavailable.");
        }
    }
}

/// Keys while a prompt is open. Enter commits, Esc cancels; the filter
/// prompt applies on every keystroke. The reset confirmation takes a
/// single key and anything but `y` declines.
fn handle_prompt_key(key: KeyEvent, app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    let Some(prompt) = app.prompt.as_mut() else {
        return;
    };
    let kind = prompt.kind;

    if kind == PromptKind::ConfirmReset {
        app.prompt = None;
        match key.code {
            KeyCode::Char(c) if confirmed(c) => actions::run_action(app, bridge, tx, Action::ResetSources),
            _ => app.session.set_status("Source reset cancelled."),
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.prompt = None;
            match kind {
                PromptKind::ExportPath => app.session.set_status("Export cancelled."),
                PromptKind::ImportPath => app.session.set_status("Import cancelled."),
                PromptKind::Search | PromptKind::Filter | PromptKind::ConfirmReset => {}
            }
            return;
        }
        KeyCode::Enter => {
            let text = prompt.input.content().to_string();
            app.prompt = None;
            match kind {
                PromptKind::Search => {
                    app.query = input::InputBox::with_content(&text);
                    actions::search(app, bridge, tx);
                }
                PromptKind::Filter | PromptKind::ConfirmReset => {}
                PromptKind::ExportPath | PromptKind::ImportPath => match picked_path(&text) {
                    Some(path) => {
                        let action = if kind == PromptKind::ExportPath {
                            Action::Export(path)
                        } else {
                            Action::Import(path)
                        };
                        actions::run_action(app, bridge, tx, action);
                    }
                    None if kind == PromptKind::ExportPath => app.session.set_status("Export cancelled."),
                    None => app.session.set_status("Import cancelled."),
                },
            }
            return;
        }
        KeyCode::Char(c) => prompt.input.insert(c),
        KeyCode::Backspace => prompt.input.delete_back(),
        KeyCode::Delete => prompt.input.delete_forward(),
        KeyCode::Left => prompt.input.move_left(),
        KeyCode::Right => prompt.input.move_right(),
        KeyCode::Home => prompt.input.move_home(),
        KeyCode::End => prompt.input.move_end(),
        _ => {}
    }

    // filter applies while typing
    if kind == PromptKind::Filter {
        let filter = prompt.input.content().to_string();
        if let Some(list) = app.current_list_mut() {
            list.spec.filter = filter;
            list.clamp_selection();
        }
    }
}

/// Header tabs, current view, console pane, status footer, then any
/// popup on top.
fn ui(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());
    let current = app.session.view();

    let tabs: Vec<(&str, bool)> = View::ALL.iter().map(|v| (v.title(), *v == current)).collect();
    let badge = match app.session.elevated() {
        Some(true) => Span::styled("● Administrator", Style::default().fg(theme::SUCCESS)),
        Some(false) => Span::styled("○ Standard user (A to elevate)", Style::default().fg(theme::WARN)),
        None => Span::styled("… checking privileges", Style::default().fg(theme::DIM)),
    };
    layout::render_header(f, &tabs, badge, chunks[0]);

    match current {
        View::Advanced => advanced::render_advanced(f, app, chunks[1]),
        _ => packages::render_packages(f, app, chunks[1]),
    }

    render_console(f, app, chunks[2]);

    let spinner = if app.session.loading() { "⟳ " } else { "" };
    let status = format!("{}{}", spinner, app.session.status());
    let hints = match current {
        View::Advanced => advanced::HINTS,
        _ => packages::HINTS,
    };
    layout::render_footer(f, &status, hints, chunks[3]);

    packages::render_details(f, app);
    packages::render_prompt(f, app);
}

/// Console pane, colored by severity and pinned to the newest line.
fn render_console(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .console
        .lines()
        .iter()
        .map(|line| {
            let color = match line.severity {
                Severity::Output => theme::BRIGHT_WHITE,
                Severity::Error => theme::ERROR,
                Severity::Success => theme::SUCCESS,
            };
            Line::styled(line.text.clone(), Style::default().fg(color))
        })
        .collect();

    // pinned to the bottom unless scrolled back
    let visible = area.height.saturating_sub(2) as usize;
    let offset = lines.len().saturating_sub(visible + app.console_scroll_back);
    let title = format!("Console ({} lines)  y copy | X clear | PgUp/PgDn scroll", lines.len());
    layout::render_scrollable_content(f, &title, lines, offset, theme::DIM, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{bridge, FakeExecutor};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn declining_source_reset_dispatches_nothing() {
        let (bridge, fake) = bridge(FakeExecutor::new());
        let (tx, _rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        app.session.set_view(View::Advanced);

        for answer in [KeyCode::Char('n'), KeyCode::Esc, KeyCode::Enter] {
            handle_key(press(KeyCode::Char('R')), &mut app, &bridge, &tx);
            assert_eq!(app.prompt.as_ref().map(|p| p.kind), Some(PromptKind::ConfirmReset));
            handle_key(press(answer), &mut app, &bridge, &tx);
            assert!(app.prompt.is_none());
            assert_eq!(app.session.status(), "Source reset cancelled.");
        }

        tokio::task::yield_now().await;
        assert!(fake.calls().is_empty());
        assert!(!app.session.loading());
    }

    #[tokio::test]
    async fn confirmed_source_reset_runs() {
        let (bridge, fake) = bridge(FakeExecutor::new());
        let (tx, mut rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        app.session.set_view(View::Advanced);

        handle_key(press(KeyCode::Char('R')), &mut app, &bridge, &tx);
        handle_key(press(KeyCode::Char('y')), &mut app, &bridge, &tx);
        assert_eq!(app.session.status(), "Resetting sources...");

        let event = rx.recv().await.expect("event");
        assert_eq!(app.apply(event), Some(View::Advanced));
        assert_eq!(fake.calls(), vec![vec!["source", "reset", "--force"]]);
        assert_eq!(app.session.status(), "Source reset completed.");
    }

    #[tokio::test]
    async fn schedule_key_queues_command_for_clipboard() {
        let (bridge, _) = bridge(FakeExecutor::new());
        let (tx, _rx) = mpsc::channel(8);
        let mut app = App::new(&Config::default());
        app.session.set_view(View::Advanced);

        handle_key(press(KeyCode::Char('S')), &mut app, &bridge, &tx);
        let (text, status) = app.clipboard.take().unwrap();
        assert!(text.starts_with("Register-ScheduledTask"));
        assert_eq!(status, "Schedule command copied to clipboard!");
    }
}
