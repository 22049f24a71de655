//! Search / Installed / Updates views: one package table each

use super::actions;
use super::input::{self, InputBox};
use super::layout;
use super::state::{Action, App, AppEvent, Prompt, PromptKind, Target};
use super::theme;
use crate::bridge::WingetBridge;
use crate::session::View;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use tokio::sync::mpsc;

/// Footer key hints for the three list views
pub const HINTS: &str = "↑↓ select | Enter details | / search | f filter | s sort | i install | d uninstall | u upgrade | U upgrade all | p/P pin/unpin | r reload";

/// List view keys: selection, prompts, sort, reload and the per-package
/// actions on the selected row. Actions without a selection do nothing.
pub fn handle_packages_key(key: KeyEvent, app: &mut App, bridge: &WingetBridge, tx: &mpsc::Sender<AppEvent>) {
    let view = app.session.view();
    let selected = app.current_list().and_then(|l| l.selected_record()).map(Target::from);

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            if let Some(list) = app.current_list_mut() {
                list.select_prev();
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(list) = app.current_list_mut() {
                list.select_next();
            }
        }
        KeyCode::Char('/') if view == View::Search => {
            app.prompt = Some(Prompt {
                kind: PromptKind::Search,
                input: InputBox::with_content(app.query.content()),
            });
        }
        KeyCode::Char('/') | KeyCode::Char('f') => {
            let current = app.current_list().map(|l| l.spec.filter.clone()).unwrap_or_default();
            app.prompt = Some(Prompt {
                kind: PromptKind::Filter,
                input: InputBox::with_content(&current),
            });
        }
        KeyCode::Char('s') => {
            if let Some(list) = app.current_list_mut() {
                list.spec.sort = list.spec.sort.next();
                list.clamp_selection();
            }
        }
        KeyCode::Char('r') => actions::load_view(app, bridge, tx, view),
        KeyCode::Char('U') => actions::run_action(app, bridge, tx, Action::UpgradeAll),
        KeyCode::Enter => {
            if let Some(target) = selected {
                actions::show_details(app, bridge, tx, target);
            }
        }
        KeyCode::Char(c) => {
            let Some(target) = selected else {
                return;
            };
            let action = match c {
                'i' => Action::Install(target),
                'd' => Action::Uninstall(target),
                'u' => Action::Upgrade(target),
                'p' => Action::Pin(target),
                'P' => Action::Unpin(target),
                _ => return,
            };
            actions::run_action(app, bridge, tx, action);
        }
        _ => {}
    }
}

/// Details popup keys: scroll, or close with Esc / q / Enter.
pub fn handle_details_key(key: KeyEvent, app: &mut App) {
    let Some(pane) = app.details.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => app.details = None,
        KeyCode::Up | KeyCode::Char('k') => pane.scroll = pane.scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => pane.scroll += 1,
        _ => {}
    }
}

/// Table of the current list after filter and sort. The Search view adds
/// the query box on top; Updates adds the Available column.
pub fn render_packages(f: &mut Frame, app: &App, area: Rect) {
    let view = app.session.view();
    let Some(list) = app.list(view) else {
        return;
    };

    let mut constraints = vec![Constraint::Length(1), Constraint::Min(0)];
    if view == View::Search {
        constraints.insert(0, Constraint::Length(3));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let (stats_area, table_area) = if view == View::Search {
        let searching = matches!(&app.prompt, Some(p) if p.kind == PromptKind::Search);
        match &app.prompt {
            Some(p) if searching => input::render_input_box(f, &p.input, "Search:", true, chunks[0]),
            _ => input::render_input_box(f, &app.query, "Search:", false, chunks[0]),
        }
        (chunks[1], chunks[2])
    } else {
        (chunks[0], chunks[1])
    };

    // stats line: counts, sort key, active filter, loading marker
    let visible = list.visible();
    let mut stats = vec![Span::styled(
        format!(" {} shown / {} total", visible.len(), list.packages.len()),
        Style::default().fg(theme::DIM),
    )];
    stats.push(Span::styled(
        format!("  sort: {}", list.spec.sort.label()),
        Style::default().fg(theme::DIM),
    ));
    if !list.spec.filter.trim().is_empty() {
        stats.push(Span::styled(
            format!("  filter: {}", list.spec.filter),
            Style::default().fg(Color::Yellow),
        ));
    }
    if list.pending.is_some() {
        stats.push(Span::styled("  loading...", Style::default().fg(theme::WARN)));
    }
    f.render_widget(Paragraph::new(Line::from(stats)), stats_area);

    let with_available = view == View::Updates;
    let mut header_cells = vec!["Name", "Id", "Version"];
    if with_available {
        header_cells.push("Available");
    }
    header_cells.push("Source");
    let header = Row::new(header_cells.into_iter().map(Cell::from))
        .style(Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD));

    let rows = visible.iter().map(|record| {
        let mut cells = vec![
            Cell::from(record.name.clone()),
            Cell::from(record.id.clone()).style(Style::default().fg(theme::DIM)),
            Cell::from(record.version.clone()),
        ];
        if with_available {
            cells.push(
                Cell::from(record.available.clone().unwrap_or_default()).style(Style::default().fg(theme::WARN)),
            );
        }
        cells.push(Cell::from(record.source.clone().unwrap_or_default()));
        Row::new(cells)
    });

    let widths: Vec<Constraint> = if with_available {
        vec![
            Constraint::Percentage(32),
            Constraint::Percentage(30),
            Constraint::Percentage(13),
            Constraint::Percentage(13),
            Constraint::Percentage(12),
        ]
    } else {
        vec![
            Constraint::Percentage(38),
            Constraint::Percentage(34),
            Constraint::Percentage(16),
            Constraint::Percentage(12),
        ]
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" {} ", view.title()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .row_highlight_style(Style::default().bg(theme::SEL_BG).fg(theme::BRIGHT_WHITE))
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected((!visible.is_empty()).then_some(list.selected));
    f.render_stateful_widget(table, table_area, &mut state);
}

/// `winget show` fields for the selected package, drawn over the view.
/// Multi-line values continue indented under their key.
pub fn render_details(f: &mut Frame, app: &App) {
    let Some(pane) = &app.details else {
        return;
    };
    let area = layout::centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<Line> = match &pane.detail {
        None => vec![Line::styled("Loading...", Style::default().fg(theme::WARN))],
        Some(detail) if detail.fields.is_empty() => {
            vec![Line::styled("No details available.", Style::default().fg(theme::DIM))]
        }
        Some(detail) => detail
            .fields
            .iter()
            .flat_map(|(key, value)| {
                let mut rows = value.lines();
                let first = Line::from(vec![
                    Span::styled(format!("{}: ", key), Style::default().fg(theme::ACCENT)),
                    Span::raw(rows.next().unwrap_or("").to_string()),
                ]);
                std::iter::once(first)
                    .chain(rows.map(|r| Line::raw(format!("  {}", r))))
                    .collect::<Vec<_>>()
            })
            .collect(),
    };

    let title = format!("{} [{}]  (Esc to close)", pane.target.name, pane.target.id);
    layout::render_scrollable_content(f, &title, lines, pane.scroll, theme::ACCENT, area);
}

/// Popup for the active prompt (search, filter or a file path).
pub fn render_prompt(f: &mut Frame, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    if prompt.kind == PromptKind::Search && app.session.view() == View::Search {
        // drawn inline above the table
        return;
    }
    let area = layout::centered_rect(60, 20, f.area());
    let area = Rect {
        height: 3,
        ..area.inner(Margin {
            horizontal: 0,
            vertical: area.height.saturating_sub(3) / 2,
        })
    };
    f.render_widget(Clear, area);
    input::render_input_box(f, &prompt.input, prompt.kind.label(), true, area);
}
