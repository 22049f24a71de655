use super::theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

/// Header(3) + Content(flex) + Console(10) + Footer(3)
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(10),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

/// Tab strip plus the elevation badge.
pub fn render_header(f: &mut Frame, tabs: &[(&str, bool)], badge: Span, area: Rect) {
    let mut spans = vec![Span::styled(
        " winget-desk ",
        Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
    )];
    for (title, active) in tabs {
        spans.push(Span::raw(" "));
        let style = if *active {
            Style::default()
                .fg(Color::Black)
                .bg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::DIM)
        };
        spans.push(Span::styled(format!(" {} ", title), style));
    }
    spans.push(Span::raw("   "));
    spans.push(badge);

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

pub fn render_footer(f: &mut Frame, status: &str, hints: &str, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {}", status), Style::default().fg(Color::Green)),
        Span::styled(format!("   {}", hints), Style::default().fg(theme::DIM)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

/// Bordered text panel with a scrollbar. `scroll_offset` is clamped to the
/// content.
pub fn render_scrollable_content(
    f: &mut Frame,
    title: &str,
    lines: Vec<Line>,
    scroll_offset: usize,
    border: Color,
    area: Rect,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let padded = inner.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });

    let total_lines = lines.len();
    let visible_height = padded.height as usize;
    let actual_scroll = scroll_offset.min(total_lines.saturating_sub(visible_height));

    let visible: Vec<Line> = lines.into_iter().skip(actual_scroll).take(visible_height).collect();
    f.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), padded);

    if total_lines > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(total_lines).position(actual_scroll);
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                horizontal: 0,
                vertical: 1,
            }),
            &mut scrollbar_state,
        );
    }
}

/// Centered popup rectangle, `percent_x` by `percent_y` of `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}
