use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Single-line text input, cursor counted in chars
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBox {
    content: String,
    cursor: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            cursor: content.chars().count(),
        }
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte(&self.content, self.cursor);
        self.content.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let start = char_to_byte(&self.content, self.cursor);
            let end = char_to_byte(&self.content, self.cursor + 1);
            self.content.drain(start..end);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.content.chars().count() {
            let start = char_to_byte(&self.content, self.cursor);
            let end = char_to_byte(&self.content, self.cursor + 1);
            self.content.drain(start..end);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }
}

fn char_to_byte(s: &str, char_pos: usize) -> usize {
    s.char_indices().nth(char_pos).map(|(i, _)| i).unwrap_or(s.len())
}

pub fn render_input_box(f: &mut Frame, input: &InputBox, label: &str, focused: bool, area: Rect) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let chars: Vec<char> = input.content().chars().collect();
    let cursor_pos = input.cursor_pos().min(chars.len());
    let before: String = chars[..cursor_pos].iter().collect();
    let cursor_char = chars.get(cursor_pos).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let after: String = chars.iter().skip(cursor_pos + 1).collect();

    let cursor_style = if focused {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::White)
    };

    let spans = vec![
        Span::styled(
            format!("{label} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(before, Style::default().fg(Color::White)),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, Style::default().fg(Color::White)),
    ];

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text() {
        let mut input = InputBox::with_content("7-Zíp");
        input.delete_back();
        input.move_left();
        input.insert('x');
        assert_eq!(input.content(), "7-Zxí");
        input.move_home();
        input.delete_forward();
        assert_eq!(input.content(), "-Zxí");
        input.move_end();
        assert_eq!(input.cursor_pos(), 4);
    }
}
