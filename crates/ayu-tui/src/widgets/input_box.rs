//! Type-aware single-line input bar

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// What the current field accepts; filters typed characters and picks the
/// hint label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    Number,
    Date,
}

impl InputMode {
    fn accepts(&self, c: char) -> bool {
        match self {
            InputMode::Text => !c.is_control(),
            InputMode::Number => c.is_ascii_digit() || c == '.',
            InputMode::Date => c.is_ascii_digit() || c == '-',
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            InputMode::Text => None,
            InputMode::Number => Some("number"),
            InputMode::Date => Some("date YYYY-MM-DD"),
        }
    }
}

/// Single-line input bar at the bottom of the conversation
#[derive(Debug, Default)]
pub struct InputBar {
    content: String,
    /// Cursor position as a character index
    cursor: usize,
    mode: InputMode,
    placeholder: String,
    enabled: bool,
}

impl InputBar {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable typing (disabled while an exchange is in flight or
    /// a selection/payment field is active)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Take the trimmed content out of the bar, clearing it
    pub fn take(&mut self) -> String {
        let text = self.content.trim().to_string();
        self.clear();
        text
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    /// Handle an input action; returns true if the bar consumed it
    pub fn handle_action(&mut self, action: &Action) -> bool {
        if !self.enabled {
            return false;
        }
        let char_count = self.content.chars().count();
        match action {
            Action::Char(c) if self.mode.accepts(*c) => {
                let at = self.byte_offset(self.cursor);
                self.content.insert(at, *c);
                self.cursor += 1;
                true
            }
            Action::Backspace if self.cursor > 0 => {
                let start = self.byte_offset(self.cursor - 1);
                let end = self.byte_offset(self.cursor);
                self.content.drain(start..end);
                self.cursor -= 1;
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < char_count => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = char_count;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    let c = if c == '\n' || c == '\r' { ' ' } else { c };
                    if self.mode.accepts(c) {
                        let at = self.byte_offset(self.cursor);
                        self.content.insert(at, c);
                        self.cursor += 1;
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Render the bar with its border and hint
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let mut block = Block::default().borders(Borders::ALL).border_style(
            if self.enabled {
                theme.accent_style()
            } else {
                theme.border_style()
            },
        );
        if let Some(hint) = self.mode.hint() {
            block = block.title(format!(" {} ", hint));
        }
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.content.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.placeholder.clone(),
                theme.dim_style(),
            )))
            .render(inner, buf);
        } else {
            // Keep the cursor in view: show the window of content that ends
            // at the cursor when the line is wider than the bar.
            let visible_width = inner.width as usize;
            let widths: Vec<usize> = self
                .content
                .chars()
                .map(|c| c.width().unwrap_or(0))
                .collect();
            let mut start = self.cursor;
            let mut cursor_x = 0usize;
            while start > 0 && cursor_x + widths[start - 1] < visible_width {
                start -= 1;
                cursor_x += widths[start];
            }
            let visible: String = self.content.chars().skip(start).collect();
            Paragraph::new(Line::from(Span::styled(visible, theme.base_style())))
                .render(inner, buf);

            if self.enabled {
                let x = inner.x + cursor_x as u16;
                if x < inner.x + inner.width {
                    if let Some(cell) = buf.cell_mut((x, inner.y)) {
                        cell.set_style(Style::default().bg(theme.accent));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(bar: &mut InputBar, text: &str) {
        for c in text.chars() {
            bar.handle_action(&Action::Char(c));
        }
    }

    #[test]
    fn test_typing_and_take() {
        let mut bar = InputBar::new();
        typed(&mut bar, "  Asha ");
        assert_eq!(bar.take(), "Asha");
        assert_eq!(bar.content(), "");
    }

    #[test]
    fn test_number_mode_filters_letters() {
        let mut bar = InputBar::new();
        bar.set_mode(InputMode::Number);
        typed(&mut bar, "3a4.5x");
        assert_eq!(bar.content(), "34.5");
    }

    #[test]
    fn test_date_mode_accepts_dashes() {
        let mut bar = InputBar::new();
        bar.set_mode(InputMode::Date);
        typed(&mut bar, "1990-04-12!");
        assert_eq!(bar.content(), "1990-04-12");
    }

    #[test]
    fn test_disabled_bar_consumes_nothing() {
        let mut bar = InputBar::new();
        bar.set_enabled(false);
        assert!(!bar.handle_action(&Action::Char('a')));
        assert_eq!(bar.content(), "");
    }

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut bar = InputBar::new();
        typed(&mut bar, "नमस्ते");
        bar.handle_action(&Action::Backspace);
        bar.handle_action(&Action::Home);
        bar.handle_action(&Action::Char('>'));
        assert!(bar.content().starts_with('>'));
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut bar = InputBar::new();
        bar.handle_action(&Action::Paste("line one\nline two".into()));
        assert_eq!(bar.content(), "line one line two");
    }
}
