//! Assistant activity strip (listening / thinking / speaking)

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// A row of status pills with exactly one active entry
pub struct ActivityStrip<'a> {
    entries: Vec<(&'a str, &'a str)>,
    active: usize,
    theme: &'a Theme,
}

impl<'a> ActivityStrip<'a> {
    /// Create a strip from (icon, label) pairs and the active index
    pub fn new(entries: Vec<(&'a str, &'a str)>, active: usize, theme: &'a Theme) -> Self {
        Self {
            entries,
            active,
            theme,
        }
    }

    /// The conventional three-phase strip
    pub fn phases(active: usize, theme: &'a Theme) -> Self {
        Self::new(
            vec![("🎙", "Listening"), ("🧠", "Thinking"), ("🔊", "Speaking")],
            active,
            theme,
        )
    }
}

impl Widget for ActivityStrip<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (i, (icon, label)) in self.entries.iter().enumerate() {
            let style = if i == self.active {
                self.theme.accent_bold()
            } else {
                self.theme.dim_style()
            };
            spans.push(Span::styled(format!("{} {}", icon, label), style));
            if i + 1 < self.entries.len() {
                spans.push(Span::raw("   "));
            }
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
