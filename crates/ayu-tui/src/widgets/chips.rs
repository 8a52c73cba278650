//! Option chips for selection-typed fields

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

/// A row of selectable answer chips. Left/Right (or Tab) moves the
/// highlight, Enter submits the highlighted option.
#[derive(Debug, Default)]
pub struct OptionChips {
    options: Vec<String>,
    selected: usize,
}

impl OptionChips {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            selected: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Replace the options, resetting the highlight
    pub fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.selected = 0;
    }

    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = 0;
    }

    /// The highlighted option label
    pub fn selected_label(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    /// Move the highlight right, wrapping around
    pub fn next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.options.len();
    }

    /// Move the highlight left, wrapping around
    pub fn prev(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.selected = (self.selected + self.options.len() - 1) % self.options.len();
    }

    /// Render the chips on one wrapping line
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let mut spans = Vec::new();
        for (i, option) in self.options.iter().enumerate() {
            let style = if i == self.selected {
                theme
                    .accent_bold()
                    .add_modifier(Modifier::REVERSED)
            } else {
                theme.accent_style()
            };
            spans.push(Span::styled(format!(" {} ", option), style));
            spans.push(Span::raw("  "));
        }
        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
