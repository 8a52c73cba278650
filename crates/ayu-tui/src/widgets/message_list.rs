//! Chat transcript widget

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One rendered chat bubble
#[derive(Debug, Clone)]
pub struct ChatBubble {
    /// True for the patient's messages (right-aligned)
    pub from_user: bool,
    /// Bubble text
    pub content: String,
    /// Render as the consultation fee card
    pub payment: bool,
    /// Error styling
    pub is_error: bool,
    /// Short time label under the bubble
    pub time: String,
}

impl ChatBubble {
    pub fn user(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            from_user: true,
            content: content.into(),
            payment: false,
            is_error: false,
            time: time.into(),
        }
    }

    pub fn assistant(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            from_user: false,
            content: content.into(),
            payment: false,
            is_error: false,
            time: time.into(),
        }
    }

    pub fn error(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(content, time)
        }
    }

    pub fn payment(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            payment: true,
            ..Self::assistant(content, time)
        }
    }
}

/// Widget rendering the transcript as left/right-aligned bubbles
pub struct MessageList<'a> {
    bubbles: &'a [ChatBubble],
    theme: &'a Theme,
    /// Lines scrolled up from the bottom
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(bubbles: &'a [ChatBubble], theme: &'a Theme) -> Self {
        Self {
            bubbles,
            theme,
            scroll: 0,
        }
    }

    /// Scroll up by this many lines from the bottom
    pub fn scrolled_up(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Total rendered lines at the given width, for scroll clamping
    pub fn line_count(bubbles: &[ChatBubble], width: u16) -> usize {
        bubbles
            .iter()
            .map(|b| bubble_line_count(b, width))
            .sum::<usize>()
    }

    fn build_lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for bubble in self.bubbles {
            lines.extend(render_bubble(bubble, self.theme, width));
        }
        lines
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.build_lines(area.width);
        let total = lines.len();
        let visible = area.height as usize;

        // Follow the tail: when the transcript is taller than the area, skip
        // everything above the window, then apply the user's upward scroll.
        let bottom_offset = total.saturating_sub(visible);
        let offset = bottom_offset.saturating_sub(self.scroll);

        Paragraph::new(lines)
            .scroll((offset as u16, 0))
            .render(area, buf);
    }
}

fn wrap_width(width: u16) -> usize {
    // Bubbles take at most ~3/4 of the pane, with a sane floor
    ((width as usize * 3) / 4).max(20)
}

fn bubble_line_count(bubble: &ChatBubble, width: u16) -> usize {
    render_bubble(bubble, &Theme::default(), width).len()
}

fn render_bubble(bubble: &ChatBubble, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    if bubble.payment {
        return render_fee_card(bubble, theme);
    }

    let mut lines = Vec::new();
    let alignment = if bubble.from_user {
        Alignment::Right
    } else {
        Alignment::Left
    };

    let header = if bubble.from_user {
        Span::styled("You".to_string(), theme.user_bold())
    } else if bubble.is_error {
        Span::styled("Ayu ⚠".to_string(), theme.error_style().add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Ayu".to_string(), theme.accent_bold())
    };
    lines.push(Line::from(header).alignment(alignment));

    let body_style = if bubble.is_error {
        theme.error_style()
    } else if bubble.from_user {
        theme.user_style()
    } else {
        theme.base_style()
    };
    for wrapped in textwrap::wrap(&bubble.content, wrap_width(width)) {
        lines.push(Line::from(Span::styled(wrapped.into_owned(), body_style)).alignment(alignment));
    }

    if !bubble.time.is_empty() {
        lines.push(Line::from(Span::styled(bubble.time.clone(), theme.dim_style())).alignment(alignment));
    }
    lines.push(Line::default());
    lines
}

/// The inline consultation fee card shown for payment prompts
fn render_fee_card(bubble: &ChatBubble, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Ayu".to_string(), theme.accent_bold()))];
    for wrapped in textwrap::wrap(&bubble.content, 60) {
        lines.push(Line::from(Span::styled(
            wrapped.into_owned(),
            theme.base_style(),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("₹ Consultation Fee  ".to_string(), theme.success_bold()),
        Span::styled("₹499 ".to_string(), theme.success_bold()),
        Span::styled("(₹999)".to_string(), theme.dim_style().add_modifier(Modifier::CROSSED_OUT)),
    ]));
    lines.push(Line::from(Span::styled(
        "Secure immediate specialist review".to_string(),
        theme.dim_style(),
    )));
    lines.push(Line::from(Span::styled(
        "Press Ctrl+P to pay & continue the consultation".to_string(),
        theme.success_style(),
    )));
    if !bubble.time.is_empty() {
        lines.push(Line::from(Span::styled(bubble.time.clone(), theme.dim_style())));
    }
    lines.push(Line::default());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts_cover_header_body_time_gap() {
        let bubbles = vec![ChatBubble::assistant("short", "10:00")];
        // header + 1 body line + time + trailing gap
        assert_eq!(MessageList::line_count(&bubbles, 80), 4);
    }

    #[test]
    fn test_long_content_wraps() {
        let bubbles = vec![ChatBubble::user("word ".repeat(60), "10:01")];
        assert!(MessageList::line_count(&bubbles, 40) > 5);
    }

    #[test]
    fn test_payment_bubble_has_card_lines() {
        let plain = vec![ChatBubble::assistant("pay please", "")];
        let card = vec![ChatBubble::payment("pay please", "")];
        assert!(
            MessageList::line_count(&card, 80) > MessageList::line_count(&plain, 80),
            "fee card should add card lines"
        );
    }
}
