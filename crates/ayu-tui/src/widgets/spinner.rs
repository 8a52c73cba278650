//! Thinking indicator shown while an exchange is in flight

use crate::theme::Theme;
use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};
use std::time::{Duration, Instant};

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Animated "assistant is thinking" line
pub struct ThinkingIndicator<'a> {
    label: &'a str,
    theme: &'a Theme,
    start: Instant,
}

impl<'a> ThinkingIndicator<'a> {
    pub fn new(label: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            theme,
            start: Instant::now(),
        }
    }

    /// Use a fixed start time so the animation is continuous across redraws
    pub fn with_start(mut self, start: Instant) -> Self {
        self.start = start;
        self
    }

    fn frame(&self) -> &'static str {
        let elapsed = self.start.elapsed().as_millis();
        let idx = (elapsed / FRAME_DURATION.as_millis()) as usize;
        FRAMES[idx % FRAMES.len()]
    }
}

impl Widget for ThinkingIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 {
            return;
        }
        let text = format!("{} {}", self.frame(), self.label);
        let span = Span::styled(&text, self.theme.accent_style());
        buf.set_span(area.x, area.y, &span, area.width);
    }
}
