use crate::chat::BusyIndicator;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::Instant;

/// "MedGenie is thinking..." line shown while a request is in flight
#[derive(Debug, Clone)]
pub struct BusyIndicatorView {
    visible: bool,
    started_at: Option<Instant>,
}

impl BusyIndicatorView {
    pub fn new() -> Self {
        Self {
            visible: false,
            started_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Seconds since the indicator was shown
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    fn dots(&self) -> &'static str {
        let millis = self.started_at.map(|t| t.elapsed().as_millis()).unwrap_or(0);
        match (millis / 300) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Default for BusyIndicatorView {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyIndicator for BusyIndicatorView {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.started_at = visible.then(Instant::now);
    }
}

impl Widget for &BusyIndicatorView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible || area.height == 0 {
            return;
        }

        let indicator = Line::from(vec![
            Span::styled("🩺 ", Style::default().fg(Color::Green)),
            Span::styled("MedGenie is thinking", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" {}s", self.elapsed_secs()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_visibility() {
        let mut busy = BusyIndicatorView::new();
        assert!(!busy.is_visible());

        busy.set_visible(true);
        assert!(busy.is_visible());
        assert_eq!(busy.elapsed_secs(), 0);

        busy.set_visible(false);
        assert!(!busy.is_visible());
    }

    #[test]
    fn hidden_indicator_draws_nothing() {
        let busy = BusyIndicatorView::new();
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        (&busy).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
