//! Transcript display component

use crate::chat::TranscriptSink;
use crate::events::{Message, Sender};
use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

/// One row of the history view
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    /// A chat bubble with the local time it arrived
    Message {
        message: Message,
        received_at: DateTime<Local>,
    },
    /// Client-side notice (help text, endpoint info). Not part of the chat.
    Notice(String),
}

/// Scrollable, append-only chat transcript. Entries are never dropped;
/// only the rendered viewport is bounded by the widget height.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    entries: Vec<HistoryEntry>,
    /// Lines scrolled up from the bottom
    scroll_offset: usize,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    /// Add a client-side notice
    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.push(HistoryEntry::Notice(text.into()));
    }

    /// Chat messages in display order, notices excluded
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| match entry {
            HistoryEntry::Message { message, .. } => Some(message),
            HistoryEntry::Notice(_) => None,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Render a single entry into lines
    fn render_entry(entry: &HistoryEntry, width: u16) -> Vec<Line<'static>> {
        match entry {
            HistoryEntry::Message { message, received_at } => {
                Self::render_message(message, received_at, width)
            }
            HistoryEntry::Notice(text) => text
                .lines()
                .map(|line| {
                    Line::from(vec![Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Yellow),
                    )])
                })
                .collect(),
        }
    }

    fn render_message(message: &Message, received_at: &DateTime<Local>, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.sender {
            Sender::User => "👤",
            Sender::Assistant => "🩺",
        };

        let header = format!(
            "{} {} {} {}",
            role_icon,
            message.sender.display_name(),
            received_at.format("%H:%M:%S"),
            "─".repeat(20)
        );
        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        for content_line in wrap_text(&message.text, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(message.sender)),
            ]));
        }

        lines
    }
}

impl TranscriptSink for ChatHistory {
    fn append(&mut self, message: Message) {
        self.push(HistoryEntry::Message {
            message,
            received_at: Local::now(),
        });
    }
}

impl Widget for &ChatHistory {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 MedGenie");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.entries.is_empty() {
            let welcome_lines = [
                Line::from(vec![Span::styled("Welcome to MedGenie! 🩺", Style::default().fg(Color::Green))]),
                Line::from(""),
                Line::from(vec![Span::styled("Ask a medical question below.", Style::default().fg(Color::Gray))]),
                Line::from(""),
                Line::from(vec![Span::styled("Press Enter to send, /help for commands.", Style::default().fg(Color::DarkGray))]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for entry in &self.entries {
            all_lines.extend(ChatHistory::render_entry(entry, inner_area.width));
            all_lines.push(Line::from(""));
        }

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let start = max_offset - offset;
        let end = (start + height).min(total);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if max_offset > 0 {
            let mut scroll_state = ScrollbarState::new(max_offset).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut scroll_state);
        }
    }
}

fn content_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Blue),
        Sender::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + word_width + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_order_and_skips_notices() {
        let mut history = ChatHistory::new();
        history.append(Message::user("q"));
        history.push_notice("help");
        history.append(Message::assistant("a"));

        let messages: Vec<_> = history.messages().cloned().collect();
        assert_eq!(messages, vec![Message::user("q"), Message::assistant("a")]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn messages_survive_any_number_of_appends() {
        let mut history = ChatHistory::new();
        for i in 0..1_000 {
            history.append(Message::user(format!("question {i}")));
            history.push_notice(format!("notice {i}"));
        }

        assert_eq!(history.len(), 2_000);
        let texts: Vec<_> = history.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts.len(), 1_000);
        assert_eq!(texts[0], "question 0");
        assert_eq!(texts[999], "question 999");
    }

    #[test]
    fn long_transcript_renders_only_the_latest_lines() {
        let mut history = ChatHistory::new();
        for i in 0..200 {
            history.append(Message::user(format!("question {i}")));
        }

        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let rendered: String = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(rendered.contains("question 199"));
        assert!(!rendered.contains("question 0 "));
        assert_eq!(history.messages().count(), 200);
    }

    #[test]
    fn new_entries_scroll_back_to_bottom() {
        let mut history = ChatHistory::new();
        history.scroll_up(5);
        assert_eq!(history.scroll_offset(), 5);
        history.append(Message::user("hi"));
        assert_eq!(history.scroll_offset(), 0);
        history.scroll_down(3);
        assert_eq!(history.scroll_offset(), 0);
    }

    #[test]
    fn wrap_text_breaks_on_width_and_newlines() {
        assert_eq!(wrap_text("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
        assert_eq!(wrap_text("", 5), vec![String::new()]);
    }

    #[test]
    fn renders_messages_into_buffer() {
        let mut history = ChatHistory::new();
        history.append(Message::user("What is diabetes?"));

        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let rendered: String = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(rendered.contains("What is diabetes?"));
    }
}
