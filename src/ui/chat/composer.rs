use crate::chat::InputField;
use crate::ui::chat::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// What a key press in the composer asks the screen to do
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Enter on plain text; the chat client reads the field itself
    Submit,
    /// Enter on a slash command. The field is already cleared.
    Command(ParsedCommand),
    None,
}

/// Single-line question input with a slash-command palette
#[derive(Debug, Clone)]
pub struct ChatComposer {
    content: String,
    /// Cursor position in chars, not bytes
    cursor: usize,
    placeholder: String,
    enabled: bool,
    /// Slash command typed while the field is locked
    command_draft: String,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ChatComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            enabled: true,
            command_draft: String::new(),
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }
        if !self.enabled {
            return self.handle_locked_key(key);
        }

        match key.code {
            KeyCode::Enter => {
                if let Some(command) = parse_slash_command(self.content.trim()) {
                    InputField::clear(self);
                    return ComposerResult::Command(command);
                }

                if self.show_command_palette && self.apply_selected_command() {
                    return ComposerResult::None;
                }

                return ComposerResult::Submit;
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputField::clear(self);
            }
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.sync_command_palette();
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor < self.char_len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.char_len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// While locked the question stays put and only a slash command can be typed
    fn handle_locked_key(&mut self, key: KeyEvent) -> ComposerResult {
        match key.code {
            KeyCode::Enter => {
                let draft = std::mem::take(&mut self.command_draft);
                if let Some(command) = parse_slash_command(draft.trim()) {
                    return ComposerResult::Command(command);
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.command_draft.clear();
            }
            KeyCode::Char(c) if c == '/' || !self.command_draft.is_empty() => {
                self.command_draft.push(c);
            }
            KeyCode::Backspace => {
                self.command_draft.pop();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor; newlines become spaces
    pub fn insert_str(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
        self.sync_command_palette();
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Open, refresh or close the palette to match the current content
    fn sync_command_palette(&mut self) {
        let is_command_word = self.content.starts_with('/') && !self.content.contains(char::is_whitespace);
        if !is_command_word {
            self.close_command_palette();
            return;
        }

        if !self.show_command_palette {
            self.show_command_palette = true;
            self.selected_command = Some(0);
        }
        self.refresh_command_palette();
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        self.selected_command = Some(next as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.content = if entry.command.takes_argument() {
            format!("/{} ", entry.keyword)
        } else {
            format!("/{}", entry.keyword)
        };
        self.cursor = self.char_len();
        self.close_command_palette();
        true
    }

    /// Lock the field while a turn is in flight
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.command_draft.clear();
        if !enabled {
            self.close_command_palette();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl InputField for ChatComposer {
    fn value(&self) -> String {
        self.content.clone()
    }

    fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.close_command_palette();
    }
}

impl Widget for &ChatComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.enabled {
            "❓ Ask a question"
        } else {
            "⏳ Waiting for the answer"
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(if self.enabled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if !self.enabled && !self.command_draft.is_empty() {
            let line = Line::from(vec![
                Span::styled(self.command_draft.as_str(), Style::default().fg(Color::Yellow)),
                Span::raw("▌"),
            ]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        } else if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.enabled {
                content.insert(self.byte_index(self.cursor), '▌');
            }

            // Keep the cursor in view on long questions
            let width = inner_area.width as usize;
            let skip = if width > 0 { (self.cursor + 1).saturating_sub(width) } else { 0 };
            let visible: String = content.chars().skip(skip).collect();
            let line = Line::from(vec![Span::raw(visible)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if self.show_command_palette && !self.filtered_commands.is_empty() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::chat::commands::SlashCommand;

    fn press(composer: &mut ChatComposer, code: KeyCode) -> ComposerResult {
        composer.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(composer: &mut ChatComposer, text: &str) {
        for c in text.chars() {
            press(composer, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_without_clearing() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "What is diabetes?");

        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::Submit);
        assert_eq!(composer.value(), "What is diabetes?");
    }

    #[test]
    fn editing_handles_multibyte_chars() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "héllo");
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Backspace);
        assert_eq!(composer.value(), "hélo");

        press(&mut composer, KeyCode::Home);
        press(&mut composer, KeyCode::Delete);
        assert_eq!(composer.value(), "élo");
        assert_eq!(composer.cursor(), 0);
    }

    #[test]
    fn slash_command_is_parsed_and_cleared() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "/sources insulin");
        assert!(!composer.is_palette_open());

        match press(&mut composer, KeyCode::Enter) {
            ComposerResult::Command(command) => {
                assert_eq!(command.command, SlashCommand::Sources);
                assert_eq!(command.argument(), Some("insulin"));
            }
            other => panic!("expected command, got {other:?}"),
        }
        assert!(composer.value().is_empty());
    }

    #[test]
    fn palette_filters_and_completes() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "/he");
        assert!(composer.is_palette_open());

        press(&mut composer, KeyCode::Tab);
        assert_eq!(composer.value(), "/help");
        assert!(!composer.is_palette_open());
    }

    #[test]
    fn disabled_composer_ignores_keys() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "hi");
        composer.set_enabled(false);

        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
        type_str(&mut composer, "!");
        composer.insert_str("pasted");
        assert_eq!(composer.value(), "hi");
    }

    #[test]
    fn disabled_composer_still_takes_slash_commands() {
        let mut composer = ChatComposer::new("ask");
        type_str(&mut composer, "hi");
        composer.set_enabled(false);

        type_str(&mut composer, "/quiz");
        press(&mut composer, KeyCode::Backspace);
        type_str(&mut composer, "t");
        match press(&mut composer, KeyCode::Enter) {
            ComposerResult::Command(command) => assert_eq!(command.command, SlashCommand::Quit),
            other => panic!("expected command, got {other:?}"),
        }
        assert_eq!(composer.value(), "hi");

        type_str(&mut composer, "/nope");
        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
        assert_eq!(composer.value(), "hi");
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut composer = ChatComposer::new("ask");
        composer.insert_str("line one\nline two");
        assert_eq!(composer.value(), "line one line two");
    }
}
