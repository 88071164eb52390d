use crate::chat::{ChatClient, InputField};
use crate::events::{AnswerOutcome, QueryRequest, RetrieveResponse};
use crate::service::{AnswerService, PassageRetriever};
use crate::ui::chat::{
    get_help_text, BusyIndicatorView, ChatComposer, ChatHistory, ComposerResult, ParsedCommand,
    SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Longest passage preview shown by /sources
const PASSAGE_PREVIEW_CHARS: usize = 280;

/// Actions the screen asks the event loop to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    Exit,
}

type SourcesResult = Result<RetrieveResponse, String>;

/// The chat window: transcript, busy line and input, wired to the chat client
pub struct ChatScreen {
    client: ChatClient<ChatComposer, ChatHistory, BusyIndicatorView>,
    retriever: Arc<dyn PassageRetriever>,
    endpoint: String,
    pending_answer: Option<oneshot::Receiver<AnswerOutcome>>,
    pending_sources: Option<oneshot::Receiver<SourcesResult>>,
}

impl ChatScreen {
    pub fn new<S>(service: Arc<S>, endpoint: impl Into<String>) -> Self
    where
        S: AnswerService + PassageRetriever + 'static,
    {
        let answer_service: Arc<dyn AnswerService> = service.clone();
        let retriever: Arc<dyn PassageRetriever> = service;

        Self {
            client: ChatClient::new(
                answer_service,
                ChatComposer::new("e.g. What are the early symptoms of diabetes?"),
                ChatHistory::new(),
                BusyIndicatorView::new(),
            ),
            retriever,
            endpoint: endpoint.into(),
            pending_answer: None,
            pending_sources: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        if key.kind != KeyEventKind::Press {
            return ScreenAction::None;
        }

        match key.code {
            KeyCode::PageUp => {
                self.client.transcript_mut().scroll_up(5);
                return ScreenAction::None;
            }
            KeyCode::PageDown => {
                self.client.transcript_mut().scroll_down(5);
                return ScreenAction::None;
            }
            _ => {}
        }

        match self.client.input_mut().handle_key(key) {
            ComposerResult::Submit => {
                self.submit();
                ScreenAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ScreenAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.client.input_mut().insert_str(text);
    }

    /// Start a turn and run the request on a background task
    pub fn submit(&mut self) {
        let Some(request) = self.client.begin_turn() else {
            return;
        };
        self.client.input_mut().set_enabled(false);

        let service = self.client.service();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = service.answer(&request).await;
            let _ = tx.send(outcome);
        });
        self.pending_answer = Some(rx);
    }

    /// Settle finished requests (called from the main loop)
    pub fn poll_pending(&mut self) {
        if let Some(rx) = self.pending_answer.as_mut() {
            let outcome = match rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    warn!("Answer task ended without a result");
                    Some(AnswerOutcome::Failure)
                }
            };

            if let Some(outcome) = outcome {
                self.pending_answer = None;
                self.client.finish_turn(outcome);
                self.client.input_mut().set_enabled(true);
            }
        }

        if let Some(rx) = self.pending_sources.as_mut() {
            let result = match rx.try_recv() {
                Ok(result) => Some(result),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    Some(Err("retrieval task ended without a result".to_string()))
                }
            };

            if let Some(result) = result {
                self.pending_sources = None;
                let notice = format_sources(result);
                self.client.transcript_mut().push_notice(notice);
            }
        }
    }

    /// Whether any request is still running
    pub fn has_pending(&self) -> bool {
        self.pending_answer.is_some() || self.pending_sources.is_some()
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.client.is_awaiting()
    }

    pub fn history(&self) -> &ChatHistory {
        self.client.transcript()
    }

    pub fn composer(&self) -> &ChatComposer {
        self.client.input()
    }

    pub fn busy(&self) -> &BusyIndicatorView {
        self.client.busy()
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> ScreenAction {
        if self.is_awaiting_answer() && !command.command.available_while_waiting() {
            let notice = format!("/{} is unavailable while waiting for an answer.", command.command.command());
            self.client.transcript_mut().push_notice(notice);
            return ScreenAction::None;
        }

        match command.command {
            SlashCommand::Quit => ScreenAction::Exit,
            SlashCommand::Help => {
                self.client.transcript_mut().push_notice(get_help_text());
                ScreenAction::None
            }
            SlashCommand::Endpoint => {
                let notice = format!("Answer service: {}", self.endpoint);
                self.client.transcript_mut().push_notice(notice);
                ScreenAction::None
            }
            SlashCommand::Sources => {
                self.request_sources(command.argument());
                ScreenAction::None
            }
        }
    }

    fn request_sources(&mut self, query: Option<&str>) {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            self.client
                .transcript_mut()
                .push_notice("Usage: /sources <question>");
            return;
        };

        if self.pending_sources.is_some() {
            self.client
                .transcript_mut()
                .push_notice("Still retrieving sources for the previous question.");
            return;
        }

        info!(%query, "Retrieving sources");
        self.client
            .transcript_mut()
            .push_notice(format!("Retrieving sources for \"{query}\"..."));

        let retriever = Arc::clone(&self.retriever);
        let request = QueryRequest::new(query);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = retriever.retrieve(&request).await.map_err(|e| e.to_string());
            let _ = tx.send(result);
        });
        self.pending_sources = Some(rx);
    }
}

fn format_sources(result: SourcesResult) -> String {
    match result {
        Ok(response) if response.retrieved_docs.is_empty() => {
            format!("No passages found for \"{}\".", response.query)
        }
        Ok(response) => {
            let mut text = format!("Sources for \"{}\":", response.query);
            for (i, doc) in response.retrieved_docs.iter().enumerate() {
                let preview: String = doc.chars().take(PASSAGE_PREVIEW_CHARS).collect();
                let ellipsis = if doc.chars().count() > PASSAGE_PREVIEW_CHARS { "…" } else { "" };
                text.push_str(&format!("\n[{}] {}{}", i + 1, preview.replace('\n', " "), ellipsis));
            }
            text
        }
        Err(e) => {
            warn!(error = %e, "Source retrieval failed");
            "Could not retrieve sources, please try again later. ⚠️".to_string()
        }
    }
}

impl Widget for &ChatScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // History
                Constraint::Length(1), // Busy indicator
                Constraint::Length(3), // Composer
            ])
            .split(area);

        self.client.transcript().render(chunks[0], buf);
        self.client.busy().render(chunks[1], buf);
        self.client.input().render(chunks[2], buf);
    }
}

impl ChatScreen {
    /// Text currently in the input field
    pub fn input_value(&self) -> String {
        self.client.input().value()
    }
}
