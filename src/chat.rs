//! Chat turn orchestration
//!
//! [`ChatClient`] owns one question/answer turn: it reads the input field,
//! appends the user's message, shows the busy indicator, asks the
//! [`AnswerService`], renders exactly one assistant message and resets the
//! UI. The UI pieces are injected so the flow runs the same against the
//! terminal widgets and against plain in-memory values in tests.

use crate::events::{AnswerOutcome, Message, QueryRequest, TurnState};
use crate::service::AnswerService;
use std::sync::Arc;
use tracing::debug;

/// Prefix shown in front of every answer from the service
pub const ANSWER_PREFIX: &str = "🤖 ";

/// Shown when the service replies without an answer
pub const NO_ANSWER_NOTICE: &str = "Sorry, no relevant information found. Please try again. 😔";

/// Shown for every transport failure
pub const ERROR_NOTICE: &str = "An error occurred, please try again later. ⚠️";

/// Text field the user types the question into
pub trait InputField {
    fn value(&self) -> String;
    fn clear(&mut self);
}

/// Append-only destination for chat bubbles
pub trait TranscriptSink {
    fn append(&mut self, message: Message);
}

/// Spinner or any other "request in flight" signal
pub trait BusyIndicator {
    fn set_visible(&mut self, visible: bool);
}

impl InputField for String {
    fn value(&self) -> String {
        self.clone()
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

impl TranscriptSink for Vec<Message> {
    fn append(&mut self, message: Message) {
        self.push(message);
    }
}

impl BusyIndicator for bool {
    fn set_visible(&mut self, visible: bool) {
        *self = visible;
    }
}

/// Render the assistant bubble for a settled turn
pub fn render_outcome(outcome: &AnswerOutcome) -> Message {
    match outcome {
        AnswerOutcome::Success(answer) => Message::assistant(format!("{ANSWER_PREFIX}{answer}")),
        AnswerOutcome::Empty => Message::assistant(NO_ANSWER_NOTICE),
        AnswerOutcome::Failure => Message::assistant(ERROR_NOTICE),
    }
}

pub struct ChatClient<I, T, B> {
    service: Arc<dyn AnswerService>,
    input: I,
    transcript: T,
    busy: B,
    state: TurnState,
}

impl<I, T, B> ChatClient<I, T, B>
where
    I: InputField,
    T: TranscriptSink,
    B: BusyIndicator,
{
    pub fn new(service: Arc<dyn AnswerService>, input: I, transcript: T, busy: B) -> Self {
        Self {
            service,
            input,
            transcript,
            busy,
            state: TurnState::Idle,
        }
    }

    /// Run one full turn. Returns `false` when the submission was ignored
    /// (blank input, or a turn is already in flight).
    pub async fn submit(&mut self) -> bool {
        let Some(request) = self.begin_turn() else {
            return false;
        };

        let outcome = self.service.answer(&request).await;
        self.finish_turn(outcome);
        true
    }

    /// First half of a turn: validate the input, echo it and go busy.
    ///
    /// Callers that drive the request themselves must hand the outcome
    /// back through [`ChatClient::finish_turn`].
    pub fn begin_turn(&mut self) -> Option<QueryRequest> {
        if self.state == TurnState::AwaitingResponse {
            debug!("Ignoring submit while a response is pending");
            return None;
        }

        let raw = self.input.value();
        let query = raw.trim();
        if query.is_empty() {
            return None;
        }

        self.transcript.append(Message::user(query));
        self.busy.set_visible(true);
        self.state = TurnState::AwaitingResponse;

        Some(QueryRequest::new(query))
    }

    /// Second half of a turn. Runs on every path, success or not.
    pub fn finish_turn(&mut self, outcome: AnswerOutcome) {
        if self.state != TurnState::AwaitingResponse {
            debug!(?outcome, "Dropping outcome with no turn in flight");
            return;
        }

        self.transcript.append(render_outcome(&outcome));
        self.busy.set_visible(false);
        self.input.clear();
        self.state = TurnState::Idle;
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == TurnState::AwaitingResponse
    }

    pub fn service(&self) -> Arc<dyn AnswerService> {
        Arc::clone(&self.service)
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn transcript(&self) -> &T {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut T {
        &mut self.transcript
    }

    pub fn busy(&self) -> &B {
        &self.busy
    }

    pub fn busy_mut(&mut self) -> &mut B {
        &mut self.busy
    }
}
