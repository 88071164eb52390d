use serde::{Deserialize, Serialize};

/// Number of passages the answer service should ground an answer on.
pub const DEFAULT_TOP_K: u32 = 5;

/// Who a transcript message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "MedGenie",
        }
    }
}

/// A single chat bubble. Never mutated once it reaches the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::User }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::Assistant }
    }
}

/// Body of `POST /answer` and `POST /retrieve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), top_k: DEFAULT_TOP_K }
    }
}

/// Body returned by `POST /answer`.
///
/// Only `answer` is recognized. It is kept as raw JSON so that a
/// non-string `answer` degrades to "no answer" instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
}

impl AnswerResponse {
    /// Interpret an already-parsed JSON body. Anything that is not an
    /// object carrying a non-empty string `answer` means "no answer".
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(mut map) => Self { answer: map.remove("answer") },
            _ => Self::default(),
        }
    }

    pub fn answer_text(&self) -> Option<&str> {
        self.answer
            .as_ref()
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn into_outcome(self) -> AnswerOutcome {
        match self.answer_text() {
            Some(text) => AnswerOutcome::Success(text.to_string()),
            None => AnswerOutcome::Empty,
        }
    }
}

/// Result of one question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The service produced an answer
    Success(String),
    /// Well-formed reply without a usable answer
    Empty,
    /// Transport, status or body failure. Detail is only logged.
    Failure,
}

/// Body returned by `POST /retrieve`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub retrieved_docs: Vec<String>,
}

/// Turn lifecycle of the chat client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse,
}
