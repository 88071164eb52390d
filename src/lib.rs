//! Terminal chat client for the MedGenie question-answering service.

pub mod app;
pub mod chat;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod service;
pub mod ui;

pub use chat::{ChatClient, ERROR_NOTICE, NO_ANSWER_NOTICE};
pub use config::Config;
pub use error::ServiceError;
pub use events::{AnswerOutcome, Message, QueryRequest, Sender};
pub use service::{AnswerService, HttpAnswerService, PassageRetriever};
