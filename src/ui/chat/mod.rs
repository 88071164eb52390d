//! Chat window components

pub mod busy;
pub mod commands;
pub mod composer;
pub mod history;
pub mod screen;

pub use busy::BusyIndicatorView;
pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::{ChatComposer, ComposerResult};
pub use history::ChatHistory;
pub use screen::{ChatScreen, ScreenAction};
