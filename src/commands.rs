use anyhow::{Context, Result};
use crate::chat::{BusyIndicator, ChatClient, TranscriptSink};
use crate::config::Config;
use crate::events::{Message, QueryRequest, Sender};
use crate::service::{HttpAnswerService, PassageRetriever};
use std::io::{self, Write};
use std::sync::Arc;

/// Prints every transcript message as it is appended
pub struct ConsoleTranscript<W: Write> {
    out: W,
    messages: Vec<Message>,
}

impl<W: Write> ConsoleTranscript<W> {
    pub fn new(out: W) -> Self {
        Self { out, messages: Vec::new() }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TranscriptSink for ConsoleTranscript<W> {
    fn append(&mut self, message: Message) {
        let icon = match message.sender {
            Sender::User => "👤",
            Sender::Assistant => "🩺",
        };
        // A closed stdout must not turn into a failed turn
        let _ = writeln!(self.out, "{} {}: {}", icon, message.sender.display_name(), message.text);
        self.messages.push(message);
    }
}

/// "Thinking..." line on stderr while the request runs
pub struct ConsoleBusy;

impl BusyIndicator for ConsoleBusy {
    fn set_visible(&mut self, visible: bool) {
        if visible {
            eprintln!("⏳ Thinking...");
        }
    }
}

/// `medgenie ask`: one question, one answer, printed to stdout
pub async fn ask(config: &Config, query: &str) -> Result<()> {
    let service = HttpAnswerService::new(config).context("Failed to create HTTP client")?;

    let mut chat = ChatClient::new(
        Arc::new(service),
        query.to_string(),
        ConsoleTranscript::new(io::stdout()),
        ConsoleBusy,
    );

    if !chat.submit().await {
        eprintln!("❌ Nothing to ask: the question is empty.");
    }

    Ok(())
}

/// `medgenie retrieve`: list the passages the service would answer from
pub async fn retrieve(config: &Config, query: &str, top_k: u32) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        eprintln!("❌ Nothing to retrieve: the question is empty.");
        return Ok(());
    }

    let service = HttpAnswerService::new(config).context("Failed to create HTTP client")?;
    let request = QueryRequest {
        query: query.to_string(),
        top_k,
    };

    let response = service
        .retrieve(&request)
        .await
        .with_context(|| format!("Failed to retrieve passages from {}", service.base_url()))?;

    if response.retrieved_docs.is_empty() {
        println!("📭 No passages found for \"{}\".", query);
        return Ok(());
    }

    println!("📚 Passages for \"{}\":", query);
    println!("{}", "=".repeat(50));
    for (i, doc) in response.retrieved_docs.iter().enumerate() {
        println!("[{}] {}", i + 1, doc.trim());
        println!();
    }

    Ok(())
}

/// `medgenie config`: print the resolved configuration, optionally saving it
pub fn show_config(config: &Config, write: bool) -> Result<()> {
    println!("⚙️  MedGenie configuration");
    println!("{}", "=".repeat(50));
    println!("   🌐 Answer service: {}", config.base_url());
    println!("   🏠 Host: {}", config.host.as_deref().unwrap_or("(not set)"));
    println!("   ⏱️  Request timeout: {}s", config.request_timeout_secs);
    println!("   📄 Config file: {}", config.config_path.display());
    println!("   📝 Log file: {}", config.log_path().display());

    if write {
        config.save()?;
        println!();
        println!("✨ Saved to {}", config.config_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_transcript_prints_each_message() {
        let mut transcript = ConsoleTranscript::new(Vec::new());
        transcript.append(Message::user("What is diabetes?"));
        transcript.append(Message::assistant("🤖 A metabolic disorder."));

        assert_eq!(transcript.messages().len(), 2);
        let out = String::from_utf8(transcript.into_inner()).unwrap();
        assert_eq!(
            out,
            "👤 You: What is diabetes?\n🩺 MedGenie: 🤖 A metabolic disorder.\n"
        );
    }
}
