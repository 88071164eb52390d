use crate::config::Config;
use crate::service::HttpAnswerService;
use crate::ui::chat::{ChatScreen, ScreenAction};
use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How long to wait for terminal input before redrawing
const TICK: Duration = Duration::from_millis(100);

/// Puts the terminal back on drop, so errors and panics leave a usable shell
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard { restore: restore_terminal };
        execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)
            .context("Failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        error!(error = ?e, "Failed to disable raw mode");
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste, Show) {
        error!(error = ?e, "Failed to leave alternate screen");
    }
}

/// Run the full-screen chat UI until the user quits
pub async fn run(config: Config) -> Result<()> {
    let service = HttpAnswerService::new(&config).context("Failed to create HTTP client")?;
    let endpoint = service.base_url().to_string();
    info!(%endpoint, "Starting MedGenie chat");

    let mut screen = ChatScreen::new(Arc::new(service), endpoint);

    let guard = TerminalGuard::enter()?;
    let res = match Terminal::new(CrosstermBackend::new(io::stdout())) {
        Ok(mut terminal) => run_loop(&mut terminal, &mut screen).await,
        Err(e) => Err(e.into()),
    };
    drop(guard);

    if let Err(ref e) = res {
        error!(error = ?e, "Chat UI exited with an error");
    }
    res
}

async fn run_loop<B: Backend>(terminal: &mut Terminal<B>, screen: &mut ChatScreen) -> Result<()> {
    loop {
        screen.poll_pending();

        terminal.draw(|f| f.render_widget(&*screen, f.size()))?;

        if !event::poll(TICK)? {
            // Let spawned requests make progress on this worker too
            tokio::task::yield_now().await;
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
                let esc = key.code == KeyCode::Esc && !screen.composer().is_palette_open();
                if ctrl_c || esc {
                    return Ok(());
                }

                if screen.handle_key(key) == ScreenAction::Exit {
                    return Ok(());
                }
            }
            Event::Paste(text) => screen.handle_paste(&text),
            _ => {}
        }
    }
}
